//! Archive open modes.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::util::Error;

/// How an archive is opened.
///
/// Combine flags with `|`: `OpenMode::WRITE | OpenMode::COMPRESS`. Compression
/// only applies to writable archives; readers follow whatever the file says.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OpenMode {
    write: bool,
    compress: bool,
}

impl OpenMode {
    /// Read-only access to an existing archive.
    pub const READ: Self = Self { write: false, compress: false };
    /// Read-write access; the file is created if missing.
    pub const WRITE: Self = Self { write: true, compress: false };
    /// Compress the archive body when writing.
    pub const COMPRESS: Self = Self { write: false, compress: true };

    #[inline]
    pub const fn is_writable(self) -> bool {
        self.write
    }

    /// Whether writes are compressed. Always false for read-only modes.
    #[inline]
    pub const fn is_compressed(self) -> bool {
        self.write && self.compress
    }
}

impl BitOr for OpenMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            write: self.write || rhs.write,
            compress: self.compress || rhs.compress,
        }
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    /// Parse `"r"`, `"w"` or `"c"` (write compressed).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Self::READ),
            "w" => Ok(Self::WRITE),
            "c" => Ok(Self::WRITE | Self::COMPRESS),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match (self.is_writable(), self.is_compressed()) {
            (false, _) => "r",
            (true, false) => "w",
            (true, true) => "c",
        };
        f.write_str(s)
    }
}
