//! Archive file format constants.
//!
//! ```text
//! +------------------+
//! | Magic: "SciAr"   |  5 bytes
//! +------------------+
//! | Flags            |  1 byte (bit 0: body is zlib-compressed)
//! +------------------+
//! | Version          |  2 bytes (u16 LE)
//! +------------------+
//! | Body length      |  8 bytes (u64 LE)
//! +------------------+
//! | Root node ...    |
//! +------------------+
//! ```

use crate::util::{Error, Result};

/// Magic bytes at the start of an archive file.
pub const MAGIC: &[u8; 5] = b"SciAr";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Offset of the flags byte in the header.
pub const FLAGS_OFFSET: usize = 5;

/// Offset of the version in the header.
pub const VERSION_OFFSET: usize = 6;

/// Offset of the body length in the header.
pub const BODY_LEN_OFFSET: usize = 8;

/// Current format version.
pub const CURRENT_VERSION: u16 = 1;

/// Flag bit set when the body is compressed.
pub const FLAG_COMPRESSED: u8 = 0x01;

/// zlib level used for compressed archives.
pub const COMPRESSION_LEVEL: u32 = 6;

/// Node tag for groups.
pub const TAG_GROUP: u8 = 0;

/// Node tag for datasets.
pub const TAG_DATA: u8 = 1;

/// Parsed file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub compressed: bool,
    pub body_len: u64,
}

impl Header {
    /// Serialize to the fixed-size header block.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..FLAGS_OFFSET].copy_from_slice(MAGIC);
        out[FLAGS_OFFSET] = if self.compressed { FLAG_COMPRESSED } else { 0 };
        out[VERSION_OFFSET..BODY_LEN_OFFSET].copy_from_slice(&self.version.to_le_bytes());
        out[BODY_LEN_OFFSET..].copy_from_slice(&self.body_len.to_le_bytes());
        out
    }

    /// Parse and validate the header at the start of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::invalid(format!(
                "file is {} bytes, shorter than the header",
                data.len()
            )));
        }
        if &data[..FLAGS_OFFSET] != MAGIC {
            return Err(Error::invalid("bad magic"));
        }

        let flags = data[FLAGS_OFFSET];
        if flags & !FLAG_COMPRESSED != 0 {
            return Err(Error::invalid(format!("unknown header flags {:#04x}", flags)));
        }

        let version = u16::from_le_bytes([data[VERSION_OFFSET], data[VERSION_OFFSET + 1]]);
        if version == 0 || version > CURRENT_VERSION {
            return Err(Error::invalid(format!("unsupported format version {}", version)));
        }

        let mut len = [0u8; 8];
        len.copy_from_slice(&data[BODY_LEN_OFFSET..HEADER_SIZE]);
        Ok(Self {
            version,
            compressed: flags & FLAG_COMPRESSED != 0,
            body_len: u64::from_le_bytes(len),
        })
    }
}
