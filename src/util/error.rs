//! Error types for the archive library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archive operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed path, or a leaf key that contains a separator
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The underlying storage resource could not be opened in the requested mode
    #[error("Cannot open {}: {reason}", path.display())]
    ResourceOpen { path: PathBuf, reason: String },

    /// Nothing stored at the given path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Element type outside the native set reached the typed dispatch
    #[error("Invalid type on path: {0}")]
    UnsupportedType(String),

    /// Datatype probe on a type outside the native set
    #[error("Only native datatypes can be probed: {0}")]
    UnsupportedProbe(String),

    /// Shape, chunk or offset out of bounds
    #[error("Out of range: {0}")]
    Range(String),

    /// Scope stack misuse (exit without enter)
    #[error("Scope mismatch: {0}")]
    ScopeMismatch(String),

    /// Stored datum has a different kind than requested
    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Archive was opened without write access
    #[error("Archive is read-only: {}", .0.display())]
    ReadOnly(PathBuf),

    /// Unrecognised open mode string
    #[error("Invalid open mode: {0:?}")]
    InvalidMode(String),

    /// Stored data could not be decoded
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a range error.
    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a type mismatch error.
    pub fn mismatch(path: &str, expected: impl ToString, actual: impl ToString) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
