//! File-backed storage engine.
//!
//! - [`format`] - file header layout and constants
//! - [`codec`] - binary encoding of the tree
//! - [`compression`] - zlib helpers for compressed archives
//! - [`FileStorage`] - the [`Storage`](crate::core::Storage) implementation

pub mod format;
pub mod codec;
mod compression;
mod tree;
mod file;

pub use compression::{compress, decompress, is_compressed};
pub use file::FileStorage;
pub use tree::{Body, Dataset, Node, Tree};
