//! Utility types for the archive.
//!
//! This module contains fundamental types used throughout the library:
//! - [`NativeKind`] / [`Element`] - The closed set of natively stored types
//! - [`Dimensions`] / [`Hyperslab`] - Array shapes and sub-regions
//! - [`Error`] / [`Result`] - Error handling

mod native;
mod error;
mod dimensions;
mod hyperslab;

pub use native::*;
pub use error::*;
pub use dimensions::*;
pub use hyperslab::*;
