//! Core layer - addressing, the resource pool and the abstract traits.
//!
//! This module provides:
//! - [`path`] - path resolution and validation
//! - [`pool`] - process-wide pool of open storage resources
//! - [`Storage`] - interface of a storage engine
//! - [`Persist`] - interface of composite values stored as sub-trees

pub mod path;
pub mod pool;
mod traits;

pub use pool::{Resource, ResourceKey};
pub use traits::{NodeKind, Persist, Storage};
