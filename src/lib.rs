//! # sciarchive
//!
//! Hierarchical, path-addressed storage for scientific data.
//!
//! Many independent handles in one process can point at the same archive
//! file. Handles opened on the same file and mode share one pooled resource,
//! which is closed when the last handle goes away.
//!
//! ## Modules
//!
//! - [`util`] - Native element kinds, shapes, hyperslabs, errors
//! - [`core`] - Path model, resource pool, storage and persistence traits
//! - [`store`] - File-backed storage engine
//! - [`archive`] - Archive handles and typed I/O
//! - [`serializer`] - Scoped serializers and deserializers
//!
//! ## Example
//!
//! ```ignore
//! use sciarchive::prelude::*;
//!
//! {
//!     let ar = Archive::open("run.dat", OpenMode::WRITE)?;
//!     ar.write_scalar("/results/energy", 3.14f64)?;
//!     ar.write_array("/results/bins", &[1i32, 2, 3, 4])?;
//! }
//!
//! let ar = Archive::open("run.dat", OpenMode::READ)?;
//! let bins: Vec<i32> = ar.read_array("/results/bins")?;
//! ```

pub mod util;
pub mod core;
pub mod store;
pub mod archive;
pub mod serializer;

// Re-export commonly used types
pub use crate::util::{
    Bool, Complex64, ComplexOp, Dimensions, Element, Error, Hyperslab, NativeKind, NativeSlice,
    NativeSliceMut, Result,
};
pub use crate::archive::{Archive, ContextGuard, OpenMode};
pub use crate::core::{NodeKind, Persist, ResourceKey, Storage};
pub use crate::serializer::{ArchiveDeserializer, ArchiveSerializer, Deserializer, Serializer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Bool, Complex64, ComplexOp, Dimensions, Element, Error, Hyperslab, Result};
    pub use crate::archive::{Archive, OpenMode};
    pub use crate::core::Persist;
    pub use crate::serializer::{ArchiveDeserializer, ArchiveSerializer, Deserializer, Serializer};
}
