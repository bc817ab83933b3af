//! Abstract traits at the edges of the archive layer.
//!
//! [`Storage`] is the interface between pooled resources and a storage engine;
//! [`Persist`] is the interface between the archive and composite user values.

use std::path::Path;

use crate::archive::Archive;
use crate::util::{Dimensions, Hyperslab, NativeKind, NativeSlice, NativeSliceMut, Result};

// ============================================================================
// Storage engine
// ============================================================================

/// What a path refers to inside a storage engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Data,
    Attribute,
}

/// Storage engine behind a pooled resource.
///
/// All paths handed to an engine are absolute and already resolved. Callers
/// serialize access; implementations need not be internally synchronized.
pub trait Storage: Send {
    /// Location the engine was opened on.
    fn location(&self) -> &Path;

    /// Whether mutating calls are allowed.
    fn is_writable(&self) -> bool;

    /// What `path` refers to, if anything.
    fn node_kind(&self, path: &str) -> Option<NodeKind>;

    /// Kind of the elements stored at a dataset or attribute.
    fn stored_kind(&self, path: &str) -> Result<NativeKind>;

    /// Shape of a dataset or attribute.
    fn extent(&self, path: &str) -> Result<Dimensions>;

    /// Read a dataset or attribute, or the `slab` region of it, into `out`.
    fn read_typed(&self, path: &str, out: NativeSliceMut<'_>, slab: Option<&Hyperslab>)
        -> Result<()>;

    /// Write `data` as an array of `shape`, or as the `slab` region of one.
    fn write_typed(
        &mut self,
        path: &str,
        data: NativeSlice<'_>,
        shape: &Dimensions,
        slab: Option<&Hyperslab>,
    ) -> Result<()>;

    /// Names of the children of a group, in name order.
    fn list_children(&self, path: &str) -> Result<Vec<String>>;

    /// Names of the attributes of a group or dataset, in name order.
    fn list_attributes(&self, path: &str) -> Result<Vec<String>>;

    /// Create a group and any missing parents. Existing groups are left alone.
    fn create_group(&mut self, path: &str) -> Result<()>;

    fn delete_group(&mut self, path: &str) -> Result<()>;

    fn delete_data(&mut self, path: &str) -> Result<()>;

    fn delete_attribute(&mut self, path: &str) -> Result<()>;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<()>;

    /// Persist pending changes and release the underlying location.
    fn close(&mut self) -> Result<()>;
}

// ============================================================================
// Composite values
// ============================================================================

/// A value that stores itself as a sub-tree of an archive.
///
/// [`Archive::save`] and [`Archive::load`] call these with the archive
/// context already set to the value's own path, so implementations address
/// their fields with relative paths. The previous context is restored when the
/// call returns, whether it succeeded or not.
///
/// ```ignore
/// impl Persist for Histogram {
///     fn save(&self, ar: &mut Archive) -> Result<()> {
///         ar.write_array("bins", &self.bins)?;
///         ar.write_scalar("count", self.count)
///     }
///
///     fn load(&mut self, ar: &mut Archive) -> Result<()> {
///         self.bins = ar.read_array("bins")?;
///         self.count = ar.read_scalar("count")?;
///         Ok(())
///     }
/// }
/// ```
pub trait Persist {
    fn save(&self, ar: &mut Archive) -> Result<()>;

    fn load(&mut self, ar: &mut Archive) -> Result<()>;
}
