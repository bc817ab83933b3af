//! Archive handles.
//!
//! An [`Archive`] is a cheap handle on a pooled storage resource plus a
//! private context path. Cloning a handle shares the resource; dropping the
//! last handle on a resource closes it.
//!
//! ```ignore
//! use sciarchive::{Archive, OpenMode};
//!
//! let ar = Archive::open("run.dat", OpenMode::WRITE)?;
//! ar.write_scalar("/results/energy", 3.14f64)?;
//! ar.write_array("/results/bins", &[1i32, 2, 3, 4])?;
//! ```

mod context;
mod mode;
mod typed;

pub use context::ContextGuard;
pub use mode::OpenMode;

use std::path::Path;
use std::sync::Arc;

use crate::core::path;
use crate::core::pool::{self, Resource, ResourceKey};
use crate::core::{NodeKind, Storage};
use crate::util::{Dimensions, Error, NativeKind, Result};

/// Handle on an archive file.
pub struct Archive {
    resource: Arc<Resource>,
    context: String,
}

impl Archive {
    /// Open `filename` in `mode`, joining an already open resource with the
    /// same file and mode if there is one.
    pub fn open(filename: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let key = ResourceKey::new(filename, mode.is_writable(), mode.is_compressed())?;
        let resource = pool::acquire(key)?;
        Ok(Self {
            resource,
            context: path::SEPARATOR.to_string(),
        })
    }

    /// Absolute path of the archive file.
    pub fn filename(&self) -> &Path {
        self.resource.key().filename()
    }

    pub fn is_writable(&self) -> bool {
        self.resource.key().is_writable()
    }

    pub fn is_compressed(&self) -> bool {
        self.resource.key().is_compressed()
    }

    /// Pool key of the underlying resource.
    pub fn key(&self) -> &ResourceKey {
        self.resource.key()
    }

    /// Returns true if both handles use the same pooled resource.
    pub fn shares_resource_with(&self, other: &Archive) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }

    // ========================================================================
    // Context
    // ========================================================================

    /// Current context path. Relative paths are resolved against it.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Change the context. `path` is resolved against the current context;
    /// it does not have to exist.
    pub fn set_context(&mut self, path: &str) {
        self.context = self.complete_path(path);
    }

    /// Resolve `path` against the current context.
    pub fn complete_path(&self, path: &str) -> String {
        path::resolve(&self.context, path)
    }

    pub(crate) fn replace_context(&mut self, context: String) -> String {
        std::mem::replace(&mut self.context, context)
    }

    // ========================================================================
    // Storage access
    // ========================================================================

    fn storage<R>(&self, f: impl FnOnce(&mut dyn Storage) -> R) -> R {
        self.resource.with_storage(f)
    }

    fn storage_mut<R>(&self, f: impl FnOnce(&mut dyn Storage) -> Result<R>) -> Result<R> {
        if !self.is_writable() {
            return Err(Error::ReadOnly(self.filename().to_path_buf()));
        }
        self.resource.with_storage(f)
    }

    fn node_kind(&self, path: &str) -> Option<NodeKind> {
        let full = self.complete_path(path);
        self.storage(|s| s.node_kind(&full))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns true if `path` is a dataset.
    pub fn is_data(&self, path: &str) -> bool {
        self.node_kind(path) == Some(NodeKind::Data)
    }

    /// Returns true if `path` is an attribute (`.../@name`).
    pub fn is_attribute(&self, path: &str) -> bool {
        self.node_kind(path) == Some(NodeKind::Attribute)
    }

    /// Returns true if `path` is a group.
    pub fn is_group(&self, path: &str) -> bool {
        self.node_kind(path) == Some(NodeKind::Group)
    }

    /// Returns true if `path` holds a scalar dataset or attribute.
    pub fn is_scalar(&self, path: &str) -> bool {
        let full = self.complete_path(path);
        self.storage(|s| s.extent(&full).map(|d| d.is_scalar()).unwrap_or(false))
    }

    /// Returns true if `path` holds a dataset or attribute without elements.
    pub fn is_null(&self, path: &str) -> bool {
        let full = self.complete_path(path);
        self.storage(|s| s.extent(&full).map(|d| d.num_points() == 0).unwrap_or(false))
    }

    /// Returns true if `path` holds text written with [`write_str`](Self::write_str).
    pub fn is_string(&self, path: &str) -> bool {
        let full = self.complete_path(path);
        self.storage(|s| s.stored_kind(&full).map(|k| k == NativeKind::Text).unwrap_or(false))
    }

    /// Returns true if `path` holds complex elements.
    pub fn is_complex(&self, path: &str) -> bool {
        let full = self.complete_path(path);
        self.storage(|s| s.stored_kind(&full).map(|k| k.is_complex()).unwrap_or(false))
    }

    /// Names of the children of a group, in name order.
    pub fn list_children(&self, path: &str) -> Result<Vec<String>> {
        let full = self.complete_path(path);
        self.storage(|s| s.list_children(&full))
    }

    /// Names of the attributes of a group or dataset, without the `@`.
    pub fn list_attributes(&self, path: &str) -> Result<Vec<String>> {
        let full = self.complete_path(path);
        self.storage(|s| s.list_attributes(&full))
    }

    /// Shape of a dataset or attribute. Scalars have an empty extent.
    pub fn extent(&self, path: &str) -> Result<Dimensions> {
        let full = self.complete_path(path);
        self.storage(|s| s.extent(&full))
    }

    /// Rank of a dataset or attribute.
    pub fn dimensions(&self, path: &str) -> Result<usize> {
        self.extent(path).map(|d| d.rank())
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Create a group and any missing parents. An existing group is left as is.
    pub fn create_group(&self, path: &str) -> Result<()> {
        let full = self.complete_path(path);
        tracing::trace!(path = %full, "create group");
        self.storage_mut(|s| s.create_group(&full))
    }

    pub fn delete_data(&self, path: &str) -> Result<()> {
        let full = self.complete_path(path);
        self.storage_mut(|s| s.delete_data(&full))
    }

    /// Delete a group with everything below it.
    pub fn delete_group(&self, path: &str) -> Result<()> {
        let full = self.complete_path(path);
        self.storage_mut(|s| s.delete_group(&full))
    }

    pub fn delete_attribute(&self, path: &str) -> Result<()> {
        let full = self.complete_path(path);
        self.storage_mut(|s| s.delete_attribute(&full))
    }

    /// Write pending changes to the file without closing it.
    pub fn flush(&self) -> Result<()> {
        self.storage_mut(|s| s.flush())
    }
}

impl Clone for Archive {
    fn clone(&self) -> Self {
        pool::share(&self.resource);
        Self {
            resource: Arc::clone(&self.resource),
            context: self.context.clone(),
        }
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        if let Err(e) = pool::release(&self.resource) {
            tracing::error!(key = %self.resource.key(), error = %e, "failed to close archive");
        }
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("key", self.resource.key())
            .field("context", &self.context)
            .finish()
    }
}
