//! Scoped context changes.

use std::ops::{Deref, DerefMut};

use super::Archive;

/// Sets an archive's context for a scope and restores the previous one on drop.
///
/// The restore also runs on early returns and while unwinding, so a failing
/// composite save never leaves the handle pointing into its sub-tree.
///
/// ```ignore
/// let mut ar = ContextGuard::enter(&mut archive, "results");
/// ar.write_scalar("energy", 2.75)?; // writes /results/energy
/// ```
pub struct ContextGuard<'a> {
    archive: &'a mut Archive,
    previous: String,
}

impl<'a> ContextGuard<'a> {
    /// Resolve `path` against the current context and make it the new context.
    pub fn enter(archive: &'a mut Archive, path: &str) -> Self {
        let target = archive.complete_path(path);
        let previous = archive.replace_context(target);
        tracing::trace!(from = %previous, to = %archive.context(), "enter context");
        Self { archive, previous }
    }

    /// Context that will be restored.
    pub fn previous(&self) -> &str {
        &self.previous
    }
}

impl Deref for ContextGuard<'_> {
    type Target = Archive;

    fn deref(&self) -> &Archive {
        &*self.archive
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut Archive {
        &mut *self.archive
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        let left = self.archive.replace_context(previous);
        tracing::trace!(from = %left, to = %self.archive.context(), "restore context");
    }
}
