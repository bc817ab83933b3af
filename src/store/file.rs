//! File-backed storage engine.
//!
//! The whole archive tree is held in memory. Read mode decodes it once from a
//! memory map; write mode keeps the file open and replaces it on flush when
//! something changed.
//!
//! A flush never rewrites the archive in place: the new content goes to a
//! sibling `.tmp` file, is synced, and is renamed over the archive. A failed
//! or interrupted flush leaves the previous content intact, and readers that
//! mapped the old file keep a valid mapping.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::codec;
use super::tree::Tree;
use crate::core::{NodeKind, Storage};
use crate::util::{Dimensions, Error, Hyperslab, NativeKind, NativeSlice, NativeSliceMut, Result};

/// Storage engine over one archive file.
pub struct FileStorage {
    path: PathBuf,
    writable: bool,
    compressed: bool,
    tree: Tree,
    /// Open handle in write mode; None for read mode and after close.
    file: Option<File>,
    dirty: bool,
}

impl FileStorage {
    /// Open `path` for reading, or for writing (creating it if missing).
    ///
    /// `compressed` only affects how the file is written back; reading
    /// follows the flag stored in the file.
    pub fn open(path: impl AsRef<Path>, writable: bool, compressed: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (tree, file) = if writable {
            let (tree, file) = Self::load_writable(&path)?;
            (tree, Some(file))
        } else {
            (Self::load_readonly(&path)?, None)
        };

        // A fresh file has no valid header yet; make sure close writes one.
        let dirty = match &file {
            Some(f) => f.metadata().map(|m| m.len() == 0).unwrap_or(true),
            None => false,
        };

        tracing::debug!(
            path = %path.display(),
            writable,
            compressed,
            "opened archive file"
        );
        Ok(Self { path, writable, compressed, tree, file, dirty })
    }

    fn load_readonly(path: &Path) -> Result<Tree> {
        let file = File::open(path).map_err(|e| open_error(path, e))?;
        // Safety: the map is private to this call and dropped after decoding.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| open_error(path, e))?;
        codec::decode_file(&mmap).map_err(|e| open_error(path, e))
    }

    fn load_writable(path: &Path) -> Result<(Tree, File)> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| open_error(path, e))?;

        let len = file.metadata().map_err(|e| open_error(path, e))?.len();
        if len == 0 {
            return Ok((Tree::new(), file));
        }

        let tree = {
            // Safety: as above; the map is gone before the file is rewritten.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| open_error(path, e))?;
            codec::decode_file(&mmap).map_err(|e| open_error(path, e))?
        };
        Ok((tree, file))
    }

    /// Whether the file is written back compressed.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Whether there are changes not yet written to the file.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a mutation to the tree, marking it dirty on success.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut Tree) -> Result<T>) -> Result<T> {
        if !self.writable || self.file.is_none() {
            return Err(Error::ReadOnly(self.path.clone()));
        }
        let out = f(&mut self.tree)?;
        self.dirty = true;
        Ok(out)
    }
}

/// Sibling path a new version of `path` is written to before the rename.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Replace the file at `path` with what `write` puts into a fresh sibling.
///
/// Returns the new file, open for reading and writing. On error the old file
/// is untouched and the sibling is removed.
fn replace_file(path: &Path, write: impl FnOnce(&mut File) -> io::Result<()>) -> Result<File> {
    let tmp = temp_path(path);
    let result = (|| -> Result<File> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        write(&mut file)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(file)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn open_error(path: &Path, reason: impl ToString) -> Error {
    Error::ResourceOpen {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl Storage for FileStorage {
    fn location(&self) -> &Path {
        &self.path
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn node_kind(&self, path: &str) -> Option<NodeKind> {
        self.tree.node_kind(path)
    }

    fn stored_kind(&self, path: &str) -> Result<NativeKind> {
        self.tree.stored_kind(path)
    }

    fn extent(&self, path: &str) -> Result<Dimensions> {
        self.tree.extent(path)
    }

    fn read_typed(
        &self,
        path: &str,
        out: NativeSliceMut<'_>,
        slab: Option<&Hyperslab>,
    ) -> Result<()> {
        self.tree.read_typed(path, out, slab)
    }

    fn write_typed(
        &mut self,
        path: &str,
        data: NativeSlice<'_>,
        shape: &Dimensions,
        slab: Option<&Hyperslab>,
    ) -> Result<()> {
        self.mutate(|tree| tree.write_typed(path, data, shape, slab))
    }

    fn list_children(&self, path: &str) -> Result<Vec<String>> {
        self.tree.list_children(path)
    }

    fn list_attributes(&self, path: &str) -> Result<Vec<String>> {
        self.tree.list_attributes(path)
    }

    fn create_group(&mut self, path: &str) -> Result<()> {
        self.mutate(|tree| tree.create_group(path))
    }

    fn delete_group(&mut self, path: &str) -> Result<()> {
        self.mutate(|tree| tree.delete_group(path))
    }

    fn delete_data(&mut self, path: &str) -> Result<()> {
        self.mutate(|tree| tree.delete_data(path))
    }

    fn delete_attribute(&mut self, path: &str) -> Result<()> {
        self.mutate(|tree| tree.delete_attribute(path))
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };

        let bytes = codec::encode_file(&self.tree, self.compressed)?;
        *file = replace_file(&self.path, |tmp| tmp.write_all(&bytes))?;
        self.dirty = false;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "flushed archive file");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let result = self.flush();
        self.file = None;
        tracing::debug!(path = %self.path.display(), "closed archive file");
        result
    }
}

impl Drop for FileStorage {
    fn drop(&mut self) {
        if self.dirty && self.file.is_some() {
            if let Err(e) = self.flush() {
                tracing::error!(path = %self.path.display(), error = %e, "failed to write archive on drop");
            }
        }
    }
}
