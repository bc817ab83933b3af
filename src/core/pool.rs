//! Process-wide pool of open storage resources.
//!
//! Every [`Archive`](crate::Archive) holds a share of a pooled [`Resource`].
//! Handles opened with an equal [`ResourceKey`] share one resource, so one
//! file is only opened once per mode no matter how many handles point at it.
//!
//! The pool keeps its own count of handles per resource. Acquiring, sharing
//! and releasing all happen under one process-wide lock, and the release that
//! brings the count to zero closes the engine before the lock is dropped. A
//! concurrent open of the same key therefore either joins the live resource or
//! opens a fresh one after the old one is fully closed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::traits::Storage;
use crate::store::FileStorage;
use crate::util::{Error, Result};

/// Identity of a pooled resource.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    filename: PathBuf,
    writable: bool,
    compressed: bool,
}

impl ResourceKey {
    /// Build a key. The filename is made absolute so that different spellings
    /// of the same relative path map to one key.
    pub fn new(filename: impl AsRef<Path>, writable: bool, compressed: bool) -> Result<Self> {
        let filename = filename.as_ref();
        let filename = std::path::absolute(filename).map_err(|e| Error::ResourceOpen {
            path: filename.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { filename, writable, compressed })
    }

    #[inline]
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match (self.writable, self.compressed) {
            (false, _) => "r",
            (true, false) => "w",
            (true, true) => "c",
        };
        write!(f, "{} ({})", self.filename.display(), mode)
    }
}

/// An open storage engine shared by all handles with the same key.
pub struct Resource {
    key: ResourceKey,
    storage: Mutex<Box<dyn Storage>>,
}

impl Resource {
    #[inline]
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Run `f` with exclusive access to the storage engine.
    pub fn with_storage<R>(&self, f: impl FnOnce(&mut dyn Storage) -> R) -> R {
        let mut storage = self.storage.lock();
        f(storage.as_mut())
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("key", &self.key).finish_non_exhaustive()
    }
}

struct PoolEntry {
    resource: Weak<Resource>,
    refs: usize,
}

static POOL: Mutex<BTreeMap<ResourceKey, PoolEntry>> = parking_lot::const_mutex(BTreeMap::new());

/// Get the resource for `key`, opening the archive file if it is not pooled yet.
pub fn acquire(key: ResourceKey) -> Result<Arc<Resource>> {
    acquire_with(key, |key| {
        let storage = FileStorage::open(key.filename(), key.is_writable(), key.is_compressed())?;
        Ok(Box::new(storage))
    })
}

/// Get the resource for `key`, calling `open` to create the engine if needed.
///
/// `open` runs with the pool lock held.
pub fn acquire_with<F>(key: ResourceKey, open: F) -> Result<Arc<Resource>>
where
    F: FnOnce(&ResourceKey) -> Result<Box<dyn Storage>>,
{
    let mut pool = POOL.lock();

    if let Some(entry) = pool.get_mut(&key) {
        if let Some(resource) = entry.resource.upgrade() {
            entry.refs += 1;
            tracing::debug!(key = %key, refs = entry.refs, "joined pooled resource");
            return Ok(resource);
        }
    }

    let storage = open(&key)?;
    debug_assert_eq!(storage.is_writable(), key.is_writable());
    let resource = Arc::new(Resource {
        key: key.clone(),
        storage: Mutex::new(storage),
    });
    tracing::debug!(key = %key, location = %storage_location(&resource), "opened resource");
    pool.insert(
        key,
        PoolEntry {
            resource: Arc::downgrade(&resource),
            refs: 1,
        },
    );
    Ok(resource)
}

fn storage_location(resource: &Resource) -> String {
    resource.with_storage(|storage| storage.location().display().to_string())
}

/// Register one more handle on an already acquired resource.
pub fn share(resource: &Arc<Resource>) {
    let mut pool = POOL.lock();
    match pool.get_mut(resource.key()) {
        Some(entry) if std::ptr::eq(entry.resource.as_ptr(), Arc::as_ptr(resource)) => {
            entry.refs += 1;
        }
        _ => debug_assert!(false, "sharing a resource that is not pooled: {}", resource.key()),
    }
}

/// Drop one handle's share. The last release closes the engine.
///
/// Errors from closing are returned; the resource is gone from the pool
/// either way.
pub fn release(resource: &Arc<Resource>) -> Result<()> {
    let mut pool = POOL.lock();
    let key = resource.key();

    let entry = match pool.get_mut(key) {
        Some(entry) if std::ptr::eq(entry.resource.as_ptr(), Arc::as_ptr(resource)) => entry,
        _ => {
            debug_assert!(false, "releasing a resource that is not pooled: {}", key);
            return Ok(());
        }
    };

    debug_assert!(entry.refs > 0, "resource count underflow: {}", key);
    entry.refs = entry.refs.saturating_sub(1);
    if entry.refs > 0 {
        return Ok(());
    }

    pool.remove(key);
    let result = resource.with_storage(|storage| storage.close());
    tracing::debug!(key = %key, ok = result.is_ok(), "closed resource");
    result
}

/// Number of handles sharing the resource for `key`; 0 when not open.
pub fn ref_count(key: &ResourceKey) -> usize {
    POOL.lock().get(key).map_or(0, |entry| entry.refs)
}

/// Whether a live resource exists for `key`.
pub fn is_open(key: &ResourceKey) -> bool {
    POOL.lock()
        .get(key)
        .is_some_and(|entry| entry.refs > 0 && entry.resource.strong_count() > 0)
}

/// Number of resources currently pooled.
pub fn open_resources() -> usize {
    POOL.lock().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_is_absolute() {
        let key = ResourceKey::new("some/relative.dat", true, false).unwrap();
        assert!(key.filename().is_absolute());
        assert_eq!(key, ResourceKey::new("./some/relative.dat", true, false).unwrap());
        assert_ne!(key, ResourceKey::new("some/relative.dat", false, false).unwrap());
    }

    #[test]
    fn test_key_display() {
        let key = ResourceKey::new("/tmp/x.dat", true, true).unwrap();
        assert!(key.to_string().ends_with("(c)"));
    }

    #[test]
    fn test_acquire_share_release() {
        let dir = tempdir().unwrap();
        let key = ResourceKey::new(dir.path().join("pool.dat"), true, false).unwrap();

        let a = acquire(key.clone()).unwrap();
        let b = acquire(key.clone()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(ref_count(&key), 2);

        share(&a);
        assert_eq!(ref_count(&key), 3);

        release(&a).unwrap();
        release(&a).unwrap();
        assert!(is_open(&key));
        release(&b).unwrap();
        assert!(!is_open(&key));
        assert_eq!(ref_count(&key), 0);
    }

    #[test]
    fn test_failed_open_leaves_no_entry() {
        let dir = tempdir().unwrap();
        let key = ResourceKey::new(dir.path().join("absent.dat"), false, false).unwrap();
        assert!(matches!(acquire(key.clone()), Err(Error::ResourceOpen { .. })));
        assert!(!is_open(&key));
        assert_eq!(ref_count(&key), 0);
    }

    #[test]
    fn test_reopen_after_close_is_fresh() {
        let dir = tempdir().unwrap();
        let key = ResourceKey::new(dir.path().join("again.dat"), true, false).unwrap();

        let first = acquire(key.clone()).unwrap();
        release(&first).unwrap();
        let second = acquire(key.clone()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(ref_count(&key), 1);
        release(&second).unwrap();
    }
}
