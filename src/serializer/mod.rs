//! Scoped serializers over an archive.
//!
//! A [`Serializer`] writes named values into a tree of groups. [`enter`]
//! opens a group below the current scope, [`exit`] leaves it again, and every
//! value is written under the innermost open scope:
//!
//! ```ignore
//! let mut out = ArchiveSerializer::new(&archive);
//! out.enter("observables")?;
//! out.write_slice("energy", &samples)?;   // /observables/energy
//! out.exit()?;
//! ```
//!
//! [`Deserializer`] mirrors this for reading.
//!
//! [`enter`]: Serializer::enter
//! [`exit`]: Serializer::exit

mod scope;

use scope::ScopeStack;

use crate::archive::Archive;
use crate::core::path;
use crate::util::{Dimensions, Element, Error, NativeSlice, NativeSliceMut, Result};

// ============================================================================
// Traits
// ============================================================================

/// Sink for named values organised in nested scopes.
pub trait Serializer {
    /// Open the scope `name` below the current one.
    fn enter(&mut self, name: &str) -> Result<()>;

    /// Leave the innermost scope.
    fn exit(&mut self) -> Result<()>;

    /// Write `data` under `key` with an explicit shape.
    fn write_shaped(&mut self, key: &str, data: NativeSlice<'_>, shape: &Dimensions) -> Result<()>;

    /// Write `data` under `key` as a one-dimensional array.
    fn write(&mut self, key: &str, data: NativeSlice<'_>) -> Result<()> {
        let shape = Dimensions::d1(data.len());
        self.write_shaped(key, data, &shape)
    }

    /// Write UTF-8 text under `key`.
    fn write_str(&mut self, key: &str, value: &str) -> Result<()> {
        self.write(key, NativeSlice::Text(value.as_bytes()))
    }

    fn write_slice<T: Element>(&mut self, key: &str, data: &[T]) -> Result<()>
    where
        Self: Sized,
    {
        let native = T::native(data).ok_or_else(|| Error::UnsupportedType(key.to_string()))?;
        self.write(key, native)
    }

    fn write_scalar<T: Element>(&mut self, key: &str, value: T) -> Result<()>
    where
        Self: Sized,
    {
        let native = T::native(std::slice::from_ref(&value))
            .ok_or_else(|| Error::UnsupportedType(key.to_string()))?;
        self.write_shaped(key, native, &Dimensions::scalar())
    }
}

/// Source of named values organised in nested scopes.
pub trait Deserializer {
    /// Open the existing scope `name` below the current one.
    fn enter(&mut self, name: &str) -> Result<()>;

    /// Leave the innermost scope.
    fn exit(&mut self) -> Result<()>;

    /// Shape of the value under `key`.
    fn extent(&self, key: &str) -> Result<Dimensions>;

    /// Read the value under `key` into `out`.
    fn read(&self, key: &str, out: NativeSliceMut<'_>) -> Result<()>;

    /// Read text written with [`Serializer::write_str`].
    fn read_string(&self, key: &str) -> Result<String> {
        let mut bytes = vec![0u8; self.extent(key)?.num_points()];
        self.read(key, NativeSliceMut::Text(&mut bytes))?;
        String::from_utf8(bytes).map_err(|e| Error::invalid(format!("{}: {}", key, e)))
    }

    fn read_vec<T: Element + Default + Clone>(&self, key: &str) -> Result<Vec<T>>
    where
        Self: Sized,
    {
        let n = self.extent(key)?.num_points();
        let mut out = vec![T::default(); n];
        let native =
            T::native_mut(&mut out).ok_or_else(|| Error::UnsupportedType(key.to_string()))?;
        self.read(key, native)?;
        Ok(out)
    }

    fn read_scalar<T: Element + Default>(&self, key: &str) -> Result<T>
    where
        Self: Sized,
    {
        let mut value = [T::default()];
        let native =
            T::native_mut(&mut value).ok_or_else(|| Error::UnsupportedType(key.to_string()))?;
        self.read(key, native)?;
        let [value] = value;
        Ok(value)
    }
}

// ============================================================================
// Archive-backed implementations
// ============================================================================

/// [`Serializer`] writing into an archive.
///
/// Holds its own handle on the archive; scopes are groups below the base
/// path, which is resolved against the archive's context at creation.
pub struct ArchiveSerializer {
    archive: Archive,
    scopes: ScopeStack,
}

impl ArchiveSerializer {
    /// Serialize below the archive's current context.
    pub fn new(archive: &Archive) -> Self {
        Self::with_base(archive, ".")
    }

    /// Serialize below `base`.
    pub fn with_base(archive: &Archive, base: &str) -> Self {
        let base = archive.complete_path(base);
        Self {
            archive: archive.clone(),
            scopes: ScopeStack::new(base),
        }
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Absolute path `key` is written to in the current scope.
    pub fn path(&self, key: &str) -> String {
        self.scopes.path(key)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }
}

impl Serializer for ArchiveSerializer {
    fn enter(&mut self, name: &str) -> Result<()> {
        path::validate_leaf(name)?;
        let group = self.scopes.path(name);
        self.archive.create_group(&group)?;
        self.scopes.push(name);
        tracing::debug!(scope = %group, "enter scope");
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        let left = self.scopes.current();
        self.scopes.pop()?;
        tracing::debug!(scope = %left, "exit scope");
        Ok(())
    }

    fn write_shaped(&mut self, key: &str, data: NativeSlice<'_>, shape: &Dimensions) -> Result<()> {
        path::validate_leaf(key)?;
        let target = self.scopes.path(key);
        self.archive.write_native(&target, data, shape, None)
    }
}

impl Drop for ArchiveSerializer {
    fn drop(&mut self) {
        if self.scopes.depth() > 0 {
            tracing::warn!(
                scope = %self.scopes.current(),
                depth = self.scopes.depth(),
                "serializer dropped with open scopes"
            );
        }
    }
}

/// [`Deserializer`] reading from an archive.
pub struct ArchiveDeserializer {
    archive: Archive,
    scopes: ScopeStack,
}

impl ArchiveDeserializer {
    /// Deserialize below the archive's current context.
    pub fn new(archive: &Archive) -> Self {
        Self::with_base(archive, ".")
    }

    /// Deserialize below `base`.
    pub fn with_base(archive: &Archive, base: &str) -> Self {
        let base = archive.complete_path(base);
        Self {
            archive: archive.clone(),
            scopes: ScopeStack::new(base),
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    pub fn path(&self, key: &str) -> String {
        self.scopes.path(key)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }
}

impl Deserializer for ArchiveDeserializer {
    fn enter(&mut self, name: &str) -> Result<()> {
        path::validate_leaf(name)?;
        let group = self.scopes.path(name);
        if !self.archive.is_group(&group) {
            return Err(Error::not_found(group));
        }
        self.scopes.push(name);
        tracing::debug!(scope = %group, "enter scope");
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        let left = self.scopes.current();
        self.scopes.pop()?;
        tracing::debug!(scope = %left, "exit scope");
        Ok(())
    }

    fn extent(&self, key: &str) -> Result<Dimensions> {
        path::validate_leaf(key)?;
        self.archive.extent(&self.scopes.path(key))
    }

    fn read(&self, key: &str, out: NativeSliceMut<'_>) -> Result<()> {
        path::validate_leaf(key)?;
        self.archive.read_native(&self.scopes.path(key), out, None)
    }
}
