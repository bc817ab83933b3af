//! Typed reads and writes.
//!
//! Every entry point funnels into one dispatch over [`NativeSlice`]: element
//! types outside the native set are rejected with
//! [`Error::UnsupportedType`] before anything touches storage.

use super::{Archive, ContextGuard};
use crate::core::{NodeKind, Persist};
use crate::util::{Dimensions, Element, Error, Hyperslab, NativeSlice, NativeSliceMut, Result};

impl Archive {
    /// Write `data` as an array of `shape`, or as the `slab` region of one.
    ///
    /// Without a slab, `data` must hold exactly `shape.num_points()` elements
    /// and replaces whatever was stored at `path`. With a slab, only that
    /// region is written; the rest of an existing dataset of the same kind and
    /// shape is kept, otherwise it is zero-filled. Missing parent groups are
    /// created.
    pub fn write<T: Element>(
        &self,
        path: &str,
        data: &[T],
        shape: &Dimensions,
        slab: Option<&Hyperslab>,
    ) -> Result<()> {
        let full = self.complete_path(path);
        let native = T::native(data).ok_or(Error::UnsupportedType(full))?;
        self.write_native(path, native, shape, slab)
    }

    /// Write an already tagged slice.
    pub fn write_native(
        &self,
        path: &str,
        data: NativeSlice<'_>,
        shape: &Dimensions,
        slab: Option<&Hyperslab>,
    ) -> Result<()> {
        let full = self.complete_path(path);
        tracing::trace!(path = %full, kind = %data.kind(), extent = %shape, "write");
        self.storage_mut(|s| s.write_typed(&full, data, shape, slab))
    }

    /// Write a single value as a scalar.
    pub fn write_scalar<T: Element>(&self, path: &str, value: T) -> Result<()> {
        self.write(path, std::slice::from_ref(&value), &Dimensions::scalar(), None)
    }

    /// Write a one-dimensional array.
    pub fn write_array<T: Element>(&self, path: &str, data: &[T]) -> Result<()> {
        self.write(path, data, &Dimensions::d1(data.len()), None)
    }

    /// Read a dataset, or the `slab` region of it, into `out`.
    ///
    /// The stored kind must be exactly `T`'s; there is no conversion.
    pub fn read<T: Element>(&self, path: &str, out: &mut [T], slab: Option<&Hyperslab>) -> Result<()> {
        let full = self.complete_path(path);
        let native = T::native_mut(out).ok_or(Error::UnsupportedType(full))?;
        self.read_native(path, native, slab)
    }

    /// Read into an already tagged slice.
    pub fn read_native(
        &self,
        path: &str,
        out: NativeSliceMut<'_>,
        slab: Option<&Hyperslab>,
    ) -> Result<()> {
        let full = self.complete_path(path);
        tracing::trace!(path = %full, kind = %out.kind(), "read");
        self.storage(|s| s.read_typed(&full, out, slab))
    }

    /// Read a single value.
    pub fn read_scalar<T: Element + Default>(&self, path: &str) -> Result<T> {
        let mut value = [T::default()];
        self.read(path, &mut value, None)?;
        let [value] = value;
        Ok(value)
    }

    /// Read a whole dataset into a vector, whatever its shape.
    pub fn read_array<T: Element + Default + Clone>(&self, path: &str) -> Result<Vec<T>> {
        let full = self.complete_path(path);
        if T::native_kind().is_none() {
            return Err(Error::UnsupportedType(full));
        }

        tracing::trace!(path = %full, "read array");
        self.storage(|s| {
            let n = s.extent(&full)?.num_points();
            let mut out = vec![T::default(); n];
            let native = T::native_mut(&mut out).ok_or_else(|| Error::UnsupportedType(full.clone()))?;
            s.read_typed(&full, native, None)?;
            Ok(out)
        })
    }

    /// Write UTF-8 text. It is stored as its own kind, so no element type
    /// reads it back; use [`read_string`](Self::read_string).
    pub fn write_str(&self, path: &str, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.write_native(path, NativeSlice::Text(bytes), &Dimensions::d1(bytes.len()), None)
    }

    /// Read text written with [`write_str`](Self::write_str).
    pub fn read_string(&self, path: &str) -> Result<String> {
        let full = self.complete_path(path);
        let bytes = self.storage(|s| {
            let n = s.extent(&full)?.num_points();
            let mut bytes = vec![0u8; n];
            s.read_typed(&full, NativeSliceMut::Text(&mut bytes), None)?;
            Ok::<_, Error>(bytes)
        })?;
        String::from_utf8(bytes).map_err(|e| Error::invalid(format!("{}: {}", full, e)))
    }

    /// Whether the datum at `path` is stored as `T`.
    ///
    /// Groups hold no datum and report false.
    pub fn is_datatype<T: Element>(&self, path: &str) -> Result<bool> {
        let full = self.complete_path(path);
        let Some(kind) = T::native_kind() else {
            return Err(Error::UnsupportedProbe(full));
        };
        self.storage(|s| match s.node_kind(&full) {
            None => Err(Error::not_found(full.as_str())),
            Some(NodeKind::Group) => Ok(false),
            Some(_) => Ok(s.stored_kind(&full)? == kind),
        })
    }

    // ========================================================================
    // Composites
    // ========================================================================

    /// Store a composite value as the group at `path`.
    ///
    /// The value's [`Persist::save`] runs with the context set to that group.
    pub fn save<P: Persist + ?Sized>(&mut self, path: &str, value: &P) -> Result<()> {
        let full = self.complete_path(path);
        self.create_group(&full)?;
        let mut ar = ContextGuard::enter(self, &full);
        value.save(&mut ar)
    }

    /// Load a composite value from the group at `path`.
    pub fn load<P: Persist + ?Sized>(&mut self, path: &str, value: &mut P) -> Result<()> {
        let full = self.complete_path(path);
        if !self.is_group(&full) {
            return Err(Error::not_found(full));
        }
        let mut ar = ContextGuard::enter(self, &full);
        value.load(&mut ar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::OpenMode;
    use crate::util::{Bool, Complex64};
    use tempfile::tempdir;

    fn scratch(name: &str) -> (tempfile::TempDir, Archive) {
        let dir = tempdir().unwrap();
        let ar = Archive::open(dir.path().join(name), OpenMode::WRITE).unwrap();
        (dir, ar)
    }

    #[test]
    fn test_scalar_round_trip() {
        let (_dir, ar) = scratch("scalar.dat");
        ar.write_scalar("/e", 2.75f64).unwrap();
        ar.write_scalar("/flag", Bool::TRUE).unwrap();
        ar.write_scalar("/z", Complex64::new(1.0, -1.0)).unwrap();

        assert_eq!(ar.read_scalar::<f64>("/e").unwrap(), 2.75);
        assert!(ar.read_scalar::<Bool>("/flag").unwrap().get());
        assert_eq!(ar.read_scalar::<Complex64>("/z").unwrap(), Complex64::new(1.0, -1.0));
        assert!(ar.is_scalar("/e"));
        assert!(ar.is_complex("/z"));
        assert!(!ar.is_complex("/e"));
        assert_eq!(ar.dimensions("/e").unwrap(), 0);
    }

    #[test]
    fn test_unsupported_type() {
        #[derive(Default, Clone)]
        struct Opaque;
        impl Element for Opaque {}

        let (_dir, ar) = scratch("unsupported.dat");
        let err = ar.write_array("/x", &[Opaque]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(ref p) if p == "/x"));
        assert!(matches!(ar.read_array::<Opaque>("/x"), Err(Error::UnsupportedType(_))));
        assert!(matches!(ar.is_datatype::<Opaque>("/x"), Err(Error::UnsupportedProbe(_))));
        assert!(!ar.is_data("/x"));
    }

    #[test]
    fn test_is_datatype() {
        let (_dir, ar) = scratch("datatype.dat");
        ar.write_array("/v", &[1i32, 2]).unwrap();
        assert!(ar.is_datatype::<i32>("/v").unwrap());
        assert!(!ar.is_datatype::<f64>("/v").unwrap());
        assert!(!ar.is_datatype::<f64>("/").unwrap());
        assert!(matches!(ar.is_datatype::<f64>("/nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_text_round_trip() {
        let (_dir, ar) = scratch("text.dat");
        ar.write_str("/name", "Magnetization²").unwrap();
        assert!(matches!(ar.write_str("/g/@units", ""), Err(Error::NotFound(_))));
        ar.create_group("/g").unwrap();
        ar.write_str("/g/@units", "").unwrap();

        assert_eq!(ar.read_string("/name").unwrap(), "Magnetization²");
        assert_eq!(ar.read_string("/g/@units").unwrap(), "");
        assert!(ar.is_null("/g/@units"));
        assert!(!ar.is_datatype::<u8>("/name").unwrap());
        assert!(matches!(ar.read_array::<u8>("/name"), Err(Error::TypeMismatch { .. })));

        ar.write_array("/bytes", &[0xffu8, 0xfe]).unwrap();
        assert!(matches!(ar.read_string("/bytes"), Err(Error::TypeMismatch { .. })));

        ar.write_native("/bad", NativeSlice::Text(&[0xff]), &Dimensions::d1(1), None).unwrap();
        assert!(matches!(ar.read_string("/bad"), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_relative_paths_use_context() {
        let (_dir, mut ar) = scratch("relative.dat");
        ar.set_context("/sim/step1");
        ar.write_scalar("t", 0.5f32).unwrap();
        assert!(ar.is_data("/sim/step1/t"));
        assert_eq!(ar.read_scalar::<f32>("../step1/t").unwrap(), 0.5);
    }
}
