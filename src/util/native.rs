//! Native element kinds - the closed set of types the archive stores directly.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Native element kind enum - the storage type of a dataset.
///
/// Every dataset and attribute in an archive holds elements of exactly one of
/// these kinds. Anything else has to be decomposed by the caller (see
/// [`Persist`](crate::core::Persist)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum NativeKind {
    /// Boolean (stored as u8: 0 = false, non-zero = true)
    Bool = 0,
    /// Unsigned 8-bit integer
    Uint8 = 1,
    /// Signed 8-bit integer
    Int8 = 2,
    /// Unsigned 16-bit integer
    Uint16 = 3,
    /// Signed 16-bit integer
    Int16 = 4,
    /// Unsigned 32-bit integer
    Uint32 = 5,
    /// Signed 32-bit integer
    Int32 = 6,
    /// Unsigned 64-bit integer
    Uint64 = 7,
    /// Signed 64-bit integer
    Int64 = 8,
    /// 32-bit floating point
    Float32 = 10,
    /// 64-bit floating point
    Float64 = 11,
    /// Complex number of two f64
    Complex64 = 20,
    /// Complex operator (2x2 real block) of four f64
    ComplexOp = 21,
    /// UTF-8 text, one byte per element
    Text = 30,
}

impl NativeKind {
    /// All kinds, in tag order.
    pub const ALL: [NativeKind; 14] = [
        Self::Bool,
        Self::Uint8,
        Self::Int8,
        Self::Uint16,
        Self::Int16,
        Self::Uint32,
        Self::Int32,
        Self::Uint64,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::Complex64,
        Self::ComplexOp,
        Self::Text,
    ];

    /// Returns the size in bytes of a single element of this kind.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Bool | Self::Uint8 | Self::Int8 | Self::Text => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Uint64 | Self::Int64 | Self::Float64 => 8,
            Self::Complex64 => 16,
            Self::ComplexOp => 32,
        }
    }

    /// Returns the name of this kind as a string.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool_t",
            Self::Uint8 => "uint8_t",
            Self::Int8 => "int8_t",
            Self::Uint16 => "uint16_t",
            Self::Int16 => "int16_t",
            Self::Uint32 => "uint32_t",
            Self::Int32 => "int32_t",
            Self::Uint64 => "uint64_t",
            Self::Int64 => "int64_t",
            Self::Float32 => "float32_t",
            Self::Float64 => "float64_t",
            Self::Complex64 => "complex128_t",
            Self::ComplexOp => "complex_op_t",
            Self::Text => "string",
        }
    }

    /// Convert from the stored tag. Returns None for unknown tags.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Bool),
            1 => Some(Self::Uint8),
            2 => Some(Self::Int8),
            3 => Some(Self::Uint16),
            4 => Some(Self::Int16),
            5 => Some(Self::Uint32),
            6 => Some(Self::Int32),
            7 => Some(Self::Uint64),
            8 => Some(Self::Int64),
            10 => Some(Self::Float32),
            11 => Some(Self::Float64),
            20 => Some(Self::Complex64),
            21 => Some(Self::ComplexOp),
            30 => Some(Self::Text),
            _ => None,
        }
    }

    /// Returns true if elements carry an imaginary part.
    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::ComplexOp)
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Element types without a primitive counterpart
// ============================================================================

/// Boolean type with guaranteed 1-byte storage.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Bool(u8);

impl Bool {
    pub const TRUE: Self = Self(1);
    pub const FALSE: Self = Self(0);

    #[inline]
    pub const fn new(v: bool) -> Self {
        Self(v as u8)
    }

    #[inline]
    pub const fn get(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Bool {
    #[inline]
    fn from(v: bool) -> Self {
        Self::new(v)
    }
}

impl From<Bool> for bool {
    #[inline]
    fn from(v: Bool) -> Self {
        v.get()
    }
}

impl fmt::Debug for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Complex number with f64 parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl From<f64> for Complex64 {
    fn from(re: f64) -> Self {
        Self::new(re, 0.0)
    }
}

/// Complex operator: the real 2x2 block `[[re*re, re*im], [im*re, im*im]]`.
///
/// Used by statistics code for covariances of complex observables, where the
/// four real products have to be kept apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ComplexOp {
    pub rere: f64,
    pub reim: f64,
    pub imre: f64,
    pub imim: f64,
}

impl ComplexOp {
    #[inline]
    pub const fn new(rere: f64, reim: f64, imre: f64, imim: f64) -> Self {
        Self { rere, reim, imre, imim }
    }

    /// Outer product of two complex numbers.
    pub fn outer(a: Complex64, b: Complex64) -> Self {
        Self::new(a.re * b.re, a.re * b.im, a.im * b.re, a.im * b.im)
    }
}

// ============================================================================
// Typed dispatch
// ============================================================================

/// Element type seen by the typed read/write entry points.
///
/// The default methods are the unspecialized fallback: a type that implements
/// `Element` without overriding them compiles, but every archive call with it
/// fails with [`Error::UnsupportedType`](crate::Error::UnsupportedType) (or
/// [`Error::UnsupportedProbe`](crate::Error::UnsupportedProbe) for probes).
/// Only the native kinds override them.
pub trait Element: Sized {
    /// Kind this element is stored as.
    fn native_kind() -> Option<NativeKind> {
        None
    }

    /// View a slice of elements as a tagged native slice.
    fn native(_data: &[Self]) -> Option<NativeSlice<'_>> {
        None
    }

    /// View a mutable slice of elements as a tagged native slice.
    fn native_mut(_data: &mut [Self]) -> Option<NativeSliceMut<'_>> {
        None
    }
}

/// Element kinds with a Rust element type, then kinds only reachable
/// through dedicated entry points (text).
macro_rules! native_types {
    ($($ty:ty => $kind:ident),* $(,)? ; $($raw:ty => $raw_kind:ident),* $(,)?) => {
        /// Borrowed slice of one native kind.
        #[derive(Clone, Copy, Debug)]
        pub enum NativeSlice<'a> {
            $($kind(&'a [$ty]),)*
            $($raw_kind(&'a [$raw]),)*
        }

        /// Mutably borrowed slice of one native kind.
        #[derive(Debug)]
        pub enum NativeSliceMut<'a> {
            $($kind(&'a mut [$ty]),)*
            $($raw_kind(&'a mut [$raw]),)*
        }

        impl<'a> NativeSlice<'a> {
            /// Kind of the elements.
            pub fn kind(&self) -> NativeKind {
                match self {
                    $(Self::$kind(_) => NativeKind::$kind,)*
                    $(Self::$raw_kind(_) => NativeKind::$raw_kind,)*
                }
            }

            /// Number of elements.
            pub fn len(&self) -> usize {
                match self {
                    $(Self::$kind(s) => s.len(),)*
                    $(Self::$raw_kind(s) => s.len(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Raw bytes in native byte order.
            pub fn as_bytes(&self) -> &'a [u8] {
                match *self {
                    $(Self::$kind(s) => bytemuck::cast_slice(s),)*
                    $(Self::$raw_kind(s) => bytemuck::cast_slice(s),)*
                }
            }
        }

        impl NativeSliceMut<'_> {
            /// Kind of the elements.
            pub fn kind(&self) -> NativeKind {
                match self {
                    $(Self::$kind(_) => NativeKind::$kind,)*
                    $(Self::$raw_kind(_) => NativeKind::$raw_kind,)*
                }
            }

            /// Number of elements.
            pub fn len(&self) -> usize {
                match self {
                    $(Self::$kind(s) => s.len(),)*
                    $(Self::$raw_kind(s) => s.len(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Raw bytes in native byte order.
            pub fn as_bytes_mut(&mut self) -> &mut [u8] {
                match self {
                    $(Self::$kind(s) => bytemuck::cast_slice_mut(&mut **s),)*
                    $(Self::$raw_kind(s) => bytemuck::cast_slice_mut(&mut **s),)*
                }
            }
        }

        $(
            impl Element for $ty {
                #[inline]
                fn native_kind() -> Option<NativeKind> {
                    Some(NativeKind::$kind)
                }

                #[inline]
                fn native(data: &[Self]) -> Option<NativeSlice<'_>> {
                    Some(NativeSlice::$kind(data))
                }

                #[inline]
                fn native_mut(data: &mut [Self]) -> Option<NativeSliceMut<'_>> {
                    Some(NativeSliceMut::$kind(data))
                }
            }
        )*
    };
}

native_types! {
    Bool => Bool,
    u8 => Uint8,
    i8 => Int8,
    u16 => Uint16,
    i16 => Int16,
    u32 => Uint32,
    i32 => Int32,
    u64 => Uint64,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    Complex64 => Complex64,
    ComplexOp => ComplexOp;
    u8 => Text,
}
