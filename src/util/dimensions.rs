//! Multi-dimensional array shapes.
//!
//! Dimensions describe the shape of a stored dataset.

use smallvec::SmallVec;

/// Dimensions of a multi-dimensional array.
///
/// An empty shape (rank 0) is a scalar. Data is laid out row-major: the last
/// dimension varies fastest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Size of each dimension. Empty means scalar (rank 0).
    dims: SmallVec<[usize; 4]>,
}

impl Dimensions {
    /// Create scalar dimensions (rank 0).
    pub fn scalar() -> Self {
        Self { dims: SmallVec::new() }
    }

    /// Create 1D dimensions.
    pub fn d1(size: usize) -> Self {
        Self { dims: smallvec::smallvec![size] }
    }

    /// Create 2D dimensions.
    pub fn d2(rows: usize, cols: usize) -> Self {
        Self { dims: smallvec::smallvec![rows, cols] }
    }

    /// Create from a slice of sizes.
    pub fn from_slice(sizes: &[usize]) -> Self {
        Self { dims: SmallVec::from_slice(sizes) }
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Get the size of a specific dimension.
    pub fn size(&self, dim: usize) -> Option<usize> {
        self.dims.get(dim).copied()
    }

    /// Get all dimension sizes as a slice.
    pub fn sizes(&self) -> &[usize] {
        &self.dims
    }

    /// Get the total number of elements (product of all dimensions).
    ///
    /// Saturates at `usize::MAX`; use [`checked_num_points`](Self::checked_num_points)
    /// for shapes that have not been validated.
    pub fn num_points(&self) -> usize {
        self.checked_num_points().unwrap_or(usize::MAX)
    }

    /// Total number of elements, or None if it does not fit in `usize`.
    pub fn checked_num_points(&self) -> Option<usize> {
        point_count(&self.dims)
    }

    /// Size in bytes of the array with elements of `element_size` bytes.
    pub fn checked_num_bytes(&self, element_size: usize) -> Option<usize> {
        self.checked_num_points()?.checked_mul(element_size)
    }

    /// Check if this represents a scalar (rank 0).
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Element strides for row-major layout.
    pub fn strides(&self) -> SmallVec<[usize; 4]> {
        let mut strides: SmallVec<[usize; 4]> = smallvec::smallvec![1; self.dims.len()];
        for d in (0..self.dims.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * self.dims[d + 1];
        }
        strides
    }
}

/// Product of `sizes`, or None on overflow. Any zero size makes it 0.
pub(crate) fn point_count(sizes: &[usize]) -> Option<usize> {
    if sizes.contains(&0) {
        return Some(0);
    }
    sizes.iter().try_fold(1usize, |acc, &size| acc.checked_mul(size))
}

impl From<usize> for Dimensions {
    fn from(size: usize) -> Self {
        Self::d1(size)
    }
}

impl From<(usize, usize)> for Dimensions {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::d2(rows, cols)
    }
}

impl From<Vec<usize>> for Dimensions {
    fn from(v: Vec<usize>) -> Self {
        Self { dims: SmallVec::from_vec(v) }
    }
}

impl From<&[usize]> for Dimensions {
    fn from(v: &[usize]) -> Self {
        Self::from_slice(v)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.dims.is_empty() {
            write!(f, "[]")
        } else {
            write!(f, "[")?;
            for (i, s) in self.dims.iter().enumerate() {
                if i > 0 {
                    write!(f, " x ")?;
                }
                write!(f, "{}", s)?;
            }
            write!(f, "]")
        }
    }
}
