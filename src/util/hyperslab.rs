//! Hyperslabs - rectangular sub-regions of a stored array.

use smallvec::SmallVec;

use super::dimensions::point_count;
use super::{Dimensions, Error, Result};

/// Rectangular region of an array, given by per-dimension offset and chunk extent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hyperslab {
    offset: SmallVec<[usize; 4]>,
    chunk: SmallVec<[usize; 4]>,
}

impl Hyperslab {
    /// Create a hyperslab from offset and chunk extent.
    pub fn new(offset: &[usize], chunk: &[usize]) -> Self {
        Self {
            offset: SmallVec::from_slice(offset),
            chunk: SmallVec::from_slice(chunk),
        }
    }

    /// Create a hyperslab starting at the origin.
    pub fn at_origin(chunk: &[usize]) -> Self {
        Self {
            offset: smallvec::smallvec![0; chunk.len()],
            chunk: SmallVec::from_slice(chunk),
        }
    }

    /// Hyperslab covering a whole array.
    pub fn whole(shape: &Dimensions) -> Self {
        Self::at_origin(shape.sizes())
    }

    #[inline]
    pub fn offset(&self) -> &[usize] {
        &self.offset
    }

    #[inline]
    pub fn chunk(&self) -> &[usize] {
        &self.chunk
    }

    /// Number of elements inside the region.
    ///
    /// Saturates at `usize::MAX`; a region that passed [`check`](Self::check)
    /// never does.
    pub fn num_points(&self) -> usize {
        point_count(&self.chunk).unwrap_or(usize::MAX)
    }

    /// Check that the region lies inside `shape` and that `shape` itself is
    /// addressable.
    pub fn check(&self, shape: &Dimensions, path: &str) -> Result<()> {
        if shape.checked_num_points().is_none() {
            return Err(Error::range(format!("{}: extent {} is too large", path, shape)));
        }
        if self.offset.len() != self.chunk.len() {
            return Err(Error::range(format!(
                "{}: offset rank {} does not match chunk rank {}",
                path,
                self.offset.len(),
                self.chunk.len()
            )));
        }
        if self.chunk.len() != shape.rank() {
            return Err(Error::range(format!(
                "{}: chunk rank {} does not match extent {}",
                path,
                self.chunk.len(),
                shape
            )));
        }
        for (dim, ((&offset, &chunk), &extent)) in self
            .offset
            .iter()
            .zip(&self.chunk)
            .zip(shape.sizes())
            .enumerate()
        {
            let end = offset.checked_add(chunk);
            if end.map_or(true, |end| end > extent) {
                return Err(Error::range(format!(
                    "{}: chunk {} at offset {} exceeds extent {} in dimension {}",
                    path, chunk, offset, extent, dim
                )));
            }
        }
        Ok(())
    }

    /// Visit the contiguous runs of the region inside an array of `shape`.
    ///
    /// Calls `f(array_index, chunk_index, len)` with element indices into the
    /// full array and into the packed chunk buffer. The region must have passed
    /// [`check`](Self::check) against `shape`.
    pub fn for_each_run(&self, shape: &Dimensions, mut f: impl FnMut(usize, usize, usize)) {
        let rank = self.chunk.len();
        if rank == 0 {
            f(0, 0, 1);
            return;
        }
        if self.num_points() == 0 {
            return;
        }

        let strides = shape.strides();
        let inner = self.chunk[rank - 1];
        let outer = &self.chunk[..rank - 1];
        let runs: usize = outer.iter().product();
        let mut index: SmallVec<[usize; 4]> = smallvec::smallvec![0; rank - 1];

        for run in 0..runs {
            let base: usize = index
                .iter()
                .enumerate()
                .map(|(d, &i)| (self.offset[d] + i) * strides[d])
                .sum();
            f(base + self.offset[rank - 1], run * inner, inner);

            // Odometer increment over the outer dimensions.
            for d in (0..rank - 1).rev() {
                index[d] += 1;
                if index[d] < outer[d] {
                    break;
                }
                index[d] = 0;
            }
        }
    }
}
