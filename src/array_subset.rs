//! Array subsets.
//!
//! An [`ArraySubset`] is a start and a shape, representing an axis-aligned
//! region of an array. Subsets support intersection ([`ArraySubset::overlap`]),
//! rebasing ([`ArraySubset::relative_to`]), clamping ([`ArraySubset::bound`]),
//! extraction and storage of their elements from/into a flattened row-major
//! array, and iteration over indices, contiguous runs, and intersecting chunks.

pub mod iterators;

use std::num::NonZeroU64;
use std::ops::Range;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayIndices, ArrayShape};

use iterators::{ChunksIterator, ContiguousLinearisedIndicesIterator, IndicesIterator};

/// An array subset.
///
/// The subset starts at `start` and has `shape` elements along each dimension.
#[derive(Clone, Debug, Default, Eq, PartialEq, Display)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

impl ArraySubset {
    /// Create a new array subset at the origin with shape `shape`.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset from a list of per-dimension ranges.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        Self {
            start: ranges.iter().map(|range| range.start).collect(),
            shape: ranges
                .iter()
                .map(|range| range.end.saturating_sub(range.start))
                .collect(),
        }
    }

    /// Create a new array subset with `start` and `shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError(shape.len(), start.len()))
        }
    }

    /// Create a new array subset from `start` to `end` (inclusive).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `end` do not match.
    pub fn new_with_start_end_inc(
        start: ArrayIndices,
        end: &[u64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == end.len() {
            let shape = std::iter::zip(&start, end)
                .map(|(&start, &end)| (end + 1).saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError(end.len(), start.len()))
        }
    }

    /// Create a new array subset from `start` to `end` (exclusive).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `end` do not match.
    pub fn new_with_start_end_exc(
        start: ArrayIndices,
        end: &[u64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == end.len() {
            let shape = std::iter::zip(&start, end)
                .map(|(&start, &end)| end.saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError(end.len(), start.len()))
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the end (exclusive) of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start + size)
            .collect()
    }

    /// Return the end (inclusive) of the array subset.
    ///
    /// # Panics
    /// Panics if the subset is empty along any dimension.
    #[must_use]
    pub fn end_inc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start + size - 1)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a [`usize`].
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Return `true` if the array subset has zero elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Return `true` if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && izip!(self.end_exc(), array_shape).all(|(end, &size)| end <= size)
    }

    /// Bound the array subset to the domain within `end` (exclusive).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `end` does not match the array subset dimensionality.
    pub fn bound(&self, end: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if end.len() == self.dimensionality() {
            let start = std::iter::zip(self.start(), end)
                .map(|(&start, &end)| std::cmp::min(start, end))
                .collect();
            let end = std::iter::zip(self.end_exc(), end)
                .map(|(end_subset, &end)| std::cmp::min(end_subset, end))
                .collect::<Vec<_>>();
            Self::new_with_start_end_exc(start, &end)
        } else {
            Err(IncompatibleDimensionalityError(
                end.len(),
                self.dimensionality(),
            ))
        }
    }

    /// Return the overlapping region (intersection) of this array subset and `other`.
    ///
    /// The returned subset is in the same (absolute) coordinate system and is
    /// empty if the subsets are disjoint.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `other` does not match.
    pub fn overlap(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if other.dimensionality() == self.dimensionality() {
            let start = std::iter::zip(self.start(), other.start())
                .map(|(&a, &b)| std::cmp::max(a, b))
                .collect();
            let end = std::iter::zip(self.end_exc(), other.end_exc())
                .map(|(a, b)| std::cmp::min(a, b))
                .collect::<Vec<_>>();
            Self::new_with_start_end_exc(start, &end)
        } else {
            Err(IncompatibleDimensionalityError(
                other.dimensionality(),
                self.dimensionality(),
            ))
        }
    }

    /// Return this array subset relative to an origin at `start`.
    ///
    /// The caller must ensure the array subset does not precede `start` along
    /// any dimension; preceding components saturate to zero.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `start` does not match the array subset dimensionality.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == self.dimensionality() {
            Ok(Self {
                start: std::iter::zip(self.start(), start)
                    .map(|(&a, &b)| a.saturating_sub(b))
                    .collect(),
                shape: self.shape.clone(),
            })
        } else {
            Err(IncompatibleDimensionalityError(
                start.len(),
                self.dimensionality(),
            ))
        }
    }

    /// Return an iterator over the indices of elements within the subset.
    #[must_use]
    pub fn indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }

    /// Return an iterator over the linearised indices and lengths of contiguous
    /// element runs within the subset, for an array of shape `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if the array subset is out of bounds of `array_shape`.
    pub fn contiguous_linearised_indices<'a>(
        &self,
        array_shape: &'a [u64],
    ) -> Result<ContiguousLinearisedIndicesIterator<'a>, IncompatibleArraySubsetAndShapeError>
    {
        ContiguousLinearisedIndicesIterator::new(self, array_shape)
    }

    /// Return an iterator over the chunks with shape `chunk_shape` intersecting
    /// the subset, in row-major order.
    ///
    /// Yields `(chunk_indices, chunk_subset)` pairs, where `chunk_subset` is
    /// the full extent of the chunk in the array coordinate system.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_shape` does not match the array subset dimensionality.
    pub fn chunks(
        &self,
        chunk_shape: &[NonZeroU64],
    ) -> Result<ChunksIterator, IncompatibleDimensionalityError> {
        ChunksIterator::new(self, chunk_shape)
    }

    /// Extract the bytes of this array subset from the flattened row-major
    /// `bytes` of an array with shape `array_shape` and `element_size` bytes
    /// per element.
    ///
    /// # Errors
    /// Returns [`ArrayExtractBytesError`] if the length of `bytes` does not
    /// match `array_shape` and `element_size`, or the array subset is out of
    /// bounds of `array_shape`.
    ///
    /// # Panics
    /// Panics if a byte offset within the array exceeds [`usize::MAX`].
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<u8>, ArrayExtractBytesError> {
        let element_size_u64 = element_size as u64;
        let expected_len = array_shape.iter().product::<u64>() * element_size_u64;
        if bytes.len() as u64 != expected_len {
            return Err(ArrayExtractBytesError(
                self.clone(),
                array_shape.to_vec(),
                element_size,
            ));
        }
        let contiguous_indices = self.contiguous_linearised_indices(array_shape).map_err(
            |_| ArrayExtractBytesError(self.clone(), array_shape.to_vec(), element_size),
        )?;
        let mut bytes_subset = Vec::with_capacity(self.num_elements_usize() * element_size);
        for (array_index, contiguous_elements) in contiguous_indices {
            let offset = usize::try_from(array_index * element_size_u64).unwrap();
            let length = usize::try_from(contiguous_elements * element_size_u64).unwrap();
            bytes_subset.extend_from_slice(&bytes[offset..offset + length]);
        }
        Ok(bytes_subset)
    }

    /// Store `bytes_subset` at the position of this array subset in the
    /// flattened row-major `bytes` of an array with shape `array_shape`.
    ///
    /// # Errors
    /// Returns [`ArrayStoreBytesError`] if the length of `bytes` or
    /// `bytes_subset` is incompatible with `array_shape`, the subset shape, and
    /// `element_size`, or the array subset is out of bounds of `array_shape`.
    ///
    /// # Panics
    /// Panics if a byte offset within the array exceeds [`usize::MAX`].
    pub fn store_bytes(
        &self,
        bytes_subset: &[u8],
        bytes: &mut [u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<(), ArrayStoreBytesError> {
        let element_size_u64 = element_size as u64;
        let expected_len = array_shape.iter().product::<u64>() * element_size_u64;
        let expected_subset_len = self.num_elements() * element_size_u64;
        if bytes.len() as u64 != expected_len || bytes_subset.len() as u64 != expected_subset_len {
            return Err(ArrayStoreBytesError(
                self.clone(),
                array_shape.to_vec(),
                element_size,
            ));
        }
        let contiguous_indices = self.contiguous_linearised_indices(array_shape).map_err(
            |_| ArrayStoreBytesError(self.clone(), array_shape.to_vec(), element_size),
        )?;
        let mut offset_subset = 0;
        for (array_index, contiguous_elements) in contiguous_indices {
            let offset = usize::try_from(array_index * element_size_u64).unwrap();
            let length = usize::try_from(contiguous_elements * element_size_u64).unwrap();
            bytes[offset..offset + length]
                .copy_from_slice(&bytes_subset[offset_subset..offset_subset + length]);
            offset_subset += length;
        }
        Ok(())
    }

    /// Fill the position of this array subset in the flattened row-major
    /// `bytes` of an array with shape `array_shape` with copies of `element`.
    ///
    /// # Errors
    /// Returns [`ArrayStoreBytesError`] if the length of `bytes` is
    /// incompatible with `array_shape` and the element size, or the array
    /// subset is out of bounds of `array_shape`.
    ///
    /// # Panics
    /// Panics if a byte offset within the array exceeds [`usize::MAX`].
    pub fn fill_bytes(
        &self,
        element: &[u8],
        bytes: &mut [u8],
        array_shape: &[u64],
    ) -> Result<(), ArrayStoreBytesError> {
        let element_size = element.len();
        let element_size_u64 = element_size as u64;
        let expected_len = array_shape.iter().product::<u64>() * element_size_u64;
        if bytes.len() as u64 != expected_len {
            return Err(ArrayStoreBytesError(
                self.clone(),
                array_shape.to_vec(),
                element_size,
            ));
        }
        let contiguous_indices = self.contiguous_linearised_indices(array_shape).map_err(
            |_| ArrayStoreBytesError(self.clone(), array_shape.to_vec(), element_size),
        )?;
        for (array_index, contiguous_elements) in contiguous_indices {
            let offset = usize::try_from(array_index * element_size_u64).unwrap();
            for i in 0..usize::try_from(contiguous_elements).unwrap() {
                bytes[offset + i * element_size..offset + (i + 1) * element_size]
                    .copy_from_slice(element);
            }
        }
        Ok(())
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new [`IncompatibleDimensionalityError`] with `got` dimensionality, expected `expected`.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An incompatible array subset and array shape error.
#[derive(Clone, Debug, Error)]
#[error("array subset {0} is incompatible with array of shape {1:?}")]
pub struct IncompatibleArraySubsetAndShapeError(ArraySubset, ArrayShape);

impl IncompatibleArraySubsetAndShapeError {
    /// Create a new [`IncompatibleArraySubsetAndShapeError`].
    #[must_use]
    pub const fn new(array_subset: ArraySubset, array_shape: ArrayShape) -> Self {
        Self(array_subset, array_shape)
    }
}

/// An error extracting the bytes of an array subset from a flattened array.
#[derive(Clone, Debug, Error)]
#[error("array subset {0} is incompatible with array of shape {1:?} and element size {2}")]
pub struct ArrayExtractBytesError(ArraySubset, ArrayShape, usize);

/// An error storing the bytes of an array subset into a flattened array.
#[derive(Clone, Debug, Error)]
#[error("array subset {0} is incompatible with array of shape {1:?} and element size {2}")]
pub struct ArrayStoreBytesError(ArraySubset, ArrayShape, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_constructors() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 2..6]);
        assert_eq!(subset.start(), &[1, 2]);
        assert_eq!(subset.shape(), &[2, 4]);
        assert_eq!(subset.end_exc(), vec![3, 6]);
        assert_eq!(subset.end_inc(), vec![2, 5]);
        assert_eq!(subset.num_elements(), 8);
        assert!(!subset.is_empty());
        assert_eq!(
            subset,
            ArraySubset::new_with_start_shape(vec![1, 2], vec![2, 4]).unwrap()
        );
        assert_eq!(
            subset,
            ArraySubset::new_with_start_end_inc(vec![1, 2], &[2, 5]).unwrap()
        );
        assert!(ArraySubset::new_with_start_shape(vec![1], vec![2, 4]).is_err());
        assert!(ArraySubset::new_with_ranges(&[3..3]).is_empty());
    }

    #[test]
    fn array_subset_inbounds() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 2..6]);
        assert!(subset.inbounds(&[3, 6]));
        assert!(subset.inbounds(&[4, 7]));
        assert!(!subset.inbounds(&[3, 5]));
        assert!(!subset.inbounds(&[3, 6, 6]));
    }

    #[test]
    fn array_subset_bound() {
        let subset = ArraySubset::new_with_ranges(&[1..5, 2..6]);
        assert_eq!(
            subset.bound(&[3, 3]).unwrap(),
            ArraySubset::new_with_ranges(&[1..3, 2..3])
        );
        assert!(subset.bound(&[3]).is_err());
    }

    #[test]
    fn array_subset_overlap() {
        let subset = ArraySubset::new_with_ranges(&[1..5, 2..6]);
        let other = ArraySubset::new_with_ranges(&[3..7, 0..4]);
        assert_eq!(
            subset.overlap(&other).unwrap(),
            ArraySubset::new_with_ranges(&[3..5, 2..4])
        );
        let disjoint = ArraySubset::new_with_ranges(&[6..8, 0..4]);
        assert!(subset.overlap(&disjoint).unwrap().is_empty());
        assert!(subset.overlap(&ArraySubset::new_with_shape(vec![1])).is_err());
    }

    #[test]
    fn array_subset_relative_to() {
        let subset = ArraySubset::new_with_ranges(&[3..5, 2..4]);
        assert_eq!(
            subset.relative_to(&[1, 2]).unwrap(),
            ArraySubset::new_with_ranges(&[2..4, 0..2])
        );
        assert!(subset.relative_to(&[1]).is_err());
    }

    #[test]
    fn array_subset_extract_bytes() {
        // 0 1 2
        // 3 4 5
        let bytes: Vec<u8> = (0..6).collect();
        let subset = ArraySubset::new_with_ranges(&[0..2, 1..3]);
        assert_eq!(
            subset.extract_bytes(&bytes, &[2, 3], 1).unwrap(),
            vec![1, 2, 4, 5]
        );
        assert!(subset.extract_bytes(&bytes, &[2, 2], 1).is_err());
    }

    #[test]
    fn array_subset_store_bytes() {
        let mut bytes: Vec<u8> = vec![0; 6];
        let subset = ArraySubset::new_with_ranges(&[0..2, 1..3]);
        subset
            .store_bytes(&[1, 2, 4, 5], &mut bytes, &[2, 3], 1)
            .unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 0, 4, 5]);
        assert!(subset.store_bytes(&[1, 2], &mut bytes, &[2, 3], 1).is_err());
    }

    #[test]
    fn array_subset_fill_bytes() {
        let mut bytes: Vec<u8> = vec![0; 6];
        let subset = ArraySubset::new_with_ranges(&[0..2, 1..3]);
        subset.fill_bytes(&[9], &mut bytes, &[2, 3]).unwrap();
        assert_eq!(bytes, vec![0, 9, 9, 0, 9, 9]);
    }
}
