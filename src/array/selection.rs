//! Array selections.
//!
//! A [`Selection`] is the user-facing index expression: one
//! [`DimSelection`] per dimension, normalized against an array shape into an
//! [`ArraySubset`] before reaching the chunk engine. Trailing omitted
//! dimensions select the whole axis.

use std::ops::{Range, RangeFull};

use thiserror::Error;

use crate::array_subset::ArraySubset;

/// A selection along one dimension.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DimSelection {
    /// A single index. Out of bounds indices are an error. The selected
    /// extent is 1; dimensions are not squeezed.
    Index(u64),
    /// A range of indices, clipped to the dimension size.
    Range(Range<u64>),
    /// The whole dimension.
    Full,
}

impl From<u64> for DimSelection {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<Range<u64>> for DimSelection {
    fn from(range: Range<u64>) -> Self {
        Self::Range(range)
    }
}

impl From<RangeFull> for DimSelection {
    fn from(_: RangeFull) -> Self {
        Self::Full
    }
}

/// A selection: one [`DimSelection`] per dimension.
///
/// Descending and strided selections are unrepresentable by construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Selection(Vec<DimSelection>);

impl Selection {
    /// Create a new selection.
    #[must_use]
    pub fn new(dims: Vec<DimSelection>) -> Self {
        Self(dims)
    }

    /// Create a selection of an entire array.
    #[must_use]
    pub fn all() -> Self {
        Self(Vec::new())
    }

    /// Return the per-dimension selections.
    #[must_use]
    pub fn dims(&self) -> &[DimSelection] {
        &self.0
    }

    /// Normalize the selection against `array_shape` into an [`ArraySubset`]:
    /// - [`DimSelection::Index`] selects one element and must be in bounds,
    /// - [`DimSelection::Range`] is clipped to the dimension (an inverted
    ///   range selects nothing),
    /// - [`DimSelection::Full`] and trailing omitted dimensions select the
    ///   whole axis.
    ///
    /// # Errors
    /// Returns a [`SelectionError`] if the selection has more dimensions than
    /// `array_shape` or an index is out of bounds.
    pub fn normalize(&self, array_shape: &[u64]) -> Result<ArraySubset, SelectionError> {
        if self.0.len() > array_shape.len() {
            return Err(SelectionError::TooManyDimensions(
                self.0.len(),
                array_shape.len(),
            ));
        }
        let mut ranges = Vec::with_capacity(array_shape.len());
        for (dim, &size) in array_shape.iter().enumerate() {
            let range = match self.0.get(dim) {
                Some(DimSelection::Index(index)) => {
                    if *index >= size {
                        return Err(SelectionError::IndexOutOfBounds(*index, size));
                    }
                    *index..index + 1
                }
                Some(DimSelection::Range(range)) => {
                    let start = std::cmp::min(range.start, size);
                    let end = std::cmp::min(range.end, size);
                    start..std::cmp::max(start, end)
                }
                Some(DimSelection::Full) | None => 0..size,
            };
            ranges.push(range);
        }
        Ok(ArraySubset::new_with_ranges(&ranges))
    }
}

impl<TDim: Into<DimSelection>> FromIterator<TDim> for Selection {
    fn from_iter<TIter: IntoIterator<Item = TDim>>(iter: TIter) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A selection error.
#[derive(Copy, Clone, Debug, Error)]
pub enum SelectionError {
    /// An index selection is out of bounds of its dimension.
    #[error("index {0} is out of bounds for dimension of size {1}")]
    IndexOutOfBounds(u64, u64),
    /// The selection has more dimensions than the array.
    #[error("selection has {0} dimensions, array has {1}")]
    TooManyDimensions(usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_normalize() {
        let shape = vec![10, 20];

        let selection: Selection = [DimSelection::from(2u64), DimSelection::from(3u64..7)]
            .into_iter()
            .collect();
        assert_eq!(
            selection.normalize(&shape).unwrap(),
            ArraySubset::new_with_ranges(&[2..3, 3..7])
        );

        // trailing omitted dimensions are full
        let selection = Selection::new(vec![DimSelection::Range(1..4)]);
        assert_eq!(
            selection.normalize(&shape).unwrap(),
            ArraySubset::new_with_ranges(&[1..4, 0..20])
        );
        assert_eq!(
            Selection::all().normalize(&shape).unwrap(),
            ArraySubset::new_with_ranges(&[0..10, 0..20])
        );
    }

    #[test]
    fn selection_clipping() {
        let shape = vec![10];
        let selection = Selection::new(vec![DimSelection::Range(5..100)]);
        assert_eq!(
            selection.normalize(&shape).unwrap(),
            ArraySubset::new_with_ranges(&[5..10])
        );
        // inverted range selects nothing
        #[allow(clippy::reversed_empty_ranges)]
        let selection = Selection::new(vec![DimSelection::Range(7..3)]);
        assert!(selection.normalize(&shape).unwrap().is_empty());
    }

    #[test]
    fn selection_errors() {
        let shape = vec![10];
        assert!(matches!(
            Selection::new(vec![DimSelection::Index(10)]).normalize(&shape),
            Err(SelectionError::IndexOutOfBounds(10, 10))
        ));
        assert!(matches!(
            Selection::new(vec![DimSelection::Full, DimSelection::Full]).normalize(&shape),
            Err(SelectionError::TooManyDimensions(2, 1))
        ));
    }
}
