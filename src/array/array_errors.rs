//! Array errors.

use thiserror::Error;

use crate::array_subset::{
    ArrayExtractBytesError, ArraySubset, ArrayStoreBytesError,
    IncompatibleArraySubsetAndShapeError, IncompatibleDimensionalityError,
};
use crate::storage::{StorageError, StorePrefixError};

use super::selection::SelectionError;
use super::{ArrayIndices, ArrayShape, CodecError, DataType};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// The array shape has no dimensions.
    #[error("array shape must have at least one dimension")]
    ZeroDimensional,
    /// The chunk shape does not match the array dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The chunk shape has a zero extent.
    #[error("invalid chunk shape {0:?}, all extents must be non-zero")]
    InvalidChunkShape(Vec<u64>),
    /// The fill value size does not match the data type size.
    #[error("invalid fill value of size {0} for data type {1}")]
    IncompatibleFillValue(usize, DataType),
    /// The array path is not a valid store prefix.
    #[error(transparent)]
    InvalidPath(#[from] StorePrefixError),
}

/// An array error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A selection error.
    #[error(transparent)]
    SelectionError(#[from] SelectionError),
    /// An incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// An incompatible array subset and shape.
    #[error(transparent)]
    IncompatibleArraySubsetAndShapeError(#[from] IncompatibleArraySubsetAndShapeError),
    /// An error extracting array subset bytes.
    #[error(transparent)]
    ExtractBytesError(#[from] ArrayExtractBytesError),
    /// An error storing array subset bytes.
    #[error(transparent)]
    StoreBytesError(#[from] ArrayStoreBytesError),
    /// An array subset is out of bounds of the array.
    #[error("array subset {0} is out of bounds of array shape {1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// Chunk indices are out of bounds of the chunk grid.
    #[error("invalid chunk grid indices {0:?}")]
    InvalidChunkGridIndices(ArrayIndices),
    /// A chunk subset is out of bounds of the chunk.
    #[error("invalid chunk subset {0} for chunk {1:?} with shape {2:?}")]
    InvalidChunkSubset(ArraySubset, ArrayIndices, ArrayShape),
    /// Input bytes do not match the expected length.
    #[error("invalid input size {0}, expected {1}")]
    InvalidBytesInputSize(usize, u64),
    /// An element type does not match the data type size.
    #[error("incompatible element size {0}, expected {1}")]
    IncompatibleElementSize(usize, usize),
    /// Appended data does not match the array shape along non-append axes.
    #[error("data of shape {0:?} is incompatible with array shape {1:?} along non-append axes")]
    IncompatibleAppendShape(ArrayShape, ArrayShape),
    /// An append axis is out of bounds of the array dimensionality.
    #[error("invalid append axis {0} for array dimensionality {1}")]
    InvalidAppendAxis(usize, usize),
}
