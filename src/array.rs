//! Arrays.
//!
//! An [`Array`] is a chunked, compressed, N-dimensional array of a fixed-size
//! [`DataType`] stored in a byte-addressable key-value store. The array is
//! split into a regular grid of fixed-shape chunks; each chunk is compressed
//! as a whole and stored as the value of one key under the array's key prefix.
//!
//! Use an [`ArrayBuilder`] to create an array, then the `retrieve_*`,
//! `store_*`, and `fill_*` methods to read and write elements by chunk,
//! [`ArraySubset`], or [`Selection`](selection::Selection).

mod array_builder;
mod array_errors;
mod array_readable;
mod array_readable_writable;
mod array_writable;
mod codec;
mod data_type;
mod fill_value;
pub mod selection;

use std::num::NonZeroU64;
use std::sync::Arc;

use parking_lot::RwLock;

pub use array_builder::ArrayBuilder;
pub use array_errors::{ArrayCreateError, ArrayError};
pub use codec::{
    CodecError, CodecId, CodecParams, CodecPipeline, Compressor, CompressorTraits,
    GzipCompressor, NoneCompressor, ShuffleFilter,
};
pub use data_type::DataType;
pub use fill_value::FillValue;

use crate::array_subset::ArraySubset;
use crate::storage::synchronizer::Synchronizer;
use crate::storage::{chunk_key, StoreKey, StoreKeyHandle, StorePrefix, StoreTraits};

/// An alias for `u64` array indices.
pub type ArrayIndices = Vec<u64>;

/// An alias for a `u64` array shape.
pub type ArrayShape = Vec<u64>;

/// An alias for a non-zero chunk shape.
pub type ChunkShape = Vec<NonZeroU64>;

/// A chunked, compressed, N-dimensional array.
///
/// The chunk grid is regular: chunk `[i, j, ..]` covers the array subset
/// starting at `[i, j, ..] * chunk_shape` with shape `chunk_shape`, and the
/// grid has `ceil(shape / chunk_shape)` chunks along each dimension. Chunks at
/// the trailing edge are stored full-sized; elements beyond the array shape
/// are padding.
///
/// A chunk with no stored key is uninitialized; reads answer it with the fill
/// value (or leave the region untouched if the array has none).
///
/// The shape is interior mutable so [`resize`](Array::resize) and
/// [`append`](Array::append) operate behind `&self`; all other parameters are
/// fixed at construction.
pub struct Array<TStorage: ?Sized> {
    /// The storage backend.
    storage: Arc<TStorage>,
    /// The key prefix of the array within the store.
    path: StorePrefix,
    /// The current array shape.
    shape: RwLock<ArrayShape>,
    /// The chunk shape.
    chunk_shape: ChunkShape,
    /// The element data type.
    data_type: DataType,
    /// The fill value for uninitialized chunks, if any.
    fill_value: Option<FillValue>,
    /// The codec configuration the pipeline was built from.
    codec_params: CodecParams,
    /// The compression pipeline applied to whole chunks.
    codec: CodecPipeline,
    /// An optional synchronizer guarding read-modify-writes and resizes.
    synchronizer: Option<Synchronizer>,
}

impl<TStorage: ?Sized> Array<TStorage> {
    pub(crate) fn new_internal(
        storage: Arc<TStorage>,
        path: StorePrefix,
        shape: ArrayShape,
        chunk_shape: ChunkShape,
        data_type: DataType,
        fill_value: Option<FillValue>,
        codec_params: CodecParams,
        synchronizer: Option<Synchronizer>,
    ) -> Self {
        let codec = CodecPipeline::new(&codec_params, data_type.size());
        Self {
            storage,
            path,
            shape: RwLock::new(shape),
            chunk_shape,
            data_type,
            fill_value,
            codec_params,
            codec,
            synchronizer,
        }
    }

    /// Return the key prefix of the array.
    #[must_use]
    pub fn path(&self) -> &StorePrefix {
        &self.path
    }

    /// Return the current shape of the array.
    #[must_use]
    pub fn shape(&self) -> ArrayShape {
        self.shape.read().clone()
    }

    /// Return the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.chunk_shape.len()
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// Return the chunk shape as an [`ArrayShape`].
    #[must_use]
    pub fn chunk_shape_u64(&self) -> ArrayShape {
        self.chunk_shape.iter().map(|size| size.get()).collect()
    }

    /// Return the data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the fill value, if any.
    #[must_use]
    pub fn fill_value(&self) -> Option<&FillValue> {
        self.fill_value.as_ref()
    }

    /// Return the codec configuration.
    #[must_use]
    pub fn codec_params(&self) -> &CodecParams {
        &self.codec_params
    }

    /// Return the synchronizer, if any.
    #[must_use]
    pub fn synchronizer(&self) -> Option<&Synchronizer> {
        self.synchronizer.as_ref()
    }

    pub(crate) fn codec(&self) -> &CodecPipeline {
        &self.codec
    }

    /// Return the shape of the chunk grid: `ceil(shape / chunk_shape)`.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        std::iter::zip(self.shape(), &self.chunk_shape)
            .map(|(size, chunk_size)| size.div_ceil(chunk_size.get()))
            .collect()
    }

    /// Return the store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        chunk_key(&self.path, chunk_indices)
    }

    /// Return the number of elements in one chunk.
    #[must_use]
    pub fn chunk_num_elements(&self) -> u64 {
        self.chunk_shape.iter().map(|size| size.get()).product()
    }

    /// Return the size in bytes of one decoded chunk.
    ///
    /// # Panics
    /// Panics if the size exceeds [`usize::MAX`].
    #[must_use]
    pub fn chunk_bytes_len(&self) -> usize {
        usize::try_from(self.chunk_num_elements()).unwrap() * self.data_type.size()
    }

    /// Return the array subset covered by the chunk at `chunk_indices`.
    ///
    /// The subset is the full chunk extent, which can extend beyond the array
    /// shape for chunks at the trailing edge.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` is
    /// not within the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        let grid_shape = self.chunk_grid_shape();
        if chunk_indices.len() != grid_shape.len()
            || std::iter::zip(chunk_indices, &grid_shape).any(|(index, size)| index >= size)
        {
            return Err(ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()));
        }
        let start = std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(&index, size)| index * size.get())
            .collect();
        Ok(ArraySubset::new_with_start_shape(start, self.chunk_shape_u64())?)
    }

    /// Return the array subset covered by the chunk at `chunk_indices`,
    /// bounded by the array shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` is
    /// not within the chunk grid.
    pub fn chunk_subset_bounded(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        let chunk_subset = self.chunk_subset(chunk_indices)?;
        Ok(chunk_subset.bound(&self.shape())?)
    }

    /// Return a per-key store view of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_handle(&self, chunk_indices: &[u64]) -> StoreKeyHandle<TStorage>
    where
        TStorage: StoreTraits,
    {
        StoreKeyHandle::new(self.storage.clone(), self.chunk_key(chunk_indices))
    }

    /// Return the decoded bytes of an uninitialized chunk: the fill value
    /// repeated, or zeroes if the array has no fill value.
    #[must_use]
    pub(crate) fn fill_chunk_bytes(&self) -> Vec<u8> {
        match &self.fill_value {
            Some(fill_value) => fill_value
                .as_ne_bytes()
                .repeat(usize::try_from(self.chunk_num_elements()).unwrap()),
            None => vec![0; self.chunk_bytes_len()],
        }
    }

    pub(crate) fn validate_element_size<T: bytemuck::Pod>(&self) -> Result<(), ArrayError> {
        if std::mem::size_of::<T>() == self.data_type.size() {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementSize(
                std::mem::size_of::<T>(),
                self.data_type.size(),
            ))
        }
    }
}

/// Convert multidimensional `indices` in an array of shape `array_shape` to a
/// linearised row-major index.
#[must_use]
pub fn ravel_indices(indices: &[u64], array_shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    for (&subset_index, &array_size) in std::iter::zip(indices, array_shape) {
        index = index * array_size + subset_index;
    }
    index
}

#[cfg(test)]
mod tests {
    use crate::storage::store::MemoryStore;

    use super::*;

    #[test]
    fn ravel() {
        assert_eq!(ravel_indices(&[1, 1], &[4, 4]), 5);
        assert_eq!(ravel_indices(&[2, 1], &[4, 4]), 9);
        assert_eq!(ravel_indices(&[0, 0, 0], &[2, 2, 2]), 0);
        assert_eq!(ravel_indices(&[1, 1, 1], &[2, 2, 2]), 7);
    }

    #[test]
    fn array_chunk_grid() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(vec![10, 7], DataType::UInt8, vec![5, 4])
            .build(store, "array")
            .unwrap();
        assert_eq!(array.dimensionality(), 2);
        assert_eq!(array.chunk_grid_shape(), vec![2, 2]);
        assert_eq!(array.chunk_num_elements(), 20);
        assert_eq!(array.chunk_bytes_len(), 20);
        assert_eq!(
            array.chunk_key(&[1, 0]),
            StoreKey::new("array/1.0").unwrap()
        );
        assert_eq!(
            array.chunk_subset(&[1, 1]).unwrap(),
            ArraySubset::new_with_ranges(&[5..10, 4..8])
        );
        assert_eq!(
            array.chunk_subset_bounded(&[1, 1]).unwrap(),
            ArraySubset::new_with_ranges(&[5..10, 4..7])
        );
        assert!(array.chunk_subset(&[2, 0]).is_err());
        assert!(array.chunk_subset(&[0]).is_err());
    }
}
