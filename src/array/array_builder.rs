//! Array builders.

use std::num::NonZeroU64;
use std::sync::Arc;

use crate::storage::synchronizer::Synchronizer;
use crate::storage::StorePrefix;

use super::{Array, ArrayCreateError, ArrayShape, CodecParams, DataType, FillValue};

/// An [`Array`] builder.
///
/// The shape, data type, and chunk shape are required; the fill value, codec
/// configuration, and synchronizer are optional. The array parameters are held
/// in process; persisting them is the caller's concern.
///
/// ```
/// # use std::sync::Arc;
/// # use ndstore::array::{ArrayBuilder, CodecParams, DataType, FillValue};
/// # use ndstore::storage::store::MemoryStore;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let array = ArrayBuilder::new(vec![8, 8], DataType::Float32, vec![4, 4])
///     .fill_value(FillValue::from(f32::NAN))
///     .codec(CodecParams::gzip(5)?)
///     .build(Arc::new(MemoryStore::new()), "group/array")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ArrayBuilder {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: Vec<u64>,
    fill_value: Option<FillValue>,
    codec: CodecParams,
    synchronizer: Option<Synchronizer>,
}

impl ArrayBuilder {
    /// Create a new array builder for an array with `shape`, `data_type`, and
    /// `chunk_shape`.
    #[must_use]
    pub fn new(shape: ArrayShape, data_type: DataType, chunk_shape: Vec<u64>) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape,
            fill_value: None,
            codec: CodecParams::none(),
            synchronizer: None,
        }
    }

    /// Set the fill value answering reads of uninitialized chunks.
    pub fn fill_value(&mut self, fill_value: FillValue) -> &mut Self {
        self.fill_value = Some(fill_value);
        self
    }

    /// Set the codec configuration. The default is no compression.
    pub fn codec(&mut self, codec: CodecParams) -> &mut Self {
        self.codec = codec;
        self
    }

    /// Set the synchronizer guarding read-modify-writes and resizes.
    pub fn synchronizer(&mut self, synchronizer: Synchronizer) -> &mut Self {
        self.synchronizer = Some(synchronizer);
        self
    }

    /// Build the array on `storage` at key prefix `path`.
    ///
    /// `path` is relative to the store root, without a trailing `/` (a leading
    /// `/` is accepted and stripped); an empty path places chunks at the store
    /// root.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if:
    /// - the shape is zero-dimensional,
    /// - the chunk shape does not match the array dimensionality or has a zero extent,
    /// - the fill value size does not match the data type size, or
    /// - `path` is not a valid key prefix.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        if self.shape.is_empty() {
            return Err(ArrayCreateError::ZeroDimensional);
        }
        if self.chunk_shape.len() != self.shape.len() {
            return Err(ArrayCreateError::IncompatibleDimensionality(
                crate::array_subset::IncompatibleDimensionalityError::new(
                    self.chunk_shape.len(),
                    self.shape.len(),
                ),
            ));
        }
        let chunk_shape = self
            .chunk_shape
            .iter()
            .map(|&size| NonZeroU64::new(size))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ArrayCreateError::InvalidChunkShape(self.chunk_shape.clone()))?;
        if let Some(fill_value) = &self.fill_value {
            if fill_value.size() != self.data_type.size() {
                return Err(ArrayCreateError::IncompatibleFillValue(
                    fill_value.size(),
                    self.data_type,
                ));
            }
        }
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = if path.is_empty() {
            StorePrefix::root()
        } else {
            StorePrefix::new(format!("{path}/"))?
        };
        Ok(Array::new_internal(
            storage,
            path,
            self.shape.clone(),
            chunk_shape,
            self.data_type,
            self.fill_value.clone(),
            self.codec,
            self.synchronizer.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::store::MemoryStore;

    use super::*;

    #[test]
    fn array_builder_valid() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(vec![8, 8], DataType::UInt16, vec![4, 4])
            .fill_value(FillValue::from(0u16))
            .build(store, "/group/array")
            .unwrap();
        assert_eq!(array.path().as_str(), "group/array/");
        assert_eq!(array.shape(), vec![8, 8]);
        assert_eq!(array.data_type(), DataType::UInt16);
    }

    #[test]
    fn array_builder_invalid() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            ArrayBuilder::new(vec![], DataType::UInt8, vec![]).build(store.clone(), ""),
            Err(ArrayCreateError::ZeroDimensional)
        ));
        assert!(matches!(
            ArrayBuilder::new(vec![8, 8], DataType::UInt8, vec![4]).build(store.clone(), ""),
            Err(ArrayCreateError::IncompatibleDimensionality(_))
        ));
        assert!(matches!(
            ArrayBuilder::new(vec![8, 8], DataType::UInt8, vec![4, 0]).build(store.clone(), ""),
            Err(ArrayCreateError::InvalidChunkShape(_))
        ));
        assert!(matches!(
            ArrayBuilder::new(vec![8], DataType::UInt16, vec![4])
                .fill_value(FillValue::from(0u8))
                .build(store.clone(), ""),
            Err(ArrayCreateError::IncompatibleFillValue(..))
        ));
        assert!(ArrayBuilder::new(vec![8], DataType::UInt8, vec![4])
            .build(store, "bad//path")
            .is_err());
    }
}
