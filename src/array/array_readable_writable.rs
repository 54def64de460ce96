//! The chunk engine read-modify-write path, scalar fills, resize, and append.

use futures::{StreamExt, TryStreamExt};

use crate::array_subset::{ArraySubset, IncompatibleDimensionalityError};
use crate::storage::StoreTraits;

use super::selection::Selection;
use super::{Array, ArrayError, ArrayShape, FillValue};

impl<TStorage: ?Sized + StoreTraits> Array<TStorage> {
    /// Store `chunk_subset_bytes` at `chunk_subset` of the chunk at
    /// `chunk_indices`. The chunk subset is relative to the chunk origin.
    ///
    /// A write covering the whole chunk skips the read; otherwise the chunk is
    /// read (or filled, if uninitialized), mutated, and re-stored as one
    /// complete compressed blob. If the array has a synchronizer, the whole
    /// write runs under the chunk mutex.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` or `chunk_subset` is
    /// invalid, the length of `chunk_subset_bytes` does not match
    /// `chunk_subset`, or the retrieval or store fails.
    pub async fn store_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        self.chunk_subset(chunk_indices)?;
        let chunk_shape = self.chunk_shape_u64();
        if !chunk_subset.inbounds(&chunk_shape) {
            return Err(ArrayError::InvalidChunkSubset(
                chunk_subset.clone(),
                chunk_indices.to_vec(),
                chunk_shape,
            ));
        }
        let element_size = self.data_type().size();
        let expected_len = chunk_subset.num_elements() * element_size as u64;
        if chunk_subset_bytes.len() as u64 != expected_len {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_subset_bytes.len(),
                expected_len,
            ));
        }

        let mutex = match self.synchronizer() {
            Some(synchronizer) => Some(synchronizer.chunk_mutex(chunk_indices).await),
            None => None,
        };
        let _guard = match &mutex {
            Some(mutex) => Some(mutex.lock().await),
            None => None,
        };
        if chunk_subset.start().iter().all(|&start| start == 0)
            && chunk_subset.shape() == chunk_shape
        {
            // the subset spans the whole chunk, no read needed
            self.store_chunk_unlocked(chunk_indices, chunk_subset_bytes)
                .await
        } else {
            let mut chunk_bytes = self.retrieve_chunk(chunk_indices).await?;
            chunk_subset.store_bytes(
                &chunk_subset_bytes,
                &mut chunk_bytes,
                &chunk_shape,
                element_size,
            )?;
            self.store_chunk_unlocked(chunk_indices, chunk_bytes).await
        }
    }

    /// Fill `chunk_subset` of the chunk at `chunk_indices` with `element`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `element` does not match the
    /// data type size, `chunk_indices` or `chunk_subset` is invalid, or the
    /// retrieval or store fails.
    ///
    /// # Panics
    /// Panics if the chunk size in bytes exceeds [`usize::MAX`].
    pub async fn fill_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        element: &FillValue,
    ) -> Result<(), ArrayError> {
        if element.size() != self.data_type().size() {
            return Err(ArrayError::IncompatibleElementSize(
                element.size(),
                self.data_type().size(),
            ));
        }
        self.chunk_subset(chunk_indices)?;
        let chunk_shape = self.chunk_shape_u64();
        if !chunk_subset.inbounds(&chunk_shape) {
            return Err(ArrayError::InvalidChunkSubset(
                chunk_subset.clone(),
                chunk_indices.to_vec(),
                chunk_shape,
            ));
        }

        let mutex = match self.synchronizer() {
            Some(synchronizer) => Some(synchronizer.chunk_mutex(chunk_indices).await),
            None => None,
        };
        let _guard = match &mutex {
            Some(mutex) => Some(mutex.lock().await),
            None => None,
        };
        if chunk_subset.start().iter().all(|&start| start == 0)
            && chunk_subset.shape() == chunk_shape
        {
            let chunk_bytes = element
                .as_ne_bytes()
                .repeat(usize::try_from(self.chunk_num_elements()).unwrap());
            self.store_chunk_unlocked(chunk_indices, chunk_bytes).await
        } else {
            let mut chunk_bytes = self.retrieve_chunk(chunk_indices).await?;
            chunk_subset.fill_bytes(element.as_ne_bytes(), &mut chunk_bytes, &chunk_shape)?;
            self.store_chunk_unlocked(chunk_indices, chunk_bytes).await
        }
    }

    /// Store `subset_bytes` at `array_subset`, flattened in row-major order.
    ///
    /// Chunks are written concurrently. This is not atomic: if a chunk write
    /// fails, chunks already written stay mutated.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `array_subset` is out of bounds of the
    /// array, the length of `subset_bytes` does not match `array_subset`, or
    /// a chunk write fails.
    pub async fn store_array_subset(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        let shape = self.shape();
        if !array_subset.inbounds(&shape) {
            return Err(ArrayError::InvalidArraySubset(array_subset.clone(), shape));
        }
        let element_size = self.data_type().size();
        let expected_len = array_subset.num_elements() * element_size as u64;
        if subset_bytes.len() as u64 != expected_len {
            return Err(ArrayError::InvalidBytesInputSize(
                subset_bytes.len(),
                expected_len,
            ));
        }
        if array_subset.is_empty() {
            return Ok(());
        }

        let chunks: Vec<_> = array_subset.chunks(self.chunk_shape())?.collect();
        if let [(chunk_indices, chunk_subset)] = chunks.as_slice() {
            if chunk_subset == array_subset {
                // the subset spans exactly one whole chunk
                return self.store_chunk(chunk_indices, subset_bytes).await;
            }
        }

        futures::stream::iter(chunks)
            .map(Ok)
            .try_for_each_concurrent(None, |(chunk_indices, chunk_subset)| {
                let subset_bytes = &subset_bytes;
                async move {
                    let overlap = array_subset.overlap(&chunk_subset)?;
                    let subset_selection = overlap.relative_to(array_subset.start())?;
                    let chunk_selection = overlap.relative_to(chunk_subset.start())?;
                    let chunk_subset_bytes = subset_selection.extract_bytes(
                        subset_bytes,
                        array_subset.shape(),
                        element_size,
                    )?;
                    self.store_chunk_subset(&chunk_indices, &chunk_selection, chunk_subset_bytes)
                        .await
                }
            })
            .await
    }

    /// Store `subset_elements` at `array_subset`, flattened in row-major order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or [`store_array_subset`](Array::store_array_subset) fails.
    pub async fn store_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        let subset_bytes = bytemuck::cast_slice(&subset_elements).to_vec();
        self.store_array_subset(array_subset, subset_bytes).await
    }

    /// Fill `array_subset` with copies of `element` (a scalar broadcast).
    ///
    /// Chunks are written concurrently; writes covering a whole chunk skip
    /// the read.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `element` does not match the
    /// data type size, `array_subset` is out of bounds, or a chunk write
    /// fails.
    pub async fn fill_array_subset(
        &self,
        array_subset: &ArraySubset,
        element: &FillValue,
    ) -> Result<(), ArrayError> {
        if element.size() != self.data_type().size() {
            return Err(ArrayError::IncompatibleElementSize(
                element.size(),
                self.data_type().size(),
            ));
        }
        let shape = self.shape();
        if !array_subset.inbounds(&shape) {
            return Err(ArrayError::InvalidArraySubset(array_subset.clone(), shape));
        }
        if array_subset.is_empty() {
            return Ok(());
        }

        let chunks: Vec<_> = array_subset.chunks(self.chunk_shape())?.collect();
        futures::stream::iter(chunks)
            .map(Ok)
            .try_for_each_concurrent(None, |(chunk_indices, chunk_subset)| async move {
                let overlap = array_subset.overlap(&chunk_subset)?;
                let chunk_selection = overlap.relative_to(chunk_subset.start())?;
                self.fill_chunk_subset(&chunk_indices, &chunk_selection, element)
                    .await
            })
            .await
    }

    /// Fill `array_subset` with copies of `element` (a scalar broadcast).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or [`fill_array_subset`](Array::fill_array_subset) fails.
    pub async fn fill_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
        element: T,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        let element = FillValue::new(bytemuck::bytes_of(&element).to_vec());
        self.fill_array_subset(array_subset, &element).await
    }

    /// Store `bytes` at `selection`, flattened in row-major order.
    ///
    /// The selection is normalized against the current array shape.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the selection does not normalize against
    /// the array shape or the store fails.
    pub async fn store_selection(
        &self,
        selection: &Selection,
        bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        let array_subset = selection.normalize(&self.shape())?;
        self.store_array_subset(&array_subset, bytes).await
    }

    /// Store `elements` at `selection`, flattened in row-major order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, the selection does not normalize, or the store fails.
    pub async fn store_selection_elements<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
        elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = bytemuck::cast_slice(&elements).to_vec();
        self.store_selection(selection, bytes).await
    }

    /// Fill `selection` with copies of `element` (a scalar broadcast).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the selection does not normalize against
    /// the array shape or the fill fails.
    pub async fn fill_selection(
        &self,
        selection: &Selection,
        element: &FillValue,
    ) -> Result<(), ArrayError> {
        let array_subset = selection.normalize(&self.shape())?;
        self.fill_array_subset(&array_subset, element).await
    }

    /// Fill `selection` with copies of `element` (a scalar broadcast).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, the selection does not normalize, or the fill fails.
    pub async fn fill_selection_elements<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
        element: T,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        let element = FillValue::new(bytemuck::bytes_of(&element).to_vec());
        self.fill_selection(selection, &element).await
    }

    /// Resize the array to `new_shape`.
    ///
    /// The chunk shape is unchanged. No chunk data is moved or deleted: chunks
    /// beyond a shrunken shape keep their keys and simply become unreachable
    /// (erase them with [`erase_chunk`](Array::erase_chunk) or by clearing the
    /// prefix to reclaim space); growth exposes uninitialized chunks answered
    /// by the fill value. If the array has a synchronizer, the resize runs
    /// under the array mutex.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `new_shape` does not match the array
    /// dimensionality.
    pub async fn resize(&self, new_shape: ArrayShape) -> Result<(), ArrayError> {
        if new_shape.len() != self.dimensionality() {
            return Err(ArrayError::IncompatibleDimensionalityError(
                IncompatibleDimensionalityError::new(
                    new_shape.len(),
                    self.dimensionality(),
                ),
            ));
        }
        let mutex = match self.synchronizer() {
            Some(synchronizer) => Some(synchronizer.array_mutex().await),
            None => None,
        };
        let _guard = match &mutex {
            Some(mutex) => Some(mutex.lock().await),
            None => None,
        };
        *self.shape.write() = new_shape;
        Ok(())
    }

    /// Append `data` of shape `data_shape` along `axis`, growing the array
    /// and writing the new region through the ordinary write path. Returns
    /// the new array shape.
    ///
    /// `data_shape` must match the array shape along all non-append axes. All
    /// validation happens before the shape changes; a failure while writing
    /// chunks leaves the shape extended. If the array has a synchronizer, the
    /// whole append runs under the array mutex.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `axis` or `data_shape` is invalid, the
    /// length of `data` does not match `data_shape`, or a chunk write fails.
    pub async fn append(
        &self,
        data: Vec<u8>,
        data_shape: &[u64],
        axis: usize,
    ) -> Result<ArrayShape, ArrayError> {
        if axis >= self.dimensionality() {
            return Err(ArrayError::InvalidAppendAxis(axis, self.dimensionality()));
        }
        if data_shape.len() != self.dimensionality() {
            return Err(ArrayError::IncompatibleDimensionalityError(
                IncompatibleDimensionalityError::new(
                    data_shape.len(),
                    self.dimensionality(),
                ),
            ));
        }
        let expected_len =
            data_shape.iter().product::<u64>() * self.data_type().size() as u64;
        if data.len() as u64 != expected_len {
            return Err(ArrayError::InvalidBytesInputSize(data.len(), expected_len));
        }

        let mutex = match self.synchronizer() {
            Some(synchronizer) => Some(synchronizer.array_mutex().await),
            None => None,
        };
        let _guard = match &mutex {
            Some(mutex) => Some(mutex.lock().await),
            None => None,
        };

        let old_shape = self.shape();
        if data_shape
            .iter()
            .enumerate()
            .any(|(dim, &size)| dim != axis && size != old_shape[dim])
        {
            return Err(ArrayError::IncompatibleAppendShape(
                data_shape.to_vec(),
                old_shape,
            ));
        }

        let mut new_shape = old_shape.clone();
        new_shape[axis] += data_shape[axis];
        *self.shape.write() = new_shape.clone();

        let start = (0..self.dimensionality())
            .map(|dim| if dim == axis { old_shape[axis] } else { 0 })
            .collect();
        let append_subset = ArraySubset::new_with_start_shape(start, data_shape.to_vec())?;
        self.store_array_subset(&append_subset, data).await?;
        Ok(new_shape)
    }
}
