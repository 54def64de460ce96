//! The chunk engine read path.

use futures::StreamExt;

use crate::array_subset::ArraySubset;
use crate::storage::{ByteGetter, StoreTraits};

use super::selection::Selection;
use super::{Array, ArrayError};

impl<TStorage: ?Sized + StoreTraits> Array<TStorage> {
    /// Retrieve and decode the chunk at `chunk_indices`, or [`None`] if the
    /// chunk is uninitialized.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` is invalid or the
    /// retrieval or decoding fails.
    pub async fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        self.chunk_subset(chunk_indices)?;
        let handle = self.chunk_handle(chunk_indices);
        let Some(encoded) = handle.get(None).await? else {
            return Ok(None);
        };
        let mut chunk_bytes = vec![0; self.chunk_bytes_len()];
        self.codec().decode_into(&encoded, &mut chunk_bytes)?;
        Ok(Some(chunk_bytes))
    }

    /// Retrieve and decode the chunk at `chunk_indices`.
    ///
    /// An uninitialized chunk decodes to the fill value repeated, or zeroes if
    /// the array has no fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` is invalid or the
    /// retrieval or decoding fails.
    pub async fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, ArrayError> {
        Ok(self
            .retrieve_chunk_if_exists(chunk_indices)
            .await?
            .unwrap_or_else(|| self.fill_chunk_bytes()))
    }

    /// Retrieve the chunk at `chunk_indices` as elements of type `T`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, `chunk_indices` is invalid, or the retrieval fails.
    pub async fn retrieve_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self.retrieve_chunk(chunk_indices).await?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Retrieve the bytes of `array_subset`, flattened in row-major order.
    ///
    /// Regions of uninitialized chunks hold the fill value, or remain zeroed
    /// if the array has no fill value. Chunks are retrieved and decoded
    /// concurrently; each result is spliced into the output as it completes.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `array_subset` is out of bounds of the
    /// array or a retrieval fails.
    pub async fn retrieve_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<u8>, ArrayError> {
        let shape = self.shape();
        if !array_subset.inbounds(&shape) {
            return Err(ArrayError::InvalidArraySubset(array_subset.clone(), shape));
        }
        let element_size = self.data_type().size();
        let size = array_subset.num_elements_usize() * element_size;
        if size == 0 {
            return Ok(Vec::new());
        }

        let chunks: Vec<_> = array_subset.chunks(self.chunk_shape())?.collect();
        if let [(chunk_indices, chunk_subset)] = chunks.as_slice() {
            if chunk_subset == array_subset {
                // whole single chunk, decode directly into the output
                return self.retrieve_chunk(chunk_indices).await;
            }
        }

        let chunk_shape = self.chunk_shape_u64();
        let num_chunks = chunks.len();
        let mut out = vec![0; size];
        let mut chunk_bytes_stream = futures::stream::iter(chunks)
            .map(|(chunk_indices, chunk_subset)| {
                let chunk_shape = &chunk_shape;
                async move {
                    let overlap = array_subset.overlap(&chunk_subset)?;
                    let out_subset = overlap.relative_to(array_subset.start())?;
                    let chunk_bytes = match self.retrieve_chunk_if_exists(&chunk_indices).await? {
                        Some(chunk_bytes) => {
                            let chunk_selection = overlap.relative_to(chunk_subset.start())?;
                            Some(chunk_selection.extract_bytes(
                                &chunk_bytes,
                                chunk_shape,
                                element_size,
                            )?)
                        }
                        None => None,
                    };
                    Ok::<_, ArrayError>((out_subset, chunk_bytes))
                }
            })
            .buffer_unordered(num_chunks);
        while let Some(chunk_result) = chunk_bytes_stream.next().await {
            let (out_subset, chunk_bytes) = chunk_result?;
            match chunk_bytes {
                Some(chunk_bytes) => out_subset.store_bytes(
                    &chunk_bytes,
                    &mut out,
                    array_subset.shape(),
                    element_size,
                )?,
                None => {
                    if let Some(fill_value) = self.fill_value() {
                        out_subset.fill_bytes(
                            fill_value.as_ne_bytes(),
                            &mut out,
                            array_subset.shape(),
                        )?;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Retrieve `array_subset` as elements of type `T`, flattened in
    /// row-major order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, `array_subset` is out of bounds, or a retrieval fails.
    pub async fn retrieve_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self.retrieve_array_subset(array_subset).await?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Retrieve the bytes of `selection`, flattened in row-major order.
    ///
    /// The selection is normalized against the current array shape.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the selection does not normalize against
    /// the array shape or a retrieval fails.
    pub async fn retrieve_selection(&self, selection: &Selection) -> Result<Vec<u8>, ArrayError> {
        let array_subset = selection.normalize(&self.shape())?;
        self.retrieve_array_subset(&array_subset).await
    }

    /// Retrieve `selection` as elements of type `T`, flattened in row-major
    /// order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, the selection does not normalize, or a retrieval fails.
    pub async fn retrieve_selection_elements<T: bytemuck::Pod>(
        &self,
        selection: &Selection,
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self.retrieve_selection(selection).await?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}
