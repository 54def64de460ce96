//! The chunk engine whole-chunk write path.

use crate::storage::{ByteSetter, StoreTraits};

use super::{Array, ArrayError};

impl<TStorage: ?Sized + StoreTraits> Array<TStorage> {
    /// Encode `chunk_bytes` and store the chunk at `chunk_indices`.
    ///
    /// The chunk is always stored as one complete compressed blob. If the
    /// array has a synchronizer, the store runs under the chunk mutex so it
    /// cannot interleave with a concurrent read-modify-write of the same
    /// chunk.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` is invalid, the length of
    /// `chunk_bytes` does not match the chunk size, or the encoding or store
    /// fails.
    pub async fn store_chunk(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        self.chunk_subset(chunk_indices)?;
        let chunk_bytes_len = self.chunk_bytes_len();
        if chunk_bytes.len() != chunk_bytes_len {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_bytes.len(),
                chunk_bytes_len as u64,
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
        self.store_chunk_unlocked(chunk_indices, chunk_bytes).await
    }

    /// Encode and store a validated chunk. The caller holds the chunk mutex
    /// if the array has a synchronizer.
    pub(super) async fn store_chunk_unlocked(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        let encoded = self.codec().encode(chunk_bytes)?;
        let handle = self.chunk_handle(chunk_indices);
        handle.set(encoded.into(), None).await?;
        Ok(())
    }

    /// Encode `chunk_elements` and store the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or [`store_chunk`](Array::store_chunk) fails.
    pub async fn store_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        let chunk_bytes = bytemuck::cast_slice(&chunk_elements).to_vec();
        self.store_chunk(chunk_indices, chunk_bytes).await
    }

    /// Erase the chunk at `chunk_indices`, returning it to the uninitialized
    /// state. Succeeds if the chunk is already uninitialized.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` is invalid or the erase
    /// fails.
    pub async fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        self.chunk_subset(chunk_indices)?;
        let handle = self.chunk_handle(chunk_indices);
        handle.delete().await?;
        Ok(())
    }
}
