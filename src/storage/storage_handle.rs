//! Per-key store views.

use std::sync::Arc;

use async_trait::async_trait;

use crate::byte_range::{ByteOffset, ByteRange};

use super::{
    ByteGetter, ByteSetter, Bytes, MaybeBytes, StorageError, StoreKey, StoreKeyStartValue,
    StoreTraits,
};

/// A view of one key of a store.
///
/// Implements [`ByteGetter`] and [`ByteSetter`], so consumers that operate on
/// a single value (such as the chunk engine) need no knowledge of keys or of
/// the store behind them.
#[derive(Clone)]
pub struct StoreKeyHandle<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    key: StoreKey,
}

impl<TStorage: ?Sized> StoreKeyHandle<TStorage> {
    /// Create a new [`StoreKeyHandle`] for `key` in `storage`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>, key: StoreKey) -> Self {
        Self { storage, key }
    }

    /// Return the key.
    #[must_use]
    pub fn key(&self) -> &StoreKey {
        &self.key
    }
}

#[async_trait]
impl<TStorage: ?Sized + StoreTraits> ByteGetter for StoreKeyHandle<TStorage> {
    async fn get(&self, byte_range: Option<ByteRange>) -> Result<MaybeBytes, StorageError> {
        self.storage.get(&self.key, byte_range).await
    }
}

#[async_trait]
impl<TStorage: ?Sized + StoreTraits> ByteSetter for StoreKeyHandle<TStorage> {
    async fn set(&self, value: Bytes, offset: Option<ByteOffset>) -> Result<(), StorageError> {
        match offset {
            Some(offset) => {
                self.storage
                    .set_partial_values(&[StoreKeyStartValue::new(
                        &self.key,
                        offset,
                        value.as_ref(),
                    )])
                    .await
            }
            None => self.storage.set(&self.key, value).await,
        }
    }

    async fn delete(&self) -> Result<(), StorageError> {
        self.storage.delete(&self.key).await
    }

    async fn set_if_not_exists(&self, default: Bytes) -> Result<(), StorageError> {
        self.storage.set_if_not_exists(&self.key, default).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::MemoryStore;
    use super::*;

    #[tokio::test]
    async fn store_key_handle() {
        let store = Arc::new(MemoryStore::new());
        let handle = StoreKeyHandle::new(store.clone(), StoreKey::new("a/b").unwrap());
        assert_eq!(handle.key().as_str(), "a/b");

        assert_eq!(handle.get(None).await.unwrap(), None);
        handle.set(vec![0, 1, 2, 3].into(), None).await.unwrap();
        assert_eq!(
            handle.get(None).await.unwrap(),
            Some(vec![0, 1, 2, 3].into())
        );
        handle.set(vec![9, 9].into(), Some(1)).await.unwrap();
        assert_eq!(
            handle.get(None).await.unwrap(),
            Some(vec![0, 9, 9, 3].into())
        );
        handle
            .set_if_not_exists(vec![7].into())
            .await
            .unwrap();
        assert_eq!(
            handle.get(None).await.unwrap(),
            Some(vec![0, 9, 9, 3].into())
        );
        handle.delete().await.unwrap();
        assert_eq!(handle.get(None).await.unwrap(), None);
    }
}
