//! An in-memory store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};

use crate::byte_range::{extract_byte_range, ByteOffset, ByteRange};
use crate::storage::{
    AccessMode, AccessModeLiteral, Bytes, MaybeBytes, StorageError, StoreDirEntries, StoreKey,
    StoreKeyStartValue, StoreKeys, StorePrefix, StoreState, StoreTraits,
};

/// An in-memory store.
///
/// Supports writes, deletes, partial writes, and listing. The reference
/// backend for tests and for stores layered on top of it.
#[derive(Debug)]
pub struct MemoryStore {
    state: StoreState,
    data_map: Mutex<BTreeMap<StoreKey, Arc<RwLock<Vec<u8>>>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new memory store with the `a` (read, write, create) access mode.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_mode(AccessMode::new(AccessModeLiteral::A))
    }

    /// Create a new memory store with access mode `mode`.
    #[must_use]
    pub fn new_with_mode(mode: AccessMode) -> Self {
        Self {
            state: StoreState::new(mode),
            data_map: Mutex::default(),
        }
    }

    fn set_impl(&self, key: &StoreKey, value: &[u8], offset: Option<ByteOffset>) {
        let mut data_map = self.data_map.lock();
        let data = data_map
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::default()))
            .clone();
        drop(data_map);
        let mut data = data.write();

        match offset {
            Some(offset) => {
                let offset = usize::try_from(offset).unwrap();
                if data.len() < offset + value.len() {
                    data.resize(offset + value.len(), 0);
                }
                data[offset..offset + value.len()].copy_from_slice(value);
            }
            None => *data = value.to_vec(),
        }
    }
}

#[async_trait]
impl StoreTraits for MemoryStore {
    fn mode(&self) -> &AccessMode {
        self.state.mode()
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }

    fn set_is_open(&self, is_open: bool) {
        self.state.set_is_open(is_open);
    }

    async fn empty(&self) -> Result<bool, StorageError> {
        Ok(self.data_map.lock().is_empty())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        self.data_map.lock().clear();
        Ok(())
    }

    async fn get(
        &self,
        key: &StoreKey,
        byte_range: Option<ByteRange>,
    ) -> Result<MaybeBytes, StorageError> {
        let data_map = self.data_map.lock();
        let Some(data) = data_map.get(key).cloned() else {
            return Ok(None);
        };
        drop(data_map);
        let data = data.read();
        let bytes = match byte_range {
            Some(byte_range) => extract_byte_range(&data, &byte_range)?,
            None => data.clone(),
        };
        Ok(Some(bytes.into()))
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError> {
        Ok(self.data_map.lock().contains_key(key))
    }

    async fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.check_writable()?;
        self.set_impl(key, &value, None);
        Ok(())
    }

    async fn set_partial_values(
        &self,
        key_start_values: &[StoreKeyStartValue<'_>],
    ) -> Result<(), StorageError> {
        self.check_writable()?;
        for key_start_value in key_start_values {
            self.set_impl(
                key_start_value.key(),
                key_start_value.value(),
                Some(key_start_value.start()),
            );
        }
        Ok(())
    }

    async fn delete(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.check_writable()?;
        self.data_map.lock().remove(key);
        Ok(())
    }

    fn list(&self) -> StoreKeys<'_> {
        let keys: Vec<_> = self.data_map.lock().keys().cloned().map(Ok).collect();
        futures::stream::iter(keys).boxed()
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> StoreKeys<'_> {
        let keys: Vec<_> = self
            .data_map
            .lock()
            .keys()
            .filter(|key| key.has_prefix(prefix))
            .cloned()
            .map(Ok)
            .collect();
        futures::stream::iter(keys).boxed()
    }

    fn list_dir(&self, prefix: &StorePrefix) -> StoreDirEntries<'_> {
        let mut children = BTreeSet::new();
        for key in self.data_map.lock().keys() {
            if let Some(relative) = key.as_str().strip_prefix(prefix.as_str()) {
                match relative.split_once('/') {
                    Some((child_prefix, _)) => children.insert(format!("{child_prefix}/")),
                    None => children.insert(relative.to_string()),
                };
            }
        }
        futures::stream::iter(children.into_iter().map(Ok).collect::<Vec<_>>()).boxed()
    }

    fn supports_writes(&self) -> bool {
        true
    }

    fn supports_deletes(&self) -> bool {
        true
    }

    fn supports_partial_writes(&self) -> bool {
        true
    }

    fn supports_listing(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;

    #[tokio::test]
    async fn memory_set_get_delete() {
        let store = MemoryStore::new();
        let key = StoreKey::new("a/b").unwrap();
        assert_eq!(store.get(&key, None).await.unwrap(), None);
        assert!(!store.exists(&key).await.unwrap());

        store.set(&key, vec![0, 1, 2, 3].into()).await.unwrap();
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(
            store.get(&key, None).await.unwrap(),
            Some(vec![0, 1, 2, 3].into())
        );
        assert_eq!(
            store
                .get(&key, Some(ByteRange::FromStart(1, Some(2))))
                .await
                .unwrap(),
            Some(vec![1, 2].into())
        );
        assert_eq!(
            store
                .get(&key, Some(ByteRange::FromEnd(0, Some(2))))
                .await
                .unwrap(),
            Some(vec![2, 3].into())
        );
        assert!(store
            .get(&key, Some(ByteRange::FromStart(3, Some(2))))
            .await
            .is_err());

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key, None).await.unwrap(), None);
        // deleting a missing key succeeds
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn memory_partial_values() {
        let store = MemoryStore::new();
        let key0 = StoreKey::new("a/b").unwrap();
        let key1 = StoreKey::new("a/c").unwrap();
        store.set(&key0, vec![0, 0, 0, 0].into()).await.unwrap();
        store
            .set_partial_values(&[
                StoreKeyStartValue::new(&key0, 1, &[1, 2]),
                StoreKeyStartValue::new(&key1, 2, &[9]),
            ])
            .await
            .unwrap();
        assert_eq!(
            store.get(&key0, None).await.unwrap(),
            Some(vec![0, 1, 2, 0].into())
        );
        // missing key zero-padded up to the offset
        assert_eq!(
            store.get(&key1, None).await.unwrap(),
            Some(vec![0, 0, 9].into())
        );

        let values = store
            .get_partial_values(&[
                crate::storage::StoreKeyRange::new(&key0, ByteRange::FromStart(1, Some(2))),
                crate::storage::StoreKeyRange::new(&key1, ByteRange::FromStart(0, None)),
                crate::storage::StoreKeyRange::new(
                    &StoreKey::new("missing").unwrap(),
                    ByteRange::FromStart(0, None),
                ),
            ])
            .await
            .unwrap();
        assert_eq!(
            values,
            vec![
                Some(vec![1, 2].into()),
                Some(vec![0, 0, 9].into()),
                None
            ]
        );
    }

    #[tokio::test]
    async fn memory_list() {
        let store = MemoryStore::new();
        for key in ["a/b", "a/c/d", "a/c/e", "f"] {
            store
                .set(&StoreKey::new(key).unwrap(), vec![0].into())
                .await
                .unwrap();
        }

        let keys: Vec<StoreKey> = store.list().try_collect().await.unwrap();
        assert_eq!(
            keys,
            ["a/b", "a/c/d", "a/c/e", "f"]
                .map(|key| StoreKey::new(key).unwrap())
                .to_vec()
        );

        let keys: Vec<StoreKey> = store
            .list_prefix(&StorePrefix::new("a/c/").unwrap())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(
            keys,
            ["a/c/d", "a/c/e"].map(|key| StoreKey::new(key).unwrap()).to_vec()
        );

        let children: Vec<String> = store
            .list_dir(&StorePrefix::new("a/").unwrap())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(children, vec!["b".to_string(), "c/".to_string()]);

        let children: Vec<String> = store
            .list_dir(&StorePrefix::root())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(children, vec!["a/".to_string(), "f".to_string()]);
    }

    #[tokio::test]
    async fn memory_delete_dir() {
        let store = MemoryStore::new();
        for key in ["a/b", "a/c/d", "f"] {
            store
                .set(&StoreKey::new(key).unwrap(), vec![0].into())
                .await
                .unwrap();
        }
        store
            .delete_dir(&StorePrefix::new("a/").unwrap())
            .await
            .unwrap();
        let keys: Vec<StoreKey> = store.list().try_collect().await.unwrap();
        assert_eq!(keys, vec![StoreKey::new("f").unwrap()]);
    }

    #[tokio::test]
    async fn memory_readonly() {
        let store = MemoryStore::new_with_mode(AccessMode::new(AccessModeLiteral::R));
        let key = StoreKey::new("a").unwrap();
        assert!(matches!(
            store.set(&key, vec![0].into()).await,
            Err(StorageError::ReadOnly)
        ));
        assert!(matches!(
            store.delete(&key).await,
            Err(StorageError::ReadOnly)
        ));
        assert!(matches!(store.clear().await, Err(StorageError::ReadOnly)));
        assert_eq!(store.get(&key, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_open_lifecycle() {
        let store = MemoryStore::new();
        assert!(!store.is_open());
        store.open().await.unwrap();
        assert!(store.is_open());
        assert!(matches!(
            store.open().await,
            Err(StorageError::AlreadyOpen)
        ));
        store.ensure_open().await.unwrap();
        store.close();
        assert!(!store.is_open());
    }

    #[tokio::test]
    async fn memory_open_overwrite() {
        let store = MemoryStore::new_with_mode(AccessMode::from_literal("w").unwrap());
        let key = StoreKey::new("a").unwrap();
        store.set(&key, vec![0].into()).await.unwrap();
        assert!(!store.empty().await.unwrap());
        store.open().await.unwrap();
        assert!(store.empty().await.unwrap());
    }

    #[tokio::test]
    async fn memory_open_exclusive() {
        let store = MemoryStore::new_with_mode(AccessMode::from_literal("w-").unwrap());
        store.open().await.unwrap();
        store.close();

        let store = MemoryStore::new_with_mode(AccessMode::from_literal("w-").unwrap());
        store
            .set(&StoreKey::new("a").unwrap(), vec![0].into())
            .await
            .unwrap();
        assert!(matches!(
            store.open().await,
            Err(StorageError::AlreadyExists)
        ));
        assert!(!store.is_open());
    }

    #[tokio::test]
    async fn memory_set_if_not_exists() {
        let store = MemoryStore::new();
        let key = StoreKey::new("a").unwrap();
        store.set_if_not_exists(&key, vec![1].into()).await.unwrap();
        assert_eq!(store.get(&key, None).await.unwrap(), Some(vec![1].into()));
        store.set_if_not_exists(&key, vec![2].into()).await.unwrap();
        assert_eq!(store.get(&key, None).await.unwrap(), Some(vec![1].into()));
        assert!(!store.supports_atomic_set_if_not_exists());
    }
}
