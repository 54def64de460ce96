//! The asynchronous store contract.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use itertools::Itertools;

use crate::byte_range::{ByteOffset, ByteRange};

use super::{
    AccessMode, AccessModeLiteral, Bytes, MaybeBytes, StorageError, StoreKey, StoreKeyRange,
    StoreKeyStartValue, StorePrefix,
};

/// A stream of store keys.
pub type StoreKeys<'a> = futures::stream::BoxStream<'a, Result<StoreKey, StorageError>>;

/// A stream of the names of the immediate children of a prefix.
pub type StoreDirEntries<'a> = futures::stream::BoxStream<'a, Result<String, StorageError>>;

/// The store contract: a byte-addressable key-value container with an
/// open/close lifecycle, byte-range reads, positional writes, listing, and
/// capability flags.
///
/// Keys map to values (byte sequences); a missing key is answered with
/// [`None`], never an error. Capability flags describe which operation
/// families a backend supports; a capability-gated call on an unsupporting
/// backend fails with [`StorageError::Unsupported`], never a silent no-op.
///
/// Store operations do not require the store to be open; the lifecycle exists
/// so that the mode-dependent open-time behaviour (`w` clearing, `w-`
/// existence check) runs exactly once.
#[async_trait]
pub trait StoreTraits: Send + Sync {
    /// Return the access mode of the store.
    fn mode(&self) -> &AccessMode;

    /// Return `true` if the store is open.
    fn is_open(&self) -> bool;

    /// Set the open flag. Intended for [`StoreTraits::open`]/[`StoreTraits::close`].
    #[doc(hidden)]
    fn set_is_open(&self, is_open: bool);

    /// Open the store, running the mode-dependent open-time behaviour:
    /// - `w` clears any existing contents,
    /// - `w-` fails with [`StorageError::AlreadyExists`] if the store is not empty.
    ///
    /// # Errors
    /// Returns [`StorageError::AlreadyOpen`] if the store is already open, or
    /// the error of the underlying [`clear`](StoreTraits::clear) /
    /// [`empty`](StoreTraits::empty) call.
    async fn open(&self) -> Result<(), StorageError> {
        if self.is_open() {
            return Err(StorageError::AlreadyOpen);
        }
        if self.mode().overwrite() {
            self.clear().await?;
        } else if self.mode().literal() == AccessModeLiteral::WMinus && !self.empty().await? {
            return Err(StorageError::AlreadyExists);
        }
        self.set_is_open(true);
        Ok(())
    }

    /// Open the store if it is not already open.
    ///
    /// # Errors
    /// Returns the error of [`open`](StoreTraits::open), except [`StorageError::AlreadyOpen`].
    async fn ensure_open(&self) -> Result<(), StorageError> {
        if self.is_open() {
            Ok(())
        } else {
            self.open().await
        }
    }

    /// Close the store.
    fn close(&self) {
        self.set_is_open(false);
    }

    /// Return an error if the access mode forbids writes.
    ///
    /// # Errors
    /// Returns [`StorageError::ReadOnly`] if the store is read only.
    fn check_writable(&self) -> Result<(), StorageError> {
        if self.mode().readonly() {
            Err(StorageError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Return `true` if the store holds no keys.
    async fn empty(&self) -> Result<bool, StorageError>;

    /// Erase all keys in the store.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Retrieve the value at `key`, restricted to `byte_range` if given.
    ///
    /// Returns [`None`] if the key is missing.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying error or an invalid byte range.
    async fn get(
        &self,
        key: &StoreKey,
        byte_range: Option<ByteRange>,
    ) -> Result<MaybeBytes, StorageError>;

    /// Return `true` if `key` exists.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying error.
    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError> {
        Ok(self.get(key, None).await?.is_some())
    }

    /// Retrieve byte ranges from multiple keys, concurrently.
    ///
    /// Result positions align 1:1 with `key_ranges`; each is [`None`] if the
    /// key is missing.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying error or an invalid byte range.
    async fn get_partial_values(
        &self,
        key_ranges: &[StoreKeyRange<'_>],
    ) -> Result<Vec<MaybeBytes>, StorageError> {
        let futures_get = key_ranges
            .iter()
            .map(|key_range| self.get(key_range.key(), Some(key_range.byte_range())));
        futures::future::try_join_all(futures_get).await
    }

    /// Store `value` at `key`.
    ///
    /// # Errors
    /// Returns [`StorageError::ReadOnly`] if the store is read only, or a
    /// [`StorageError`] on an underlying error.
    async fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError>;

    /// Store `value` at `key` only if the key is missing.
    ///
    /// The default implementation is a check-then-set: concurrent callers can
    /// interleave between the existence check and the write. Backends with
    /// [`supports_atomic_set_if_not_exists`](StoreTraits::supports_atomic_set_if_not_exists)
    /// override this with an atomic conditional put.
    ///
    /// # Errors
    /// Returns [`StorageError::ReadOnly`] if the store is read only, or a
    /// [`StorageError`] on an underlying error.
    async fn set_if_not_exists(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        self.check_writable()?;
        if !self.exists(key).await? {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Store values at byte offsets within the values of keys, concurrently
    /// per key.
    ///
    /// Values are written verbatim at their offsets; a value is zero-padded if
    /// an offset lies beyond its current length. The caller must guarantee
    /// that ranges within one key do not overlap.
    ///
    /// # Errors
    /// Returns [`StorageError::Unsupported`] if the store does not support
    /// partial writes, [`StorageError::ReadOnly`] if it is read only, or a
    /// [`StorageError`] on an underlying error.
    ///
    /// # Panics
    /// Panics if a byte offset exceeds [`usize::MAX`].
    async fn set_partial_values(
        &self,
        key_start_values: &[StoreKeyStartValue<'_>],
    ) -> Result<(), StorageError> {
        if !self.supports_partial_writes() {
            return Err(StorageError::Unsupported(
                "the store does not support partial writes".to_string(),
            ));
        }
        self.check_writable()?;

        // Group by key so each key is read and written once.
        let groups = key_start_values
            .iter()
            .chunk_by(|key_start_value| key_start_value.key())
            .into_iter()
            .map(|(key, group)| (key, group.copied().collect::<Vec<_>>()))
            .collect::<Vec<_>>();
        futures::stream::iter(&groups)
            .map(Ok)
            .try_for_each_concurrent(None, |(key, group)| async move {
                let mut value = self
                    .get(key, None)
                    .await?
                    .map_or_else(Vec::new, |bytes| bytes.to_vec());
                let end_max =
                    usize::try_from(group.iter().map(StoreKeyStartValue::end).max().unwrap())
                        .unwrap();
                if value.len() < end_max {
                    value.resize(end_max, 0);
                }
                for key_start_value in group {
                    let start = usize::try_from(key_start_value.start()).unwrap();
                    let end = usize::try_from(key_start_value.end()).unwrap();
                    value[start..end].copy_from_slice(key_start_value.value());
                }
                self.set(key, Bytes::from(value)).await
            })
            .await
    }

    /// Erase `key`. Succeeds if the key is already missing.
    ///
    /// # Errors
    /// Returns [`StorageError::ReadOnly`] if the store is read only, or a
    /// [`StorageError`] on an underlying error.
    async fn delete(&self, key: &StoreKey) -> Result<(), StorageError>;

    /// Erase every key under `prefix`.
    ///
    /// The trailing separator of the prefix is guaranteed by [`StorePrefix`].
    /// This is not atomic: a failure partway leaves the prefix partially
    /// deleted.
    ///
    /// # Errors
    /// Returns [`StorageError::Unsupported`] if the store does not support
    /// deletes and listing, [`StorageError::ReadOnly`] if it is read only, or
    /// a [`StorageError`] on an underlying error.
    async fn delete_dir(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        if !self.supports_deletes() || !self.supports_listing() {
            return Err(StorageError::Unsupported(
                "delete_dir requires delete and listing support".to_string(),
            ));
        }
        self.check_writable()?;
        let keys: Vec<StoreKey> = self.list_prefix(prefix).try_collect().await?;
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// List all keys, lexicographically ordered.
    fn list(&self) -> StoreKeys<'_>;

    /// List all keys with prefix `prefix`, lexicographically ordered.
    fn list_prefix(&self, prefix: &StorePrefix) -> StoreKeys<'_>;

    /// List the names of the immediate children of `prefix`.
    ///
    /// Children that are themselves prefixes carry a trailing `/`; deeper
    /// descendants are suppressed.
    fn list_dir(&self, prefix: &StorePrefix) -> StoreDirEntries<'_>;

    /// Return `true` if the store supports writes.
    fn supports_writes(&self) -> bool;

    /// Return `true` if the store supports deletes.
    fn supports_deletes(&self) -> bool;

    /// Return `true` if the store supports positional partial writes.
    fn supports_partial_writes(&self) -> bool;

    /// Return `true` if the store supports listing.
    fn supports_listing(&self) -> bool;

    /// Return `true` if [`set_if_not_exists`](StoreTraits::set_if_not_exists)
    /// is atomic rather than check-then-set.
    fn supports_atomic_set_if_not_exists(&self) -> bool {
        false
    }
}

/// An asynchronous byte getter: the read half of a per-key view of a store.
#[async_trait]
pub trait ByteGetter: Send + Sync {
    /// Retrieve the value, restricted to `byte_range` if given.
    ///
    /// Returns [`None`] if the key is missing.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying error or an invalid byte range.
    async fn get(&self, byte_range: Option<ByteRange>) -> Result<MaybeBytes, StorageError>;
}

/// An asynchronous byte setter: the write half of a per-key view of a store.
#[async_trait]
pub trait ByteSetter: ByteGetter {
    /// Store `value`, at byte `offset` within the existing value if given.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying error.
    async fn set(&self, value: Bytes, offset: Option<ByteOffset>) -> Result<(), StorageError>;

    /// Erase the value. Succeeds if the key is already missing.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying error.
    async fn delete(&self) -> Result<(), StorageError>;

    /// Store `default` only if the key is missing.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying error.
    async fn set_if_not_exists(&self, default: Bytes) -> Result<(), StorageError>;
}
