//! Storage.
//!
//! A store is a byte-addressable key-value container implementing
//! [`StoreTraits`]: an explicit open/close lifecycle governed by an
//! [`AccessMode`], byte and byte-range reads, whole-value and positional
//! writes, key listing, and capability flags describing which of those
//! operation families a backend supports.
//!
//! Chunk I/O goes through [`StoreKeyHandle`], a narrow per-key view of a store.

pub mod store;

mod access_mode;
mod storage_async;
mod storage_handle;
mod store_key;
mod store_prefix;
mod store_state;
pub mod synchronizer;

use std::sync::Arc;

use thiserror::Error;

pub use access_mode::{AccessMode, AccessModeLiteral, InvalidAccessModeError};
pub use storage_async::{ByteGetter, ByteSetter, StoreDirEntries, StoreKeys, StoreTraits};
pub use storage_handle::StoreKeyHandle;
pub use store_key::{StoreKey, StoreKeyError};
pub use store_prefix::{StorePrefix, StorePrefixError};
pub use store_state::StoreState;

pub use bytes::Bytes;

use crate::byte_range::{ByteOffset, ByteRange, InvalidByteRangeError};

/// [`Bytes`] or [`None`].
///
/// [`None`] is the defined signal for a missing key, distinct from an error.
pub type MaybeBytes = Option<Bytes>;

/// An [`Arc`] wrapped store.
pub type Storage = Arc<dyn StoreTraits>;

/// A [`StoreKey`] and [`ByteRange`].
#[derive(Copy, Clone, Debug)]
pub struct StoreKeyRange<'a> {
    /// The key for the range.
    key: &'a StoreKey,
    /// The byte range.
    byte_range: ByteRange,
}

impl<'a> StoreKeyRange<'a> {
    /// Create a new [`StoreKeyRange`].
    #[must_use]
    pub const fn new(key: &'a StoreKey, byte_range: ByteRange) -> Self {
        Self { key, byte_range }
    }

    /// Return the key.
    #[must_use]
    pub const fn key(&self) -> &'a StoreKey {
        self.key
    }

    /// Return the byte range.
    #[must_use]
    pub const fn byte_range(&self) -> ByteRange {
        self.byte_range
    }
}

impl std::fmt::Display for StoreKeyRange<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.key, self.byte_range)
    }
}

/// A [`StoreKey`], [`ByteOffset`], and value (bytes).
#[derive(Copy, Clone, Debug)]
pub struct StoreKeyStartValue<'a> {
    /// The key.
    key: &'a StoreKey,
    /// The starting byte offset.
    start: ByteOffset,
    /// The store value.
    value: &'a [u8],
}

impl<'a> StoreKeyStartValue<'a> {
    /// Create a new [`StoreKeyStartValue`].
    #[must_use]
    pub const fn new(key: &'a StoreKey, start: ByteOffset, value: &'a [u8]) -> Self {
        Self { key, start, value }
    }

    /// Return the key.
    #[must_use]
    pub const fn key(&self) -> &'a StoreKey {
        self.key
    }

    /// Return the offset of the start of the value.
    #[must_use]
    pub const fn start(&self) -> ByteOffset {
        self.start
    }

    /// Return the offset of the exclusive end of the value.
    #[must_use]
    pub const fn end(&self) -> ByteOffset {
        self.start + self.value.len() as u64
    }

    /// Return the value.
    #[must_use]
    pub const fn value(&self) -> &'a [u8] {
        self.value
    }
}

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// The store is already open.
    #[error("the store is already open")]
    AlreadyOpen,
    /// The store must not exist (`w-` mode), but it is not empty.
    #[error("the store already exists")]
    AlreadyExists,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid store key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid store prefix.
    #[error(transparent)]
    InvalidStorePrefix(#[from] StorePrefixError),
    /// An invalid byte range.
    #[error(transparent)]
    InvalidByteRange(#[from] InvalidByteRangeError),
    /// An invalid access mode literal.
    #[error(transparent)]
    InvalidAccessMode(#[from] InvalidAccessModeError),
    /// The store does not support an operation family.
    #[error("unsupported store operation: {0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Return the store key for the chunk at `chunk_indices`, under `prefix`.
///
/// Chunk indices are joined with a `.` separator, so the chunk at `[1, 2, 3]`
/// of an array with prefix `array/` has the key `array/1.2.3`.
#[must_use]
pub fn chunk_key(prefix: &StorePrefix, chunk_indices: &[u64]) -> StoreKey {
    debug_assert!(!chunk_indices.is_empty());
    let key = chunk_indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".");
    unsafe { StoreKey::new_unchecked(format!("{}{key}", prefix.as_str())) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_keys() {
        let prefix = StorePrefix::new("group/array/").unwrap();
        assert_eq!(
            chunk_key(&prefix, &[1, 2, 3]),
            StoreKey::new("group/array/1.2.3").unwrap()
        );
        assert_eq!(
            chunk_key(&StorePrefix::root(), &[0]),
            StoreKey::new("0").unwrap()
        );
    }

    #[test]
    fn store_key_range_display() {
        let key = StoreKey::new("key").unwrap();
        let key_range = StoreKeyRange::new(&key, ByteRange::FromStart(1, Some(2)));
        assert_eq!(key_range.to_string(), "key[1..3]");
    }

    #[test]
    fn store_key_start_value() {
        let key = StoreKey::new("key").unwrap();
        let ksv = StoreKeyStartValue::new(&key, 4, &[0, 1, 2]);
        assert_eq!(ksv.start(), 4);
        assert_eq!(ksv.end(), 7);
        assert_eq!(ksv.value(), &[0, 1, 2]);
    }
}
