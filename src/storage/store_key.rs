//! Store keys.

use derive_more::Display;
use thiserror::Error;

use super::StorePrefix;

/// A validated key for a store value.
///
/// A key is a Unicode string, where the final character is not a `/` character.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StoreKey(String);

/// An invalid store key.
#[derive(Clone, Debug, Error)]
#[error("invalid store key {0}")]
pub struct StoreKeyError(String);

impl StoreKey {
    /// Create a new [`StoreKey`].
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `key` is not valid.
    pub fn new(key: impl Into<String>) -> Result<Self, StoreKeyError> {
        let key = key.into();
        if Self::validate(&key) {
            Ok(Self(key))
        } else {
            Err(StoreKeyError(key))
        }
    }

    /// Create a new [`StoreKey`] without validation.
    ///
    /// # Safety
    /// `key` is not validated, so this can result in an invalid store key.
    #[must_use]
    pub unsafe fn new_unchecked(key: impl Into<String>) -> Self {
        let key = key.into();
        debug_assert!(Self::validate(&key));
        Self(key)
    }

    /// Return the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate a key according to the following rules:
    /// - a key is not empty, and
    /// - a key does not start or end with `/`.
    #[must_use]
    pub fn validate(key: &str) -> bool {
        !key.is_empty() && !key.starts_with('/') && !key.ends_with('/')
    }

    /// Return `true` if the key has prefix `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &StorePrefix) -> bool {
        self.0.starts_with(prefix.as_str())
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StoreKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_key_valid() {
        assert!(StoreKey::new("a").is_ok());
        assert!(StoreKey::new("a/b").is_ok());
        assert!(StoreKey::new("a/b.c").is_ok());
    }

    #[test]
    fn store_key_invalid() {
        assert!(StoreKey::new("").is_err());
        assert!(StoreKey::new("/a").is_err());
        assert!(StoreKey::new("a/").is_err());
    }

    #[test]
    fn store_key_prefix() {
        let key = StoreKey::new("a/b/c").unwrap();
        assert!(key.has_prefix(&StorePrefix::new("a/b/").unwrap()));
        assert!(key.has_prefix(&StorePrefix::root()));
        assert!(!key.has_prefix(&StorePrefix::new("b/").unwrap()));
    }
}
