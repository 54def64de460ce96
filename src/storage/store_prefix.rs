//! Store prefixes.

use derive_more::Display;
use thiserror::Error;

/// A validated prefix for a store key.
///
/// A prefix is a Unicode string that is empty (the root prefix) or ends with
/// `/`. The trailing separator is thus guaranteed by construction.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StorePrefix(String);

/// An invalid store prefix.
#[derive(Clone, Debug, Error)]
#[error("invalid store prefix {0}")]
pub struct StorePrefixError(String);

impl StorePrefix {
    /// Create a new [`StorePrefix`].
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `prefix` is not valid.
    pub fn new(prefix: impl Into<String>) -> Result<Self, StorePrefixError> {
        let prefix = prefix.into();
        if Self::validate(&prefix) {
            Ok(Self(prefix))
        } else {
            Err(StorePrefixError(prefix))
        }
    }

    /// Create a new [`StorePrefix`] without validation.
    ///
    /// # Safety
    /// `prefix` is not validated, so this can result in an invalid store prefix.
    #[must_use]
    pub unsafe fn new_unchecked(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        debug_assert!(Self::validate(&prefix));
        Self(prefix)
    }

    /// Create the root prefix.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Return the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate a prefix according to the following rules:
    /// - a prefix is empty (the root prefix) or ends with `/`,
    /// - a prefix does not start with `/`, and
    /// - a prefix has no empty components.
    #[must_use]
    pub fn validate(prefix: &str) -> bool {
        prefix.is_empty()
            || (prefix.ends_with('/') && !prefix.starts_with('/') && !prefix.contains("//"))
    }
}
