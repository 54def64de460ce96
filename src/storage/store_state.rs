//! Shared store lifecycle state.

use std::sync::atomic::{AtomicBool, Ordering};

use super::AccessMode;

/// The lifecycle state embedded by store implementations: the access mode and
/// an interior-mutable open flag, so stores operate behind `&self`.
#[derive(Debug)]
pub struct StoreState {
    mode: AccessMode,
    is_open: AtomicBool,
}

impl StoreState {
    /// Create a new closed [`StoreState`] with access mode `mode`.
    #[must_use]
    pub const fn new(mode: AccessMode) -> Self {
        Self {
            mode,
            is_open: AtomicBool::new(false),
        }
    }

    /// Return the access mode.
    #[must_use]
    pub const fn mode(&self) -> &AccessMode {
        &self.mode
    }

    /// Return `true` if the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::Acquire)
    }

    /// Set the open flag.
    pub fn set_is_open(&self, is_open: bool) {
        self.is_open.store(is_open, Ordering::Release);
    }
}
