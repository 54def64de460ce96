//! Array synchronizers.
//!
//! A synchronizer provides advisory async mutexes for chunks and for the
//! array as a whole. Arrays hold an optional [`Synchronizer`] by composition;
//! without one, writes run unsynchronized and concurrent read-modify-writes of
//! the same chunk can interleave.

use std::collections::HashMap;
use std::sync::Arc;

use async_lock::{Mutex, MutexGuard};
use async_trait::async_trait;

/// An [`Arc`] wrapped synchronizer.
pub type Synchronizer = Arc<dyn SynchronizerTraits>;

/// A boxed synchronizer mutex.
pub type SynchronizerMutex = Box<dyn SynchronizerMutexTraits>;

/// A boxed synchronizer guard.
pub type SynchronizerGuard<'a> = Box<dyn SynchronizerGuardTraits + 'a>;

/// Synchronizer traits: a provider of chunk and array mutexes.
#[async_trait]
pub trait SynchronizerTraits: Send + Sync + core::fmt::Debug {
    /// Return the mutex for the chunk at `chunk_indices`.
    async fn chunk_mutex(&self, chunk_indices: &[u64]) -> SynchronizerMutex;

    /// Return the mutex for the array as a whole.
    async fn array_mutex(&self) -> SynchronizerMutex;
}

/// Synchronizer mutex traits.
#[async_trait]
pub trait SynchronizerMutexTraits: Send + Sync {
    /// Acquire the mutex, returning a guard which releases it when dropped.
    async fn lock(&self) -> SynchronizerGuard<'_>;
}

/// Synchronizer guard traits.
pub trait SynchronizerGuardTraits: Send + Sync {}

/// The default synchronizer: in-process async mutexes keyed by chunk indices,
/// plus one array mutex.
///
/// Synchronizes writers sharing one synchronizer instance (for example,
/// multiple tasks writing to the same array). It cannot synchronize separate
/// processes.
#[derive(Debug, Default)]
pub struct DefaultSynchronizer {
    chunk_mutexes: Mutex<HashMap<Vec<u64>, Arc<Mutex<()>>>>,
    array_mutex: Arc<Mutex<()>>,
}

impl DefaultSynchronizer {
    /// Create a new default synchronizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SynchronizerTraits for DefaultSynchronizer {
    async fn chunk_mutex(&self, chunk_indices: &[u64]) -> SynchronizerMutex {
        let mut chunk_mutexes = self.chunk_mutexes.lock().await;
        let mutex = chunk_mutexes
            .entry(chunk_indices.to_vec())
            .or_default()
            .clone();
        Box::new(DefaultSynchronizerMutex(mutex))
    }

    async fn array_mutex(&self) -> SynchronizerMutex {
        Box::new(DefaultSynchronizerMutex(self.array_mutex.clone()))
    }
}

/// Mutex for [`DefaultSynchronizer`].
pub struct DefaultSynchronizerMutex(Arc<Mutex<()>>);

#[async_trait]
impl SynchronizerMutexTraits for DefaultSynchronizerMutex {
    async fn lock(&self) -> SynchronizerGuard<'_> {
        Box::new(DefaultSynchronizerGuard {
            _guard: self.0.lock().await,
        })
    }
}

/// Guard for [`DefaultSynchronizerMutex`]. Releases the mutex when dropped.
pub struct DefaultSynchronizerGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl SynchronizerGuardTraits for DefaultSynchronizerGuard<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn synchronizer_chunk_mutex_exclusion() {
        let synchronizer = Arc::new(DefaultSynchronizer::new());
        let counter = Arc::new(parking_lot::Mutex::new(0u64));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let synchronizer = synchronizer.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let mutex = synchronizer.chunk_mutex(&[0, 0]).await;
                let _guard = mutex.lock().await;
                // non-atomic increment under the chunk mutex
                let value = *counter.lock();
                tokio::task::yield_now().await;
                *counter.lock() = value + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*counter.lock(), 32);
    }

    #[tokio::test]
    async fn synchronizer_mutexes_are_shared() {
        let synchronizer = DefaultSynchronizer::new();
        let mutex_a = synchronizer.chunk_mutex(&[1]).await;
        let _guard = mutex_a.lock().await;
        let mutex_b = synchronizer.chunk_mutex(&[1]).await;
        // same chunk: second acquisition must block
        assert!(futures::FutureExt::now_or_never(mutex_b.lock()).is_none());
        let mutex_c = synchronizer.chunk_mutex(&[2]).await;
        // different chunk: free
        assert!(futures::FutureExt::now_or_never(mutex_c.lock()).is_some());
    }
}
