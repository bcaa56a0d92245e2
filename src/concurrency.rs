//! Per-key advisory locks
//!
//! At most one generation is in flight per cache key. Locks are created on
//! first use and dropped from the map once no task holds or waits on them.

use crate::cache::CacheKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct KeyLockManager {
    locks: Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
}

/// Held lock for one key; released on drop
pub struct KeyGuard<'a> {
    manager: &'a KeyLockManager,
    key: CacheKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: CacheKey) -> KeyGuard<'_> {
        let mutex = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(key).or_default())
        };
        let guard = mutex.lock_owned().await;
        KeyGuard {
            manager: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys with a live lock entry.
    pub fn active_keys(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.manager.locks.lock();
        // Only the map's own reference left: nobody holds or waits.
        if let Some(entry) = locks.get(&self.key) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(&self.key);
            }
        }
    }
}
