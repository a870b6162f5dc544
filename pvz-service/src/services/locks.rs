//! Per-pickup-point mutual exclusion for the mutating lifecycle operations.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Async mutexes keyed by pickup point id.
///
/// A pickup point owns at most one open reception, so holding its lock also
/// serializes sequence assignment for that reception. Entries are never
/// evicted; the key space is bounded by the number of pickup points.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: Uuid) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard lock is not held across the await.
        let mutex = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}
