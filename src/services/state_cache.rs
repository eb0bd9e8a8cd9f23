use crate::{error::Result, models::Address, rpc::ContractState};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Contract state snapshots keyed by the address they were read from.
pub type ContractStateCache = StateCache<Address, ContractState>;

/// In-memory memo of fetched values with single-flight fetching per key.
///
/// Entries never expire; callers that need fresh data must `invalidate` the key
/// (or bypass the cache) before reading.
pub struct StateCache<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
    fetch_locks: RwLock<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K, V> Default for StateCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fetch_locks: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> StateCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.write().await.insert(key, value.clone());
        value
    }

    /// Drops the stored value; returns whether one was present.
    pub async fn invalidate(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Returns the stored value for `key`, or runs `fetch` and stores its result.
    ///
    /// # Returns
    /// * `Ok(Some(..))` with the cached or freshly fetched value.
    /// * `Ok(None)` when `fetch` reports absence; absence is not stored.
    /// * `Err(AppError)` from `fetch`; errors are not stored either.
    ///
    /// # Notes
    /// * Concurrent callers for the same key share one fetch: later callers wait
    ///   on the key's fetch lock and re-read the stored value.
    pub async fn get_or_fetch<F, Fut>(&self, key: &K, fetch: F) -> Result<Option<Arc<V>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(Some(value));
        }

        let lock = self.fetch_lock_for(key).await;
        let result = {
            let _guard = lock.lock().await;
            match self.get(key).await {
                Some(value) => Ok(Some(value)),
                None => match fetch().await {
                    Ok(Some(value)) => Ok(Some(self.insert(key.clone(), value).await)),
                    Ok(None) => Ok(None),
                    Err(err) => Err(err),
                },
            }
        };
        self.release_fetch_lock(key, &lock).await;
        result
    }

    // Internal helper that supports `fetch_lock_for` operations.
    async fn fetch_lock_for(&self, key: &K) -> Arc<Mutex<()>> {
        {
            let guard = self.fetch_locks.read().await;
            if let Some(lock) = guard.get(key) {
                return lock.clone();
            }
        }

        let mut guard = self.fetch_locks.write().await;
        guard
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // Drops the key's lock once no other caller is waiting on it.
    async fn release_fetch_lock(&self, key: &K, lock: &Arc<Mutex<()>>) {
        let mut guard = self.fetch_locks.write().await;
        let idle = guard
            .get(key)
            .map(|current| Arc::ptr_eq(current, lock) && Arc::strong_count(current) <= 2)
            .unwrap_or(false);
        if idle {
            guard.remove(key);
        }
    }
}
