//! Time-bounded memoization with single-flight recomputation.
//!
//! Each key owns an async mutex around its entry. A caller that finds the
//! entry missing or expired hands the computation, together with the lock, to
//! a spawned task. Callers racing a cold key queue behind that task and read
//! its result, and the task finishes and stores its value even when the caller
//! that started it goes away.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

type Slot<T> = Arc<tokio::sync::Mutex<Option<CacheEntry<T>>>>;

pub struct ResultCache<T> {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> ResultCache<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Slot<T> {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.entry(key.to_string()).or_default().clone()
    }

    /// Return the live value for `key`, or run `compute` and store its result.
    ///
    /// At most one `compute` runs per key at a time. Fails only if the
    /// computation panicked or the runtime is shutting down, in which case
    /// nothing is stored.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<T, JoinError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut entry = self.slot(key).lock_owned().await;

        if let Some(cached) = entry.as_ref() {
            if Instant::now() < cached.expires_at {
                debug!(key, "Cache hit");
                return Ok(cached.value.clone());
            }
        }

        debug!(key, "Cache miss");
        let ttl = self.ttl;
        let pending = compute();
        tokio::spawn(async move {
            let value = pending.await;
            *entry = Some(CacheEntry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            });
            value
        })
        .await
    }

    /// The live value for `key`, if any, without computing.
    #[cfg(test)]
    pub async fn peek(&self, key: &str) -> Option<T> {
        let slot = self.slot(key);
        let entry = slot.lock().await;
        entry
            .as_ref()
            .filter(|cached| Instant::now() < cached.expires_at)
            .map(|cached| cached.value.clone())
    }
}
