//! services/api/src/stores/cache.rs
//!
//! Caching and retry primitives shared by the entity stores.
//!
//! Reads are cached per (entity, filter) key and served from memory until a
//! mutation invalidates the entity's cache. Mutations never patch cached
//! values in place; the next read refetches. Only reads retry, with a
//! doubling backoff.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use firesafe_core::ports::PortResult;
use tokio::sync::RwLock;

/// Backoff schedule for read queries. Mutations are never retried.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based), doubling per attempt
    /// and capped at `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `op` up to `1 + max_retries` times, sleeping between attempts.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> PortResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries => {
                tracing::debug!(attempt, error = %e, "read query failed, retrying");
                tokio::time::sleep(policy.delay(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// A keyed cache of list query results. Values are shared via `Arc` so
/// concurrent readers never clone the underlying vector.
pub struct ListCache<T> {
    entries: RwLock<HashMap<String, Arc<Vec<T>>>>,
}

impl<T> ListCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Vec<T>>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn put(&self, key: impl Into<String>, value: Arc<Vec<T>>) {
        self.entries.write().await.insert(key.into(), value);
    }

    /// Drops every cached result for the entity. Called after each mutation.
    pub async fn invalidate(&self) {
        self.entries.write().await.clear();
    }
}

/// A cache for a single value, used by singleton resources such as the
/// company settings row.
pub struct SingletonCache<T> {
    slot: RwLock<Option<T>>,
}

impl<T: Clone> SingletonCache<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<T> {
        self.slot.read().await.clone()
    }

    pub async fn put(&self, value: T) {
        *self.slot.write().await = Some(value);
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}
