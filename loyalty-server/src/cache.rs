//! Single-value TTL cache for the loyalty customers list

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::clock::Clock;

struct CacheEntry<T> {
    value: T,
    /// Unix millis
    expires_at: i64,
}

struct CacheState<T> {
    entry: Option<CacheEntry<T>>,
    /// Bumped by every invalidation
    generation: u64,
}

/// A load that started before an invalidation must not fill the cache:
/// callers read [`TtlCache::generation`] before loading and hand it back to
/// [`TtlCache::put_if_current`].
#[derive(Clone)]
pub struct TtlCache<T> {
    state: Arc<RwLock<CacheState<T>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState {
                entry: None,
                generation: 0,
            })),
            clock,
            ttl,
        }
    }

    /// The cached value, if present and not expired
    pub async fn get(&self) -> Option<T> {
        let state = self.state.read().await;
        state
            .entry
            .as_ref()
            .filter(|e| e.expires_at > self.clock.now_millis())
            .map(|e| e.value.clone())
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Store `value` unless the cache was invalidated since `generation`
    /// was read. Returns whether the value was stored.
    pub async fn put_if_current(&self, generation: u64, value: T) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        let expires_at = self
            .clock
            .now_millis()
            .saturating_add(self.ttl.as_millis() as i64);
        state.entry = Some(CacheEntry { value, expires_at });
        true
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.entry = None;
        state.generation = state.generation.wrapping_add(1);
    }
}
