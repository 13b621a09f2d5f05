// ── Stale-while-revalidate TTL cache ──
//
// One entry per resource key ("status", "history:24h", "doors:7d").
// A hit younger than the TTL is served without touching the network.
// Otherwise the caller's fetcher runs; success replaces the entry and
// notifies subscribers, failure falls back to the previous value if any.
//
// Concurrent misses for the same key are NOT coalesced: each caller runs
// its own fetch and the last one to finish wins.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

const UPDATE_CHANNEL_SIZE: usize = 64;

/// How a [`CacheRead`] was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Served from cache, younger than the TTL.
    Cached,
    /// Fetched from the network just now.
    Fetched,
    /// Fetch failed; this is the last good value.
    Stale { error: String },
}

/// A value handed out by the cache plus where it came from.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    pub value: Arc<T>,
    pub freshness: Freshness,
    /// Time since the value was fetched.
    pub age: Duration,
}

impl<T> CacheRead<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self.freshness, Freshness::Stale { .. })
    }
}

/// Broadcast to subscribers whenever a key is (re)filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUpdate {
    pub key: String,
}

struct Entry<T> {
    value: Arc<T>,
    fetched_at: Instant,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            fetched_at: self.fetched_at,
        }
    }
}

/// Per-key TTL cache with stale fallback.
pub struct TtlCache<T> {
    entries: DashMap<String, Entry<T>>,
    ttl: Duration,
    updates: broadcast::Sender<CacheUpdate>,
}

impl<T: Send + Sync + 'static> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self::with_sender(ttl, updates)
    }

    /// Share one update channel across several caches.
    pub fn with_sender(ttl: Duration, updates: broadcast::Sender<CacheUpdate>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            updates,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Register a listener for fill notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheUpdate> {
        self.updates.subscribe()
    }

    /// Return the cached value for `key` if fresh, otherwise run `fetch`.
    ///
    /// On fetch failure the previous value (however old) is returned as
    /// [`Freshness::Stale`]. With nothing cached the error propagates.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<CacheRead<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        // Clone out of the map so no shard lock is held across the await.
        let previous = self.entries.get(key).map(|e| e.value().clone());

        if let Some(ref entry) = previous {
            let age = entry.fetched_at.elapsed();
            if age < self.ttl {
                debug!(key, ?age, "cache hit");
                return Ok(CacheRead {
                    value: Arc::clone(&entry.value),
                    freshness: Freshness::Cached,
                    age,
                });
            }
        }

        match fetch().await {
            Ok(value) => Ok(self.insert(key, value)),
            Err(err) => match previous {
                Some(entry) => {
                    warn!(key, error = %err, "fetch failed, serving stale value");
                    Ok(CacheRead {
                        value: entry.value,
                        freshness: Freshness::Stale {
                            error: err.to_string(),
                        },
                        age: entry.fetched_at.elapsed(),
                    })
                }
                None => Err(err),
            },
        }
    }

    /// Store a freshly fetched value and notify subscribers.
    pub fn insert(&self, key: &str, value: T) -> CacheRead<T> {
        let value = Arc::new(value);
        self.entries.insert(
            key.to_owned(),
            Entry {
                value: Arc::clone(&value),
                fetched_at: Instant::now(),
            },
        );
        // No receivers is fine.
        let _ = self.updates.send(CacheUpdate {
            key: key.to_owned(),
        });
        CacheRead {
            value,
            freshness: Freshness::Fetched,
            age: Duration::ZERO,
        }
    }

    /// Last stored value regardless of age.
    pub fn peek(&self, key: &str) -> Option<Arc<T>> {
        self.entries.get(key).map(|e| Arc::clone(&e.value))
    }

    /// Force the next read of `key` to hit the network.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
