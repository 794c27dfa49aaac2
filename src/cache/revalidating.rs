//! Revalidating cache with stampede coalescing.
//!
//! Concurrent misses on one key share a single spawned fetch. The fetch task,
//! not the callers, stores the result, so a value is cached even if every
//! waiter gives up early. Each in-flight fetch carries an id; a fetch removed
//! by [`RevalidatingCache::invalidate`] or [`RevalidatingCache::clear`] still
//! answers its waiters but its result is never stored.
//!
//! Lock order is always `in_flight` before `entries`.

use super::errors::{CacheError, CacheResult};
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome of an underlying fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<V> {
    /// Live data; stored in the cache
    Fresh(V),
    /// Fallback data; returned to waiters but never stored
    Degraded(V),
}

impl<V> Fetched<V> {
    pub fn into_value(self) -> V {
        match self {
            Fetched::Fresh(value) | Fetched::Degraded(value) => value,
        }
    }
}

/// A stored value with its insertion time and invalidation tags
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
    pub tags: HashSet<String>,
}

impl<V> CacheEntry<V> {
    /// Valid while `now - inserted_at <= revalidate`
    pub fn is_fresh(&self, revalidate: Duration) -> bool {
        self.inserted_at.elapsed() <= revalidate
    }
}

type SharedFetch<V> = Shared<BoxFuture<'static, CacheResult<V>>>;

struct InFlight<V> {
    id: u64,
    tags: HashSet<String>,
    fetch: SharedFetch<V>,
}

struct CacheInner<V> {
    name: String,
    revalidate: Duration,
    entries: DashMap<String, CacheEntry<V>>,
    in_flight: Mutex<HashMap<String, InFlight<V>>>,
    next_fetch_id: AtomicU64,
}

/// Time-bounded cache keyed by string, shared by cloning
pub struct RevalidatingCache<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V> Clone for RevalidatingCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for RevalidatingCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevalidatingCache")
            .field("name", &self.inner.name)
            .field("revalidate", &self.inner.revalidate)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}

impl<V> RevalidatingCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, revalidate: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                name: name.into(),
                revalidate,
                entries: DashMap::new(),
                in_flight: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(0),
            }),
        }
    }

    /// Return the fresh value for `key`, or run `fetcher` once for all
    /// concurrent callers and return its result.
    ///
    /// `tags` are attached to the entry created by this call; callers joining
    /// an existing fetch inherit the tags of the caller that started it.
    pub async fn get<F, Fut>(&self, key: &str, tags: &[&str], fetcher: F) -> CacheResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Fetched<V>> + Send + 'static,
    {
        if let Some(value) = self.fresh_value(key) {
            debug!(cache = %self.inner.name, cache_key = key, "Cache hit");
            return Ok(value);
        }

        let fetch = {
            let mut in_flight = self.inner.in_flight.lock();

            // A fetch may have completed between the fast path and the lock
            if let Some(value) = self.fresh_value(key) {
                return Ok(value);
            }

            match in_flight.get(key) {
                Some(pending) => {
                    debug!(cache = %self.inner.name, cache_key = key, "Joining in-flight fetch");
                    pending.fetch.clone()
                }
                None => {
                    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let tags: HashSet<String> = tags.iter().map(|tag| tag.to_string()).collect();
                    let fetch = self.spawn_fetch(key, id, tags.clone(), fetcher());

                    debug!(cache = %self.inner.name, cache_key = key, fetch_id = id, "Cache miss, fetching");
                    in_flight.insert(
                        key.to_string(),
                        InFlight {
                            id,
                            tags,
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };

        fetch.await
    }

    fn spawn_fetch<Fut>(&self, key: &str, id: u64, tags: HashSet<String>, fetch: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Fetched<V>> + Send + 'static,
    {
        let task = tokio::spawn(store_on_completion(
            Arc::clone(&self.inner),
            key.to_string(),
            id,
            tags,
            fetch,
        ));

        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        task.map(move |joined| {
            joined.map_err(|join_error| {
                warn!(cache = %inner.name, cache_key = %key, error = %join_error, "Cache fetch aborted");
                let mut in_flight = inner.in_flight.lock();
                if in_flight.get(&key).is_some_and(|pending| pending.id == id) {
                    in_flight.remove(&key);
                }
                CacheError::FetchAborted {
                    key: key.clone(),
                    reason: join_error.to_string(),
                }
            })
        })
        .boxed()
        .shared()
    }

    fn fresh_value(&self, key: &str) -> Option<V> {
        self.inner
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.inner.revalidate))
            .map(|entry| entry.value.clone())
    }

    /// Drop every entry and in-flight fetch tagged with `tag`.
    ///
    /// Returns the number of stored entries removed.
    pub fn invalidate(&self, tag: &str) -> usize {
        let mut in_flight = self.inner.in_flight.lock();
        in_flight.retain(|_, pending| !pending.tags.contains(tag));

        let before = self.inner.entries.len();
        self.inner.entries.retain(|_, entry| !entry.tags.contains(tag));
        let removed = before - self.inner.entries.len();

        debug!(cache = %self.inner.name, tag = tag, removed = removed, "Cache tag invalidated");
        removed
    }

    pub fn clear(&self) {
        let mut in_flight = self.inner.in_flight.lock();
        in_flight.clear();
        self.inner.entries.clear();
    }

    /// Stored entries, including expired ones not yet replaced
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

async fn store_on_completion<V, Fut>(
    inner: Arc<CacheInner<V>>,
    key: String,
    id: u64,
    tags: HashSet<String>,
    fetch: Fut,
) -> V
where
    V: Clone + Send + Sync + 'static,
    Fut: Future<Output = Fetched<V>>,
{
    let fetched = fetch.await;

    let mut in_flight = inner.in_flight.lock();
    if in_flight.get(&key).is_some_and(|pending| pending.id == id) {
        in_flight.remove(&key);
        if let Fetched::Fresh(value) = &fetched {
            inner.entries.insert(
                key,
                CacheEntry {
                    value: value.clone(),
                    inserted_at: Instant::now(),
                    tags,
                },
            );
        }
    } else {
        debug!(cache = %inner.name, cache_key = %key, fetch_id = id, "Discarding result of abandoned fetch");
    }
    drop(in_flight);

    fetched.into_value()
}
