// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Stale-while-revalidate cache around an async fetcher.
//!
//! Lookup rules for a key derived from the call arguments:
//!
//! - **Cold miss**: call the fetcher and store its future until `now + ttl`.
//! - **Fresh hit**: return the stored future (pending or resolved).
//! - **Stale hit**: replace the entry with a new fetch and a new deadline, but
//!   hand the caller the *previous* future. The caller never waits on the
//!   refresh.
//! - **Failure**: the entry whose fetch failed is removed before the error
//!   reaches anyone awaiting it, so the next call is a cold miss. Callers that
//!   already received an older value are unaffected.
//!
//! Cold misses are not coalesced. Two concurrent first calls for the same key
//! both call the fetcher and the later insert overwrites the earlier one; each
//! caller still receives the result of its own fetch. Use
//! [`KeyedMemoizer`](super::KeyedMemoizer) where one upstream call per key is
//! required.

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};

use super::{drive, failed, CacheKey, CacheStats, SharedResult, StatsCounters};
use crate::errors::KeyError;
use crate::spans;

type Fetcher<A, T, E> = Box<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

struct CacheEntry<T, E> {
    value: SharedResult<T, E>,
    valid_until: Instant,
    generation: u64,
}

struct Inner<A, T, E> {
    name: String,
    ttl: Duration,
    fetcher: Fetcher<A, T, E>,
    entries: DashMap<CacheKey, CacheEntry<T, E>>,
    next_generation: AtomicU64,
    stats: StatsCounters,
}

/// Stale-while-revalidate cache keyed by serialized fetcher arguments.
///
/// Cloning is cheap and every clone shares the same entries.
///
/// # Examples
///
/// ```rust,ignore
/// use chaincache::cache::AsyncResultCache;
/// use std::time::Duration;
///
/// let storage = AsyncResultCache::new("storage", Duration::from_secs(30), move |address: String| {
///     let proxy = proxy.clone();
///     async move { proxy.storage(&address, &BlockRef::Head).await }
/// });
///
/// let value = storage.get("KT1...".to_string()).await?;
/// ```
pub struct AsyncResultCache<A, T, E> {
    inner: Arc<Inner<A, T, E>>,
}

impl<A, T, E> Clone for AsyncResultCache<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T, E> fmt::Debug for AsyncResultCache<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResultCache")
            .field("name", &self.inner.name)
            .field("ttl", &self.inner.ttl)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}

impl<A, T, E> AsyncResultCache<A, T, E>
where
    A: Serialize + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + From<KeyError> + fmt::Display + Send + Sync + 'static,
{
    /// Wrap `fetcher` in a cache whose entries stay fresh for `ttl`.
    ///
    /// `name` identifies the cache in logs and key errors.
    pub fn new<F, Fut>(name: impl Into<String>, ttl: Duration, fetcher: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                ttl,
                fetcher: Box::new(move |args| fetcher(args).boxed()),
                entries: DashMap::new(),
                next_generation: AtomicU64::new(0),
                stats: StatsCounters::default(),
            }),
        }
    }

    /// Get the value for `args`, possibly stale, never blocking on a refresh
    /// when a previous value exists.
    pub fn get(&self, args: A) -> SharedResult<T, E> {
        let key = match CacheKey::for_args(&self.inner.name, &args) {
            Ok(key) => key,
            Err(err) => return failed(E::from(err)),
        };
        let now = Instant::now();

        if let Some(mut entry) = self.inner.entries.get_mut(&key) {
            if now < entry.valid_until {
                self.inner.stats.hit();
                debug!(cache = %self.inner.name, key = %key, "Cache hit");
                return entry.value.clone();
            }

            let stale = entry.value.clone();
            let (generation, refresh) = self.start_fetch(&key, args);
            *entry = CacheEntry {
                value: refresh.clone(),
                valid_until: now + self.inner.ttl,
                generation,
            };
            drop(entry);

            self.inner.stats.stale_hit();
            self.inner.stats.refresh();
            debug!(cache = %self.inner.name, key = %key, "Serving stale value, refreshing in background");
            drive(&refresh);
            return stale;
        }

        self.inner.stats.miss();
        debug!(cache = %self.inner.name, key = %key, "Cache miss");
        let (generation, fetch) = self.start_fetch(&key, args);
        self.inner.entries.insert(
            key,
            CacheEntry {
                value: fetch.clone(),
                valid_until: now + self.inner.ttl,
                generation,
            },
        );
        drive(&fetch);
        fetch
    }

    /// Whether an entry (fresh or stale) exists for `args`.
    pub fn contains(&self, args: &A) -> bool {
        CacheKey::for_args(&self.inner.name, args)
            .map(|key| self.inner.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Drop the entry for `args`, if any.
    pub fn invalidate(&self, args: &A) -> bool {
        CacheKey::for_args(&self.inner.name, args)
            .map(|key| self.inner.entries.remove(&key).is_some())
            .unwrap_or(false)
    }

    /// Number of entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Drop every entry. In-flight fetches still run to completion.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.inner.entries.len())
    }

    fn start_fetch(&self, key: &CacheKey, args: A) -> (u64, SharedResult<T, E>) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let fetch = (self.inner.fetcher)(args);
        let span = spans::swr_fetch(&self.inner.name, key);
        let cache = Arc::downgrade(&self.inner);
        let key = key.clone();

        let call = async move {
            let result = fetch.await;
            if let Err(err) = &result {
                evict_failed(&cache, &key, generation, err);
            }
            result
        }
        .instrument(span)
        .boxed()
        .shared();

        (generation, call)
    }
}

fn evict_failed<A, T, E: fmt::Display>(
    cache: &Weak<Inner<A, T, E>>,
    key: &CacheKey,
    generation: u64,
    err: &E,
) {
    let Some(inner) = cache.upgrade() else {
        return;
    };

    let removed = inner
        .entries
        .remove_if(key, |_, entry| entry.generation == generation)
        .is_some();

    if removed {
        inner.stats.eviction();
        warn!(cache = %inner.name, key = %key, error = %err, "Fetch failed, evicted entry");
    } else {
        warn!(cache = %inner.name, key = %key, error = %err, "Fetch failed after entry was replaced");
    }
}
