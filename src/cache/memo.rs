// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! TTL-bounded memoization of an async operation.
//!
//! The entry for a key is installed at call time, before the operation
//! resolves, so concurrent misses on the same key share one upstream call.
//! A failed call stays cached until its entry expires: callers inside the
//! window get the same error back without touching the upstream again.
//!
//! Expired entries are swept from the map at most once per `max_age`, on the
//! next `get` after the sweep is due. Keys that are never asked for again
//! (e.g. reads pinned to an old head) are released that way.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};

use super::{drive, failed, mutex_lock, CacheKey, CacheStats, SharedResult, StatsCounters};
use crate::errors::KeyError;
use crate::spans;

const SOURCE: &str = "cache::memo";

type Call<A, T, E> = Box<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

struct MemoEntry<T, E> {
    future: SharedResult<T, E>,
    expires_at: Instant,
}

/// Memoizes one operation per distinct argument list for `max_age`.
pub struct KeyedMemoizer<A, T, E> {
    operation: String,
    max_age: Duration,
    call: Call<A, T, E>,
    entries: DashMap<CacheKey, MemoEntry<T, E>>,
    next_sweep: Mutex<Instant>,
    stats: StatsCounters,
}

impl<A, T, E> fmt::Debug for KeyedMemoizer<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedMemoizer")
            .field("operation", &self.operation)
            .field("max_age", &self.max_age)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<A, T, E> KeyedMemoizer<A, T, E>
where
    A: Serialize + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + From<KeyError> + fmt::Display + Send + Sync + 'static,
{
    /// Memoize `call` under the name `operation`, which prefixes every key.
    pub fn new<F, Fut>(operation: impl Into<String>, max_age: Duration, call: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            operation: operation.into(),
            max_age,
            call: Box::new(move |args| call(args).boxed()),
            entries: DashMap::new(),
            next_sweep: Mutex::new(Instant::now() + max_age),
            stats: StatsCounters::default(),
        }
    }

    /// Return the in-flight or settled call for `args` if it is younger than
    /// `max_age`, otherwise start a new one.
    pub fn get(&self, args: A) -> SharedResult<T, E> {
        let key = match CacheKey::for_operation(&self.operation, &args) {
            Ok(key) => key,
            Err(err) => return failed(E::from(err)),
        };
        let now = Instant::now();
        self.sweep_if_due(now);

        let call = match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if now < occupied.get().expires_at {
                    self.stats.hit();
                    debug!(operation = %self.operation, key = %occupied.key(), "Memo hit");
                    return occupied.get().future.clone();
                }

                self.stats.miss();
                self.stats.refresh();
                debug!(operation = %self.operation, key = %occupied.key(), "Memo entry expired");
                let call = self.start_call(occupied.key(), args);
                occupied.insert(MemoEntry {
                    future: call.clone(),
                    expires_at: now + self.max_age,
                });
                call
            }
            Entry::Vacant(vacant) => {
                self.stats.miss();
                debug!(operation = %self.operation, key = %vacant.key(), "Memo miss");
                let call = self.start_call(vacant.key(), args);
                vacant.insert(MemoEntry {
                    future: call.clone(),
                    expires_at: now + self.max_age,
                });
                call
            }
        };

        drive(&call);
        call
    }

    /// Whether an unexpired entry exists for `args`.
    pub fn contains(&self, args: &A) -> bool {
        let Ok(key) = CacheKey::for_operation(&self.operation, args) else {
            return false;
        };
        self.entries
            .get(&key)
            .is_some_and(|entry| Instant::now() < entry.expires_at)
    }

    /// Number of entries, including expired ones not yet replaced.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries now, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.remove_expired(Instant::now())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    fn sweep_if_due(&self, now: Instant) {
        {
            let mut next_sweep = mutex_lock(&self.next_sweep, SOURCE, "sweep_if_due");
            if now < *next_sweep {
                return;
            }
            *next_sweep = now + self.max_age;
        }

        let removed = self.remove_expired(now);
        if removed > 0 {
            debug!(operation = %self.operation, removed, remaining = self.entries.len(), "Swept expired memo entries");
        }
    }

    fn remove_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = now < entry.expires_at;
            if !live {
                removed += 1;
                self.stats.eviction();
            }
            live
        });
        removed
    }

    fn start_call(&self, key: &CacheKey, args: A) -> SharedResult<T, E> {
        let pending = (self.call)(args);
        let span = spans::memo_call(&self.operation, key);
        let operation = self.operation.clone();
        let key = key.clone();

        async move {
            let result = pending.await;
            if let Err(err) = &result {
                warn!(operation = %operation, key = %key, error = %err, "Memoized call failed, error cached until expiry");
            }
            result
        }
        .instrument(span)
        .boxed()
        .shared()
    }
}
