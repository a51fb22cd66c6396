// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-process caching primitives.
//!
//! Three tiers, each with its own retry philosophy:
//!
//! - [`AsyncResultCache`]: stale-while-revalidate. An expired entry is still
//!   served while a replacement is fetched in the background, and a failed
//!   fetch evicts the key so the next call retries from scratch.
//! - [`KeyedMemoizer`]: TTL-bounded request coalescing. The entry is
//!   registered before the call resolves so concurrent misses share one
//!   upstream request. Failures stay cached until the entry expires.
//! - [`PermanentCache`]: successes kept for the lifetime of the process.
//!
//! Every upstream call is a [`Shared`] future. It is also spawned onto the
//! current Tokio runtime, so it runs to completion even if every caller drops
//! its handle. Nothing here supports cancelling an in-flight call.
//!
//! # Examples
//!
//! ```rust,ignore
//! use chaincache::cache::AsyncResultCache;
//! use std::time::Duration;
//!
//! let pools = AsyncResultCache::new("pools", Duration::from_secs(30), |(): ()| async {
//!     fetch_all_pools().await
//! });
//!
//! // Fresh for 30s, then served stale while refreshing
//! let all = pools.get(()).await?;
//! ```

use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{trace, warn};

mod key;
mod memo;
mod permanent;
mod swr;

pub use key::CacheKey;
pub use memo::KeyedMemoizer;
pub use permanent::PermanentCache;
pub use swr::AsyncResultCache;

/// A cloneable handle on one upstream call; every clone resolves to the same result.
pub type SharedResult<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Calls served from a fresh entry
    pub hits: u64,
    /// Calls that had to wait on a new upstream call
    pub misses: u64,
    /// Calls served a stale value while a refresh started in the background
    pub stale_hits: u64,
    /// Upstream calls started to replace an expired entry
    pub refreshes: u64,
    /// Entries removed because their upstream call failed
    pub evictions: u64,
    /// Current number of entries
    pub entries: usize,
}

impl CacheStats {
    /// Share of calls answered without waiting on a new upstream call, as a
    /// percentage (0.0 to 100.0). Stale hits count as hits.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            (served as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, stale_hits={}, refreshes={}, evictions={}, entries={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.stale_hits,
            self.refreshes,
            self.evictions,
            self.entries,
            self.hit_rate()
        )
    }
}

/// Lock-free counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_hits: AtomicU64,
    refreshes: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// An already-failed shared result.
pub(crate) fn failed<T, E>(err: E) -> SharedResult<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    future::ready(Err(err)).boxed().shared()
}

/// Spawn a driver for `call` so it completes even if every caller walks away.
///
/// Outside a Tokio runtime the call stays lazy and runs when first awaited.
pub(crate) fn drive<T, E>(call: &SharedResult<T, E>)
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(call.clone().map(|_| ()));
        }
        Err(_) => trace!("no Tokio runtime; upstream call runs when first awaited"),
    }
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                "Recovered from poisoned cache lock"
            );
            poisoned.into_inner()
        }
    }
}
