// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for chaincache operations.
//!
//! Telemetry is kept apart from the caching logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here and the
//! caller attaches it to its future.
//!
//! Usage pattern:
//! ```rust,ignore
//! let call = async move { client.balance(&address, &block).await }
//!     .instrument(spans::memo_call(operation, &key));
//! ```

use tracing::{Level, Span};

use crate::cache::CacheKey;

/// Create span for one upstream fetch started by a stale-while-revalidate cache.
///
/// Covers both cold misses and background refreshes.
///
/// Parent: the caller that triggered the fetch
/// Children: node_request spans made by the fetcher
#[inline]
pub(crate) fn swr_fetch(cache: &str, key: &CacheKey) -> Span {
    tracing::debug_span!("chaincache.swr_fetch", cache = cache, key = %key)
}

/// Create span for one memoized upstream call.
///
/// Parent: the proxy read that missed the memoizer
/// Children: node_request span
#[inline]
pub(crate) fn memo_call(operation: &str, key: &CacheKey) -> Span {
    tracing::debug_span!("chaincache.memo_call", operation = operation, key = %key)
}

/// Create span for a debounced head refresh.
///
/// Parent: the first caller that found the head unknown or stale
/// Children: node_request span for the head hash
#[inline]
pub(crate) fn head_refresh(endpoint: &str, generation: u64) -> Span {
    tracing::debug_span!(
        "chaincache.head_refresh",
        endpoint = endpoint,
        generation = generation,
    )
}

/// Create span for a single HTTP request to the node.
///
/// Parent: memo_call, head_refresh or a direct client call
/// Children: None
#[inline]
pub(crate) fn node_request(operation: &str, path: &str) -> Span {
    tracing::trace_span!("chaincache.node_request", operation = operation, path = path)
}

/// Create span for the startup cache warm-up.
///
/// Parent: None (root span for this operation)
/// Children: swr_fetch spans for the head block and constants
#[inline]
pub(crate) fn warm_up(endpoint: &str) -> Span {
    tracing::span!(Level::INFO, "chaincache.warm_up", endpoint = endpoint)
}
