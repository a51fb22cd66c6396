// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Default timings and well-known values
//!
//! Centralizes the constants used by the proxy, the fetchers and the node
//! client so defaults are discoverable in one place.

use std::time::Duration;

/// Node used when `RPC_NODE` is not set
pub const DEFAULT_RPC_NODE: &str = "https://uoi3x99n7c.tezosrpc.midl.dev";

/// Environment variables read by [`NodeSettings`](super::NodeSettings)
pub mod env {
    pub const RPC_NODE: &str = "RPC_NODE";
    pub const RPC_RATE_LIMIT: &str = "RPC_RATE_LIMIT";
    pub const RPC_TIMEOUT_SECS: &str = "RPC_TIMEOUT_SECS";
}

/// Proxy timings
pub mod proxy {
    use super::Duration;

    /// Longest a cached head hash is trusted before it is refreshed
    pub const HEAD_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

    /// Window in which concurrent head refreshes collapse into one request
    pub const HEAD_DEBOUNCE: Duration = Duration::from_millis(100);

    /// Default lifetime of a memoized node read
    pub const MEMO_MAX_AGE: Duration = Duration::from_secs(30);
}

/// Stale-while-revalidate lifetimes used by the statistics fetchers
pub mod fetchers {
    use super::Duration;

    pub const HEAD_BLOCK_TTL: Duration = Duration::from_secs(3);
    pub const STORAGE_TTL: Duration = Duration::from_secs(30);
    pub const BALANCE_TTL: Duration = Duration::from_secs(30);

    /// Protocol constants only change on protocol upgrades
    pub const CONSTANTS_TTL: Duration = Duration::from_secs(6 * 60 * 60);
}

/// Node client limits
pub mod client {
    use super::Duration;

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Longest error body kept in [`RpcError::Status`](crate::RpcError::Status)
    pub const MAX_ERROR_BODY_CHARS: usize = 512;
}
