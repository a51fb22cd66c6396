// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # chaincache
//!
//! Caching layer for a slow, rate-sensitive blockchain node.
//!
//! - [`AsyncResultCache`]: stale-while-revalidate cache around any async fetcher
//! - [`KeyedMemoizer`]: TTL-bounded memoization that coalesces concurrent misses
//! - [`HeadResolver`]: debounced tracking of the node's current head
//! - [`RemoteProxy`]: a [`NodeRpc`] decorator that pins "current" reads to a
//!   concrete head hash and memoizes them per operation
//!
//! ## Example
//!
//! ```rust,ignore
//! use chaincache::{BlockRef, HttpNodeClient, NodeRpc, ProxyConfig, RemoteProxy};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let client = HttpNodeClient::new("https://rpc.tzkt.io/mainnet", Duration::from_secs(30))?;
//! let proxy = RemoteProxy::new(Arc::new(client), ProxyConfig::default());
//!
//! let balance = proxy.balance("tz1...", &BlockRef::Head).await?;
//! ```

pub mod bootstrap;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod fetchers;
pub mod proxy;
mod spans;
pub mod types;

pub use cache::{AsyncResultCache, CacheKey, CacheStats, KeyedMemoizer, PermanentCache, SharedResult};
pub use client::{HttpNodeClient, NodeRpc, RateLimiter};
pub use config::{FetcherTtls, NodeSettings, ProxyConfig, ProxyConfigBuilder};
pub use errors::{ChaincacheError, ConfigError, KeyError, RpcError};
pub use fetchers::ChainFetchers;
pub use proxy::{HeadResolver, HeadState, HeadStatus, Operation, RemoteProxy};
pub use types::block::{Block, BlockHeader, BlockId, BlockInfo, BlockRef, ShellHeader, HEAD};
pub use types::contract::Entrypoints;
pub use types::tez::Mutez;
