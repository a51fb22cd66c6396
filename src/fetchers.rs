// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Stale-while-revalidate fetchers for the statistics pipeline.
//!
//! Each fetcher wraps one node read in an [`AsyncResultCache`]. The pipeline
//! reads through these and never waits on a refresh once a value exists.
//! The underlying node is usually a [`RemoteProxy`](crate::RemoteProxy), so a
//! refresh that lands on an unchanged head is itself served from the memoizer.

use futures::future::try_join;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, Instrument};

use crate::cache::{AsyncResultCache, CacheStats};
use crate::client::NodeRpc;
use crate::config::FetcherTtls;
use crate::errors::RpcError;
use crate::spans;
use crate::types::block::{Block, BlockInfo, BlockRef};
use crate::types::tez::Mutez;

/// The cached reads used to compute pool statistics.
///
/// # Example
///
/// ```rust,ignore
/// use chaincache::{ChainFetchers, FetcherTtls};
///
/// let fetchers = ChainFetchers::new(proxy.clone(), FetcherTtls::default());
/// let head = fetchers.warm_up().await?;
/// let storage = fetchers.storage("KT1...").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ChainFetchers {
    endpoint: String,
    head_block: AsyncResultCache<(), Block, RpcError>,
    storage: AsyncResultCache<String, Value, RpcError>,
    balance: AsyncResultCache<String, Mutez, RpcError>,
    constants: AsyncResultCache<(), Value, RpcError>,
}

impl ChainFetchers {
    pub fn new<N: NodeRpc>(node: Arc<N>, ttls: FetcherTtls) -> Self {
        let endpoint = node.endpoint().to_string();

        let head_block = {
            let node = Arc::clone(&node);
            AsyncResultCache::new("head_block", ttls.head_block, move |(): ()| {
                let node = Arc::clone(&node);
                async move { node.block(&BlockRef::Head).await }
            })
        };

        let storage = {
            let node = Arc::clone(&node);
            AsyncResultCache::new("storage", ttls.storage, move |address: String| {
                let node = Arc::clone(&node);
                async move { node.storage(&address, &BlockRef::Head).await }
            })
        };

        let balance = {
            let node = Arc::clone(&node);
            AsyncResultCache::new("balance", ttls.balance, move |address: String| {
                let node = Arc::clone(&node);
                async move { node.balance(&address, &BlockRef::Head).await }
            })
        };

        let constants = AsyncResultCache::new("constants", ttls.constants, move |(): ()| {
            let node = Arc::clone(&node);
            async move { node.constants(&BlockRef::Head).await }
        });

        Self {
            endpoint,
            head_block,
            storage,
            balance,
            constants,
        }
    }

    /// The current head block, at most one refresh behind.
    pub async fn head_block(&self) -> Result<Block, RpcError> {
        self.head_block.get(()).await
    }

    /// Storage of a contract at the current head.
    pub async fn storage(&self, address: &str) -> Result<Value, RpcError> {
        self.storage.get(address.to_string()).await
    }

    /// Balance of an account at the current head.
    pub async fn balance(&self, address: &str) -> Result<Mutez, RpcError> {
        self.balance.get(address.to_string()).await
    }

    /// Protocol constants at the current head.
    pub async fn constants(&self) -> Result<Value, RpcError> {
        self.constants.get(()).await
    }

    /// Populate the head block and constants caches.
    ///
    /// Returns the identity of the head block the caches were filled from.
    pub async fn warm_up(&self) -> Result<BlockInfo, RpcError> {
        async {
            let (block, _constants) = try_join(self.head_block(), self.constants()).await?;
            let head = block.info();
            info!(level = head.level, hash = %head.hash, "Cache warm-up finished");
            Ok(head)
        }
        .instrument(spans::warm_up(&self.endpoint))
        .await
    }

    /// Statistics of every fetcher, by name.
    pub fn stats(&self) -> Vec<(&str, CacheStats)> {
        vec![
            (self.head_block.name(), self.head_block.stats()),
            (self.storage.name(), self.storage.stats()),
            (self.balance.name(), self.balance.stats()),
            (self.constants.name(), self.constants.stats()),
        ]
    }
}
