// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block-aware memoizing proxy in front of a node client.
//!
//! Every read that asks for the current state is first pinned to a concrete
//! head hash by the [`HeadResolver`], then served by a per-operation
//! [`KeyedMemoizer`] keyed by the arguments plus that hash. Repeated reads
//! against an unchanged head cost nothing; a new head naturally yields new
//! keys. Reads pinned to an explicit block skip the resolver entirely.
//!
//! Two reads are cached for the lifetime of the proxy instead: contract
//! entrypoints (per endpoint and contract) and the chain id (per endpoint).
//!
//! # Example
//!
//! ```rust,ignore
//! use chaincache::{BlockRef, HttpNodeClient, NodeRpc, ProxyConfig, RemoteProxy};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let client = HttpNodeClient::new("https://rpc.tzkt.io/mainnet", Duration::from_secs(30))?;
//! let proxy = RemoteProxy::new(Arc::new(client), ProxyConfig::default());
//!
//! // Both reads hit the node once: same head, same arguments
//! let a = proxy.storage("KT1...", &BlockRef::Head).await?;
//! let b = proxy.storage("KT1...", &BlockRef::Head).await?;
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::cache::{CacheStats, KeyedMemoizer, PermanentCache};
use crate::client::NodeRpc;
use crate::config::ProxyConfig;
use crate::errors::RpcError;
use crate::types::block::{Block, BlockHeader, BlockId, BlockRef};
use crate::types::contract::Entrypoints;
use crate::types::tez::Mutez;

mod head;
mod operation;

pub use head::{HeadResolver, HeadState, HeadStatus};
pub use operation::Operation;

type Memo<A, T> = KeyedMemoizer<A, T, RpcError>;

/// One memoizer per wrapped read.
struct Memoizers {
    balance: Memo<(String, BlockId), Mutez>,
    live_blocks: Memo<(BlockId,), Vec<BlockId>>,
    storage: Memo<(String, BlockId), Value>,
    script: Memo<(String, BlockId), Value>,
    contract: Memo<(String, BlockId), Value>,
    entrypoints: Memo<(String, BlockId), Entrypoints>,
    manager_key: Memo<(String, BlockId), Option<String>>,
    delegate: Memo<(String, BlockId), Option<String>>,
    big_map_expr: Memo<(String, String, BlockId), Value>,
    delegates: Memo<(String, BlockId), Value>,
    constants: Memo<(BlockId,), Value>,
    block: Memo<(BlockId,), Block>,
    block_header: Memo<(BlockId,), BlockHeader>,
    block_metadata: Memo<(BlockId,), Value>,
    chain_id: Memo<(), String>,
}

fn memoize<C, A, T, F, Fut>(
    client: &Arc<C>,
    operation: Operation,
    config: &ProxyConfig,
    call: F,
) -> Memo<A, T>
where
    C: NodeRpc,
    A: Serialize + Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(Arc<C>, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RpcError>> + Send + 'static,
{
    let client = Arc::clone(client);
    KeyedMemoizer::new(
        operation.as_str(),
        config.get_max_age(operation),
        move |args| call(Arc::clone(&client), args),
    )
}

impl Memoizers {
    fn new<C: NodeRpc>(client: &Arc<C>, config: &ProxyConfig) -> Self {
        Self {
            balance: memoize(
                client,
                Operation::Balance,
                config,
                |client: Arc<C>, (address, block): (String, BlockId)| async move {
                    client.balance(&address, &BlockRef::At(block)).await
                },
            ),
            live_blocks: memoize(
                client,
                Operation::LiveBlocks,
                config,
                |client: Arc<C>, (block,): (BlockId,)| async move {
                    client.live_blocks(&BlockRef::At(block)).await
                },
            ),
            storage: memoize(
                client,
                Operation::Storage,
                config,
                |client: Arc<C>, (address, block): (String, BlockId)| async move {
                    client.storage(&address, &BlockRef::At(block)).await
                },
            ),
            script: memoize(
                client,
                Operation::Script,
                config,
                |client: Arc<C>, (address, block): (String, BlockId)| async move {
                    client.script(&address, &BlockRef::At(block)).await
                },
            ),
            contract: memoize(
                client,
                Operation::Contract,
                config,
                |client: Arc<C>, (address, block): (String, BlockId)| async move {
                    client.contract(&address, &BlockRef::At(block)).await
                },
            ),
            entrypoints: memoize(
                client,
                Operation::Entrypoints,
                config,
                |client: Arc<C>, (contract, block): (String, BlockId)| async move {
                    client.entrypoints(&contract, &BlockRef::At(block)).await
                },
            ),
            manager_key: memoize(
                client,
                Operation::ManagerKey,
                config,
                |client: Arc<C>, (address, block): (String, BlockId)| async move {
                    client.manager_key(&address, &BlockRef::At(block)).await
                },
            ),
            delegate: memoize(
                client,
                Operation::Delegate,
                config,
                |client: Arc<C>, (address, block): (String, BlockId)| async move {
                    client.delegate(&address, &BlockRef::At(block)).await
                },
            ),
            big_map_expr: memoize(
                client,
                Operation::BigMapExpr,
                config,
                |client: Arc<C>, (id, expr, block): (String, String, BlockId)| async move {
                    client.big_map_expr(&id, &expr, &BlockRef::At(block)).await
                },
            ),
            delegates: memoize(
                client,
                Operation::Delegates,
                config,
                |client: Arc<C>, (address, block): (String, BlockId)| async move {
                    client.delegates(&address, &BlockRef::At(block)).await
                },
            ),
            constants: memoize(
                client,
                Operation::Constants,
                config,
                |client: Arc<C>, (block,): (BlockId,)| async move {
                    client.constants(&BlockRef::At(block)).await
                },
            ),
            block: memoize(
                client,
                Operation::Block,
                config,
                |client: Arc<C>, (block,): (BlockId,)| async move {
                    client.block(&BlockRef::At(block)).await
                },
            ),
            block_header: memoize(
                client,
                Operation::BlockHeader,
                config,
                |client: Arc<C>, (block,): (BlockId,)| async move {
                    client.block_header(&BlockRef::At(block)).await
                },
            ),
            block_metadata: memoize(
                client,
                Operation::BlockMetadata,
                config,
                |client: Arc<C>, (block,): (BlockId,)| async move {
                    client.block_metadata(&BlockRef::At(block)).await
                },
            ),
            chain_id: memoize(
                client,
                Operation::ChainId,
                config,
                |client: Arc<C>, (): ()| async move { client.chain_id().await },
            ),
        }
    }
}

/// Caching decorator over a [`NodeRpc`] client.
///
/// Owns exactly one [`HeadResolver`] and one memoizer per operation. Nothing
/// is shared between proxy instances, so proxies pointed at different nodes
/// (or built in different tests) never see each other's entries.
pub struct RemoteProxy<C> {
    client: Arc<C>,
    config: ProxyConfig,
    head: HeadResolver<C>,
    memo: Memoizers,
    entrypoints_cache: PermanentCache<Entrypoints>,
    chain_ids: PermanentCache<String>,
}

impl<C> std::fmt::Debug for RemoteProxy<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteProxy")
            .field("config", &self.config)
            .field("head", &self.head)
            .finish_non_exhaustive()
    }
}

impl<C: NodeRpc> RemoteProxy<C> {
    pub fn new(client: Arc<C>, config: ProxyConfig) -> Self {
        let head = HeadResolver::new(
            Arc::clone(&client),
            config.refresh_interval,
            config.debounce,
        );
        let memo = Memoizers::new(&client, &config);

        Self {
            client,
            config,
            head,
            memo,
            entrypoints_cache: PermanentCache::new("entrypoints"),
            chain_ids: PermanentCache::new("chain_id"),
        }
    }

    /// The wrapped client.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The resolver that pins head reads.
    pub fn head(&self) -> &HeadResolver<C> {
        &self.head
    }

    /// Memoizer statistics for one operation.
    pub fn stats(&self, operation: Operation) -> CacheStats {
        let memo = &self.memo;
        match operation {
            Operation::Balance => memo.balance.stats(),
            Operation::LiveBlocks => memo.live_blocks.stats(),
            Operation::Storage => memo.storage.stats(),
            Operation::Script => memo.script.stats(),
            Operation::Contract => memo.contract.stats(),
            Operation::Entrypoints => memo.entrypoints.stats(),
            Operation::ManagerKey => memo.manager_key.stats(),
            Operation::Delegate => memo.delegate.stats(),
            Operation::BigMapExpr => memo.big_map_expr.stats(),
            Operation::Delegates => memo.delegates.stats(),
            Operation::Constants => memo.constants.stats(),
            Operation::Block => memo.block.stats(),
            Operation::BlockHeader => memo.block_header.stats(),
            Operation::BlockMetadata => memo.block_metadata.stats(),
            Operation::ChainId => memo.chain_id.stats(),
        }
    }

    async fn read<A, T>(
        &self,
        memo: &Memo<A, T>,
        block: &BlockRef,
        args: impl FnOnce(BlockId) -> A,
    ) -> Result<T, RpcError>
    where
        A: Serialize + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        let block = self.head.resolve(block).await?;
        memo.get(args(block)).await
    }
}

#[async_trait]
impl<C: NodeRpc> NodeRpc for RemoteProxy<C> {
    fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    async fn block_hash(&self, block: &BlockRef) -> Result<BlockId, RpcError> {
        if block.wants_head() {
            self.head.current().await
        } else {
            self.client.block_hash(block).await
        }
    }

    async fn balance(&self, address: &str, block: &BlockRef) -> Result<Mutez, RpcError> {
        self.read(&self.memo.balance, block, |b| (address.to_string(), b))
            .await
    }

    async fn live_blocks(&self, block: &BlockRef) -> Result<Vec<BlockId>, RpcError> {
        self.read(&self.memo.live_blocks, block, |b| (b,)).await
    }

    async fn storage(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.read(&self.memo.storage, block, |b| (address.to_string(), b))
            .await
    }

    async fn script(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.read(&self.memo.script, block, |b| (address.to_string(), b))
            .await
    }

    async fn contract(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.read(&self.memo.contract, block, |b| (address.to_string(), b))
            .await
    }

    async fn entrypoints(
        &self,
        contract: &str,
        block: &BlockRef,
    ) -> Result<Entrypoints, RpcError> {
        let key = format!("{}_{}", self.client.endpoint(), contract);
        self.entrypoints_cache
            .get_or_try_insert_with(key, || {
                self.read(&self.memo.entrypoints, block, |b| (contract.to_string(), b))
            })
            .await
    }

    async fn manager_key(
        &self,
        address: &str,
        block: &BlockRef,
    ) -> Result<Option<String>, RpcError> {
        self.read(&self.memo.manager_key, block, |b| (address.to_string(), b))
            .await
    }

    async fn delegate(&self, address: &str, block: &BlockRef) -> Result<Option<String>, RpcError> {
        self.read(&self.memo.delegate, block, |b| (address.to_string(), b))
            .await
    }

    async fn big_map_expr(
        &self,
        big_map_id: &str,
        expr: &str,
        block: &BlockRef,
    ) -> Result<Value, RpcError> {
        self.read(&self.memo.big_map_expr, block, |b| {
            (big_map_id.to_string(), expr.to_string(), b)
        })
        .await
    }

    async fn delegates(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.read(&self.memo.delegates, block, |b| (address.to_string(), b))
            .await
    }

    async fn constants(&self, block: &BlockRef) -> Result<Value, RpcError> {
        self.read(&self.memo.constants, block, |b| (b,)).await
    }

    async fn block(&self, block: &BlockRef) -> Result<Block, RpcError> {
        self.read(&self.memo.block, block, |b| (b,)).await
    }

    async fn block_header(&self, block: &BlockRef) -> Result<BlockHeader, RpcError> {
        self.read(&self.memo.block_header, block, |b| (b,)).await
    }

    async fn block_metadata(&self, block: &BlockRef) -> Result<Value, RpcError> {
        self.read(&self.memo.block_metadata, block, |b| (b,)).await
    }

    async fn chain_id(&self) -> Result<String, RpcError> {
        self.chain_ids
            .get_or_try_insert_with(self.client.endpoint().to_string(), || {
                self.memo.chain_id.get(())
            })
            .await
    }
}
