// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Node clients.
//!
//! [`NodeRpc`] is the read-only capability surface of a Tezos node. Anything
//! that implements it can be wrapped by [`RemoteProxy`](crate::RemoteProxy),
//! which itself implements [`NodeRpc`], so a caching proxy can stand in for
//! a plain client anywhere.
//!
//! - [`HttpNodeClient`]: talks to a node's shell RPC over HTTP
//! - [`RateLimiter`]: token bucket applied before every HTTP request

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RpcError;
use crate::types::block::{Block, BlockHeader, BlockId, BlockRef};
use crate::types::contract::Entrypoints;
use crate::types::tez::Mutez;

mod http;
mod rate_limit;

pub use http::HttpNodeClient;
pub use rate_limit::RateLimiter;

/// Read-only operations of a Tezos node.
///
/// Every block-scoped read takes a [`BlockRef`]; [`BlockRef::Head`] asks for
/// the current state. Implementations must be safe to call concurrently.
#[async_trait]
pub trait NodeRpc: Send + Sync + 'static {
    /// Base URL of the node. Scopes process-lifetime caches.
    fn endpoint(&self) -> &str;

    /// Hash of the referenced block.
    async fn block_hash(&self, block: &BlockRef) -> Result<BlockId, RpcError>;

    /// Spendable balance of an implicit account or contract.
    async fn balance(&self, address: &str, block: &BlockRef) -> Result<Mutez, RpcError>;

    /// Blocks that operations may currently reference as their branch.
    async fn live_blocks(&self, block: &BlockRef) -> Result<Vec<BlockId>, RpcError>;

    /// Contract storage as Micheline JSON.
    async fn storage(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError>;

    /// Contract code and storage as Micheline JSON.
    async fn script(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError>;

    /// Full contract record (balance, delegate, script, counter).
    async fn contract(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError>;

    async fn entrypoints(&self, contract: &str, block: &BlockRef)
        -> Result<Entrypoints, RpcError>;

    /// Revealed public key of a manager, `None` when unrevealed.
    async fn manager_key(&self, address: &str, block: &BlockRef)
        -> Result<Option<String>, RpcError>;

    /// Delegate of an account, `None` when it has none.
    async fn delegate(&self, address: &str, block: &BlockRef) -> Result<Option<String>, RpcError>;

    /// Value stored under a script-expression hash in a big map.
    async fn big_map_expr(
        &self,
        big_map_id: &str,
        expr: &str,
        block: &BlockRef,
    ) -> Result<Value, RpcError>;

    /// Baker record for a delegate address.
    async fn delegates(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError>;

    /// Protocol constants.
    async fn constants(&self, block: &BlockRef) -> Result<Value, RpcError>;

    async fn block(&self, block: &BlockRef) -> Result<Block, RpcError>;

    async fn block_header(&self, block: &BlockRef) -> Result<BlockHeader, RpcError>;

    async fn block_metadata(&self, block: &BlockRef) -> Result<Value, RpcError>;

    /// Chain identifier, constant for the lifetime of a network.
    async fn chain_id(&self) -> Result<String, RpcError>;
}
