// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for chaincache integration tests
//!
//! Provides a scriptable in-memory node so the caching layers can be tested
//! without a real RPC endpoint.

#![allow(dead_code)]

use async_trait::async_trait;
use chaincache::{
    Block, BlockHeader, BlockId, BlockRef, Entrypoints, Mutez, NodeRpc, RpcError,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const CHAIN_ID: &str = "NetXdQprcVkpaWU";

/// In-memory [`NodeRpc`] with per-operation call counters
///
/// Every `block_hash(head)` call observes a new head: `BLhead1`, `BLhead2`, ...
/// Values returned by other reads embed the per-operation call number, so a
/// test can tell a cached value from a refetched one.
///
/// # Example
///
/// ```rust,ignore
/// let node = MockNode::new().with_latency(Duration::from_millis(50));
/// node.fail_next("balance", 1);
///
/// assert!(node.balance("tz1", &BlockRef::Head).await.is_err());
/// assert_eq!(node.calls("balance"), 1);
/// ```
pub struct MockNode {
    endpoint: String,
    latency: Duration,
    heads: AtomicU64,
    calls: Mutex<HashMap<&'static str, u64>>,
    failures: Mutex<HashMap<&'static str, VecDeque<RpcError>>>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    /// Create a node with no latency and no scripted failures
    pub fn new() -> Self {
        Self {
            endpoint: "http://mock.node".to_string(),
            latency: Duration::ZERO,
            heads: AtomicU64::new(0),
            calls: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Make the next `count` calls of `operation` fail with HTTP 503
    pub fn fail_next(&self, operation: &'static str, count: usize) {
        let mut failures = self.failures.lock().unwrap();
        let queue = failures.entry(operation).or_default();
        for _ in 0..count {
            queue.push_back(RpcError::status(operation, 503, "scripted failure"));
        }
    }

    /// Number of calls that reached `operation`
    pub fn calls(&self, operation: &str) -> u64 {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Total calls across every operation
    pub fn total_calls(&self) -> u64 {
        self.calls.lock().unwrap().values().sum()
    }

    /// Count the call, wait out the latency, then apply any scripted failure.
    ///
    /// Returns the 1-based call number for `operation`.
    async fn enter(&self, operation: &'static str) -> Result<u64, RpcError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(operation).or_insert(0);
            *count += 1;
            *count
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(err) => Err(err),
            None => Ok(n),
        }
    }
}

fn block_id(block: &BlockRef) -> String {
    block.as_str().to_string()
}

fn header_json(block: &BlockRef) -> Value {
    json!({
        "protocol": "PtParisBxoLz5gzMmn3d9WBQNoPSZakgnkMC2VNuQ3KXfUtUQeZ",
        "chain_id": CHAIN_ID,
        "hash": block_id(block),
        "level": 5_000_000,
        "proto": 19,
        "predecessor": "BLparent",
        "timestamp": "2024-06-01T12:00:00Z"
    })
}

#[async_trait]
impl NodeRpc for MockNode {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_hash(&self, block: &BlockRef) -> Result<BlockId, RpcError> {
        self.enter("block_hash").await?;
        match block.pinned() {
            Some(id) => Ok(id.clone()),
            None => {
                let n = self.heads.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(BlockId::new(format!("BLhead{n}")))
            }
        }
    }

    async fn balance(&self, _address: &str, _block: &BlockRef) -> Result<Mutez, RpcError> {
        let n = self.enter("balance").await?;
        Ok(Mutez::new(n * 1_000_000))
    }

    async fn live_blocks(&self, block: &BlockRef) -> Result<Vec<BlockId>, RpcError> {
        self.enter("live_blocks").await?;
        Ok(vec![BlockId::new(block_id(block))])
    }

    async fn storage(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        let n = self.enter("storage").await?;
        Ok(json!({ "address": address, "block": block_id(block), "call": n }))
    }

    async fn script(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        let n = self.enter("script").await?;
        Ok(json!({ "address": address, "block": block_id(block), "call": n }))
    }

    async fn contract(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        let n = self.enter("contract").await?;
        Ok(json!({ "address": address, "block": block_id(block), "call": n }))
    }

    async fn entrypoints(
        &self,
        _contract: &str,
        _block: &BlockRef,
    ) -> Result<Entrypoints, RpcError> {
        let n = self.enter("entrypoints").await?;
        let mut entrypoints = Entrypoints::default();
        entrypoints
            .entrypoints
            .insert(format!("entrypoint_{n}"), json!({ "prim": "unit" }));
        Ok(entrypoints)
    }

    async fn manager_key(
        &self,
        _address: &str,
        _block: &BlockRef,
    ) -> Result<Option<String>, RpcError> {
        self.enter("manager_key").await?;
        Ok(Some("edpkMock".to_string()))
    }

    async fn delegate(&self, _address: &str, _block: &BlockRef) -> Result<Option<String>, RpcError> {
        self.enter("delegate").await?;
        Ok(None)
    }

    async fn big_map_expr(
        &self,
        big_map_id: &str,
        expr: &str,
        block: &BlockRef,
    ) -> Result<Value, RpcError> {
        let n = self.enter("big_map_expr").await?;
        Ok(json!({ "id": big_map_id, "expr": expr, "block": block_id(block), "call": n }))
    }

    async fn delegates(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        let n = self.enter("delegates").await?;
        Ok(json!({ "address": address, "block": block_id(block), "call": n }))
    }

    async fn constants(&self, block: &BlockRef) -> Result<Value, RpcError> {
        let n = self.enter("constants").await?;
        Ok(json!({ "block": block_id(block), "call": n }))
    }

    async fn block(&self, block: &BlockRef) -> Result<Block, RpcError> {
        self.enter("block").await?;
        let raw = json!({
            "protocol": "PtParisBxoLz5gzMmn3d9WBQNoPSZakgnkMC2VNuQ3KXfUtUQeZ",
            "chain_id": CHAIN_ID,
            "hash": block_id(block),
            "header": header_json(block),
        });
        serde_json::from_value(raw).map_err(|e| RpcError::decode("block", e))
    }

    async fn block_header(&self, block: &BlockRef) -> Result<BlockHeader, RpcError> {
        self.enter("block_header").await?;
        serde_json::from_value(header_json(block)).map_err(|e| RpcError::decode("block_header", e))
    }

    async fn block_metadata(&self, block: &BlockRef) -> Result<Value, RpcError> {
        let n = self.enter("block_metadata").await?;
        Ok(json!({ "block": block_id(block), "call": n }))
    }

    async fn chain_id(&self) -> Result<String, RpcError> {
        self.enter("chain_id").await?;
        Ok(CHAIN_ID.to_string())
    }
}
