// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the head-pinning memoizing proxy.

mod helpers;

use chaincache::{
    BlockRef, ChainFetchers, FetcherTtls, HeadStatus, NodeRpc, Operation, ProxyConfig,
    ProxyConfigBuilder, RemoteProxy,
};
use futures::future::join_all;
use helpers::{MockNode, CHAIN_ID};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{advance, sleep};

fn proxy_with(node: MockNode, config: ProxyConfig) -> (RemoteProxy<MockNode>, Arc<MockNode>) {
    let node = Arc::new(node);
    (RemoteProxy::new(Arc::clone(&node), config), node)
}

fn proxy() -> (RemoteProxy<MockNode>, Arc<MockNode>) {
    proxy_with(MockNode::new(), ProxyConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_head_reads_are_pinned_and_memoized() {
    let (proxy, node) = proxy();

    let first = proxy.storage("KT1pool", &BlockRef::Head).await.unwrap();
    let second = proxy.storage("KT1pool", &BlockRef::Head).await.unwrap();

    assert_eq!(first, json!({ "address": "KT1pool", "block": "BLhead1", "call": 1 }));
    assert_eq!(first, second);
    assert_eq!(node.calls("block_hash"), 1);
    assert_eq!(node.calls("storage"), 1);

    let stats = proxy.stats(Operation::Storage);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_new_head_yields_new_key() {
    let (proxy, node) = proxy();

    proxy.storage("KT1pool", &BlockRef::Head).await.unwrap();
    advance(Duration::from_secs(2)).await;

    let later = proxy.storage("KT1pool", &BlockRef::Head).await.unwrap();
    assert_eq!(later["block"], "BLhead2");
    assert_eq!(node.calls("block_hash"), 2);
    assert_eq!(node.calls("storage"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_head_reads_makes_one_request_each() {
    let (proxy, node) = proxy();

    let results = join_all((0..20).map(|_| proxy.balance("tz1abc", &BlockRef::Head))).await;

    for result in results {
        assert_eq!(result.unwrap().as_u64(), 1_000_000);
    }
    assert_eq!(node.calls("block_hash"), 1);
    assert_eq!(node.calls("balance"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pinned_reads_skip_head_resolution() {
    let (proxy, node) = proxy();
    let pinned = BlockRef::at("BLpinned");

    let first = proxy.storage("KT1pool", &pinned).await.unwrap();
    let second = proxy.storage("KT1pool", &pinned).await.unwrap();

    assert_eq!(first["block"], "BLpinned");
    assert_eq!(first, second);
    assert_eq!(node.calls("block_hash"), 0);
    assert_eq!(node.calls("storage"), 1);
    assert_eq!(proxy.head().status(), HeadStatus::Unknown);
}

#[tokio::test(start_paused = true)]
async fn test_pinned_and_head_reads_are_cached_apart() {
    let (proxy, node) = proxy();

    let head = proxy.constants(&BlockRef::Head).await.unwrap();
    let pinned = proxy.constants(&BlockRef::at("BLhead1")).await.unwrap();

    // the head resolved to BLhead1, so both reads land on the same key
    assert_eq!(head, pinned);
    assert_eq!(node.calls("constants"), 1);

    let other = proxy.constants(&BlockRef::at("BLother")).await.unwrap();
    assert_eq!(other["block"], "BLother");
    assert_eq!(node.calls("constants"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failures_stay_cached_for_max_age() {
    let (proxy, node) = proxy_with(
        MockNode::new(),
        ProxyConfigBuilder::new()
            .refresh_interval(Duration::from_secs(60))
            .operation_max_age(Operation::Balance, Duration::from_secs(5))
            .build(),
    );
    node.fail_next("balance", 1);

    assert!(proxy.balance("tz1abc", &BlockRef::Head).await.is_err());
    advance(Duration::from_secs(2)).await;
    assert!(proxy.balance("tz1abc", &BlockRef::Head).await.is_err());
    assert_eq!(node.calls("balance"), 1);

    advance(Duration::from_secs(5)).await;
    assert!(proxy.balance("tz1abc", &BlockRef::Head).await.is_ok());
    assert_eq!(node.calls("balance"), 2);
    assert_eq!(node.calls("block_hash"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_head_failure_propagates_without_reading() {
    let (proxy, node) = proxy();
    node.fail_next("block_hash", 1);

    let err = proxy.script("KT1pool", &BlockRef::Head).await.unwrap_err();
    assert_eq!(err.http_status(), Some(503));
    assert_eq!(node.calls("script"), 0);

    assert!(proxy.script("KT1pool", &BlockRef::Head).await.is_ok());
    assert_eq!(node.calls("script"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_entrypoints_cached_for_proxy_lifetime() {
    let (proxy, node) = proxy();

    let first = proxy.entrypoints("KT1pool", &BlockRef::Head).await.unwrap();
    advance(Duration::from_secs(3600)).await;
    let later = proxy.entrypoints("KT1pool", &BlockRef::Head).await.unwrap();
    let pinned = proxy
        .entrypoints("KT1pool", &BlockRef::at("BLold"))
        .await
        .unwrap();

    assert!(first.contains("entrypoint_1"));
    assert_eq!(first, later);
    assert_eq!(first, pinned);
    assert_eq!(node.calls("entrypoints"), 1);
    // served before any head resolution
    assert_eq!(node.calls("block_hash"), 1);

    let other = proxy.entrypoints("KT1other", &BlockRef::Head).await.unwrap();
    assert!(other.contains("entrypoint_2"));
}

#[tokio::test(start_paused = true)]
async fn test_entrypoints_failure_not_stored_permanently() {
    let (proxy, node) = proxy();
    node.fail_next("entrypoints", 1);

    assert!(proxy.entrypoints("KT1pool", &BlockRef::Head).await.is_err());

    // past the memo lifetime the lookup is retried and then kept
    advance(Duration::from_secs(31)).await;
    let value = proxy.entrypoints("KT1pool", &BlockRef::Head).await.unwrap();
    assert!(value.contains("entrypoint_2"));
    assert_eq!(node.calls("entrypoints"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_proxies_do_not_share_state() {
    let node = Arc::new(MockNode::new());
    let a = RemoteProxy::new(Arc::clone(&node), ProxyConfig::default());
    let b = RemoteProxy::new(Arc::clone(&node), ProxyConfig::default());

    a.entrypoints("KT1pool", &BlockRef::Head).await.unwrap();
    b.entrypoints("KT1pool", &BlockRef::Head).await.unwrap();
    a.storage("KT1pool", &BlockRef::at("BLx")).await.unwrap();
    b.storage("KT1pool", &BlockRef::at("BLx")).await.unwrap();

    // same node and endpoint, but every tier belongs to its own proxy
    assert_eq!(node.calls("block_hash"), 2);
    assert_eq!(node.calls("entrypoints"), 2);
    assert_eq!(node.calls("storage"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_chain_id_cached_per_endpoint() {
    let (proxy, node) = proxy_with(
        MockNode::new().with_endpoint("http://node.one"),
        ProxyConfig::default(),
    );

    let ids = join_all((0..5).map(|_| proxy.chain_id())).await;
    for id in ids {
        assert_eq!(id.unwrap(), CHAIN_ID);
    }

    advance(Duration::from_secs(3600)).await;
    assert_eq!(proxy.chain_id().await.unwrap(), CHAIN_ID);
    assert_eq!(node.calls("chain_id"), 1);
    assert_eq!(proxy.endpoint(), "http://node.one");
}

#[tokio::test(start_paused = true)]
async fn test_block_hash_uses_resolver_for_head_only() {
    let (proxy, node) = proxy();

    assert_eq!(proxy.block_hash(&BlockRef::Head).await.unwrap().as_str(), "BLhead1");
    assert_eq!(proxy.block_hash(&BlockRef::Head).await.unwrap().as_str(), "BLhead1");
    assert_eq!(node.calls("block_hash"), 1);

    // pinned hashes go straight to the node, uncached
    proxy.block_hash(&BlockRef::at("BLx")).await.unwrap();
    proxy.block_hash(&BlockRef::at("BLx")).await.unwrap();
    assert_eq!(node.calls("block_hash"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_every_operation_is_memoized() {
    let (proxy, node) = proxy();
    let head = BlockRef::Head;

    for _ in 0..2 {
        proxy.balance("tz1", &head).await.unwrap();
        proxy.live_blocks(&head).await.unwrap();
        proxy.storage("KT1", &head).await.unwrap();
        proxy.script("KT1", &head).await.unwrap();
        proxy.contract("KT1", &head).await.unwrap();
        assert_eq!(
            proxy.manager_key("tz1", &head).await.unwrap().as_deref(),
            Some("edpkMock")
        );
        assert_eq!(proxy.delegate("tz1", &head).await.unwrap(), None);
        proxy.big_map_expr("42", "exprKey", &head).await.unwrap();
        proxy.delegates("tz1baker", &head).await.unwrap();
        proxy.constants(&head).await.unwrap();
        proxy.block(&head).await.unwrap();
        proxy.block_header(&head).await.unwrap();
        proxy.block_metadata(&head).await.unwrap();
    }

    for operation in [
        "balance",
        "live_blocks",
        "storage",
        "script",
        "contract",
        "manager_key",
        "delegate",
        "big_map_expr",
        "delegates",
        "constants",
        "block",
        "block_header",
        "block_metadata",
    ] {
        assert_eq!(node.calls(operation), 1, "{operation} should be called once");
    }
    assert_eq!(node.calls("block_hash"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_operation_max_age_overrides() {
    let (proxy, node) = proxy_with(
        MockNode::new(),
        ProxyConfigBuilder::new()
            .refresh_interval(Duration::from_secs(3600))
            .max_age(Duration::from_secs(10))
            .operation_max_age(Operation::Constants, Duration::from_secs(600))
            .build(),
    );

    proxy.constants(&BlockRef::Head).await.unwrap();
    proxy.balance("tz1", &BlockRef::Head).await.unwrap();
    advance(Duration::from_secs(11)).await;
    proxy.constants(&BlockRef::Head).await.unwrap();
    proxy.balance("tz1", &BlockRef::Head).await.unwrap();

    assert_eq!(node.calls("constants"), 1);
    assert_eq!(node.calls("balance"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fetchers_serve_stale_head_block() {
    let node = Arc::new(MockNode::new());
    let proxy = Arc::new(RemoteProxy::new(Arc::clone(&node), ProxyConfig::default()));
    let fetchers = ChainFetchers::new(Arc::clone(&proxy), FetcherTtls::default());

    let head = fetchers.warm_up().await.unwrap();
    assert_eq!(head.hash.as_str(), "BLhead1");
    assert_eq!(head.level, 5_000_000);
    assert_eq!(node.calls("block"), 1);
    assert_eq!(node.calls("constants"), 1);

    // past the 3s TTL: the old block is returned while a refresh runs
    advance(Duration::from_secs(4)).await;
    let stale = fetchers.head_block().await.unwrap();
    assert_eq!(stale.hash.as_str(), "BLhead1");

    sleep(Duration::from_millis(500)).await;
    let fresh = fetchers.head_block().await.unwrap();
    assert_eq!(fresh.hash.as_str(), "BLhead2");
    assert_eq!(node.calls("block"), 2);

    // constants are still within their 6h TTL
    fetchers.constants().await.unwrap();
    assert_eq!(node.calls("constants"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_entries_for_old_heads_are_released() {
    let (proxy, node) = proxy();
    let max_age = proxy.config().get_max_age(Operation::Block);

    for _ in 0..200 {
        advance(Duration::from_secs(2)).await;
        proxy.block(&BlockRef::Head).await.unwrap();

        // at most two max_age windows of heads are ever held
        let entries = proxy.stats(Operation::Block).entries;
        assert!(entries <= 32, "{entries} block entries held");
    }
    assert_eq!(node.calls("block"), 200);

    advance(max_age * 4).await;
    proxy.block(&BlockRef::Head).await.unwrap();

    let stats = proxy.stats(Operation::Block);
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.evictions, 200);
}
