// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::info;

use crate::{
    ChainFetchers, ChaincacheError, FetcherTtls, HttpNodeClient, NodeRpc, NodeSettings,
    ProxyConfig, RemoteProxy,
};

/// Main entry point for the application.
///
/// Builds the node client and proxy from the environment, then warms the
/// head block and constants caches.
pub async fn run() -> Result<(), ChaincacheError> {
    let settings = NodeSettings::from_env()?;
    info!(
        rpc_node = %settings.rpc_node,
        rate_limit = ?settings.rate_limit,
        timeout_secs = settings.timeout.as_secs(),
        "Connecting to node"
    );

    let client = HttpNodeClient::from_settings(&settings)?;
    let proxy = Arc::new(RemoteProxy::new(Arc::new(client), ProxyConfig::default()));
    let fetchers = ChainFetchers::new(Arc::clone(&proxy), FetcherTtls::default());

    let head = fetchers.warm_up().await?;
    let chain_id = proxy.chain_id().await?;
    info!(chain_id = %chain_id, level = head.level, timestamp = %head.timestamp, "Ready");

    for (name, stats) in fetchers.stats() {
        info!(cache = name, %stats, "Fetcher cache");
    }

    Ok(())
}
