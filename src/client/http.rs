// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the Tezos shell RPC.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace, warn, Instrument};
use url::Url;

use super::{NodeRpc, RateLimiter};
use crate::config::constants::client::MAX_ERROR_BODY_CHARS;
use crate::config::NodeSettings;
use crate::errors::{ConfigError, RpcError};
use crate::spans;
use crate::types::block::{Block, BlockHeader, BlockId, BlockRef};
use crate::types::contract::Entrypoints;
use crate::types::tez::Mutez;

/// Plain, uncached client for a node's `/chains/main/...` endpoints.
///
/// # Example
///
/// ```rust,ignore
/// use chaincache::{BlockRef, HttpNodeClient, NodeRpc, RateLimiter};
/// use std::time::Duration;
///
/// let client = HttpNodeClient::new("https://rpc.tzkt.io/mainnet", Duration::from_secs(30))?
///     .with_rate_limit(RateLimiter::per_second(10));
/// let header = client.block_header(&BlockRef::Head).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    http: reqwest::Client,
    base: Url,
    endpoint: String,
    rate_limiter: Option<RateLimiter>,
}

impl HttpNodeClient {
    /// Create a client for the node at `endpoint`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        // a trailing slash keeps Url::join from dropping the last path segment
        let base = Url::parse(&format!("{endpoint}/")).map_err(|source| {
            ConfigError::InvalidUrl {
                url: endpoint.clone(),
                source,
            }
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base,
            endpoint,
            rate_limiter: None,
        })
    }

    /// Create a client from environment-derived settings.
    pub fn from_settings(settings: &NodeSettings) -> Result<Self, ConfigError> {
        let client = Self::new(&settings.rpc_node, settings.timeout)?;
        Ok(match settings.rate_limit {
            Some(requests) => client.with_rate_limit(RateLimiter::per_second(requests)),
            None => client,
        })
    }

    /// Throttle every request through `limiter`.
    pub fn with_rate_limit(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    fn url(&self, operation: &str, path: &str) -> Result<Url, RpcError> {
        self.base
            .join(path)
            .map_err(|source| RpcError::InvalidPath {
                operation: operation.to_string(),
                source,
            })
    }

    /// GET `path`, returning `None` on 404.
    async fn get_optional<T>(&self, operation: &'static str, path: &str) -> Result<Option<T>, RpcError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(operation, path)?;

        async {
            if let Some(limiter) = &self.rate_limiter {
                limiter.acquire().await;
            }

            trace!(url = %url, "Sending node request");
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| RpcError::request_failed(operation, e))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!(operation, "Node returned 404");
                return Ok(None);
            }

            if !status.is_success() {
                let body = error_body(operation, response.text().await);
                warn!(operation, status = status.as_u16(), "Node request failed");
                return Err(RpcError::status(operation, status.as_u16(), body));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| RpcError::request_failed(operation, e))?;
            serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| RpcError::decode(operation, e))
        }
        .instrument(spans::node_request(operation, path))
        .await
    }

    /// GET `path`, treating 404 like any other error status.
    async fn get<T>(&self, operation: &'static str, path: &str) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        self.get_optional(operation, path)
            .await?
            .ok_or_else(|| RpcError::status(operation, StatusCode::NOT_FOUND.as_u16(), path))
    }
}

/// Truncated error body for [`RpcError::Status`]; empty if the body could not be read.
fn error_body<E: std::fmt::Display>(operation: &str, body: Result<String, E>) -> String {
    match body {
        Ok(body) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        Err(e) => {
            debug!(operation, error = %e, "Failed to read error response body");
            String::new()
        }
    }
}

fn block_path(block: &BlockRef, tail: &str) -> String {
    if tail.is_empty() {
        format!("chains/main/blocks/{block}")
    } else {
        format!("chains/main/blocks/{block}/{tail}")
    }
}

fn contract_path(block: &BlockRef, address: &str, tail: &str) -> String {
    let contract = format!("context/contracts/{address}");
    if tail.is_empty() {
        block_path(block, &contract)
    } else {
        block_path(block, &format!("{contract}/{tail}"))
    }
}

#[async_trait]
impl NodeRpc for HttpNodeClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_hash(&self, block: &BlockRef) -> Result<BlockId, RpcError> {
        self.get("block_hash", &block_path(block, "hash")).await
    }

    async fn balance(&self, address: &str, block: &BlockRef) -> Result<Mutez, RpcError> {
        self.get("balance", &contract_path(block, address, "balance"))
            .await
    }

    async fn live_blocks(&self, block: &BlockRef) -> Result<Vec<BlockId>, RpcError> {
        self.get("live_blocks", &block_path(block, "live_blocks"))
            .await
    }

    async fn storage(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.get("storage", &contract_path(block, address, "storage"))
            .await
    }

    async fn script(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.get("script", &contract_path(block, address, "script"))
            .await
    }

    async fn contract(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.get("contract", &contract_path(block, address, ""))
            .await
    }

    async fn entrypoints(
        &self,
        contract: &str,
        block: &BlockRef,
    ) -> Result<Entrypoints, RpcError> {
        self.get("entrypoints", &contract_path(block, contract, "entrypoints"))
            .await
    }

    async fn manager_key(
        &self,
        address: &str,
        block: &BlockRef,
    ) -> Result<Option<String>, RpcError> {
        let key: Option<Option<String>> = self
            .get_optional("manager_key", &contract_path(block, address, "manager_key"))
            .await?;
        Ok(key.flatten())
    }

    async fn delegate(&self, address: &str, block: &BlockRef) -> Result<Option<String>, RpcError> {
        let delegate: Option<Option<String>> = self
            .get_optional("delegate", &contract_path(block, address, "delegate"))
            .await?;
        Ok(delegate.flatten())
    }

    async fn big_map_expr(
        &self,
        big_map_id: &str,
        expr: &str,
        block: &BlockRef,
    ) -> Result<Value, RpcError> {
        self.get(
            "big_map_expr",
            &block_path(block, &format!("context/big_maps/{big_map_id}/{expr}")),
        )
        .await
    }

    async fn delegates(&self, address: &str, block: &BlockRef) -> Result<Value, RpcError> {
        self.get(
            "delegates",
            &block_path(block, &format!("context/delegates/{address}")),
        )
        .await
    }

    async fn constants(&self, block: &BlockRef) -> Result<Value, RpcError> {
        self.get("constants", &block_path(block, "context/constants"))
            .await
    }

    async fn block(&self, block: &BlockRef) -> Result<Block, RpcError> {
        self.get("block", &block_path(block, "")).await
    }

    async fn block_header(&self, block: &BlockRef) -> Result<BlockHeader, RpcError> {
        self.get("block_header", &block_path(block, "header"))
            .await
    }

    async fn block_metadata(&self, block: &BlockRef) -> Result<Value, RpcError> {
        self.get("block_metadata", &block_path(block, "metadata"))
            .await
    }

    async fn chain_id(&self) -> Result<String, RpcError> {
        self.get("chain_id", "chains/main/chain_id").await
    }
}
