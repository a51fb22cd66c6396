// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the chaincache library.
//!
//! It follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling ([`RpcError`],
//!   [`ConfigError`], [`KeyError`])
//! - **Unified error type** ([`ChaincacheError`]) for callers that don't need
//!   to distinguish between error sources
//!
//! The cache layers never invent errors of their own beyond [`KeyError`]:
//! whatever the wrapped fetcher returns is handed to the caller unchanged, and
//! no failure is ever converted into a default value.
//!
//! # Examples
//!
//! ```rust,ignore
//! use chaincache::{BlockRef, ChaincacheError, NodeRpc, RemoteProxy};
//!
//! async fn head_level(proxy: &RemoteProxy<impl NodeRpc>) -> Result<i64, ChaincacheError> {
//!     let header = proxy.block_header(&BlockRef::Head).await?;
//!     Ok(header.level())
//! }
//! ```

mod config;
mod key;
mod rpc;

pub use config::ConfigError;
pub use key::KeyError;
pub use rpc::RpcError;

/// Unified error type for all chaincache operations.
///
/// Module-specific error types convert via `From`, so `?` works naturally.
#[derive(Debug, thiserror::Error)]
pub enum ChaincacheError {
    /// Error from a node request.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Error from configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
