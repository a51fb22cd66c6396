// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared RPC error types for node operations.
//!
//! These errors flow through shared futures: every caller that joined a
//! coalesced request receives its own clone of the same failure. Sources are
//! therefore held in [`Arc`] rather than [`Box`].

use std::error::Error as StdError;
use std::sync::Arc;

use super::KeyError;

/// Errors that can occur while talking to a blockchain node.
///
/// # Examples
///
/// ```rust
/// use chaincache::RpcError;
///
/// let error = RpcError::Status {
///     operation: "balance".to_string(),
///     status: 502,
///     body: "bad gateway".to_string(),
/// };
/// println!("Error: {}", error);
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    /// The request never produced a response.
    ///
    /// Covers connection failures, timeouts and TLS errors.
    #[error("Request for {operation} failed")]
    RequestFailed {
        /// The node operation being performed (e.g. `"storage"`)
        operation: String,
        /// The underlying transport error
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// The node answered with a non-success HTTP status.
    #[error("Node returned HTTP {status} for {operation}: {body}")]
    Status {
        /// The node operation being performed
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body, truncated by the client
        body: String,
    },

    /// The response body could not be decoded into the expected type.
    #[error("Failed to decode {operation} response")]
    Decode {
        /// The node operation being performed
        operation: String,
        /// The underlying decode error
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// The request path could not be joined onto the node URL.
    #[error("Invalid request path for {operation}")]
    InvalidPath {
        /// The node operation being performed
        operation: String,
        /// The URL parse error
        #[source]
        source: url::ParseError,
    },

    /// The call arguments could not be turned into a cache key.
    #[error(transparent)]
    Key(#[from] KeyError),
}

impl RpcError {
    /// Helper to create a `RequestFailed` error from any error type.
    pub fn request_failed(
        operation: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        RpcError::RequestFailed {
            operation: operation.into(),
            source: Arc::new(source),
        }
    }

    /// Helper to create a `Decode` error from any error type.
    pub fn decode(
        operation: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        RpcError::Decode {
            operation: operation.into(),
            source: Arc::new(source),
        }
    }

    /// Helper to create a `Status` error.
    pub fn status(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        RpcError::Status {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code if the node answered with one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            RpcError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_request_failed_keeps_source() {
        let err = RpcError::request_failed(
            "balance",
            io::Error::new(io::ErrorKind::TimedOut, "timed out"),
        );

        assert_eq!(err.to_string(), "Request for balance failed");
        let source = err.source().expect("source should be kept");
        assert_eq!(source.to_string(), "timed out");
    }

    #[test]
    fn test_clones_share_the_same_source() {
        let err = RpcError::decode("block", io::Error::other("bad json"));
        let cloned = err.clone();

        match (&err, &cloned) {
            (RpcError::Decode { source: a, .. }, RpcError::Decode { source: b, .. }) => {
                assert!(Arc::ptr_eq(a, b));
            }
            _ => panic!("expected decode errors"),
        }
    }

    #[test]
    fn test_http_status() {
        assert_eq!(RpcError::status("delegate", 404, "").http_status(), Some(404));
        assert_eq!(
            RpcError::request_failed("delegate", io::Error::other("x")).http_status(),
            None
        );
    }
}
