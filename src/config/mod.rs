// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for chaincache
//!
//! - [`ProxyConfig`]: head refresh timing and memo lifetimes of a
//!   [`RemoteProxy`](crate::RemoteProxy)
//! - [`FetcherTtls`]: stale-while-revalidate lifetimes of the statistics fetchers
//! - [`NodeSettings`]: which node to talk to, loaded from the environment
//!
//! # Example: Using defaults
//!
//! ```rust
//! use chaincache::ProxyConfig;
//!
//! // 1s head refresh, 100ms debounce, 30s memo lifetime
//! let config = ProxyConfig::default();
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use chaincache::{Operation, ProxyConfigBuilder};
//! use std::time::Duration;
//!
//! let config = ProxyConfigBuilder::with_defaults()
//!     .refresh_interval(Duration::from_secs(5))
//!     .operation_max_age(Operation::Constants, Duration::from_secs(600))
//!     .build();
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::errors::ConfigError;
use crate::proxy::Operation;

pub mod constants;

use constants::{client, env, fetchers, proxy, DEFAULT_RPC_NODE};

/// Timing configuration for a [`RemoteProxy`](crate::RemoteProxy)
///
/// Use [`ProxyConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// How long a resolved head hash is trusted
    /// Default: 1 second
    pub refresh_interval: Duration,

    /// Window in which concurrent head refreshes share one request
    /// Default: 100 milliseconds
    pub debounce: Duration,

    /// Lifetime of a memoized read
    /// Default: 30 seconds
    pub max_age: Duration,

    /// Per-operation memo lifetimes
    pub overrides: HashMap<Operation, Duration>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            refresh_interval: proxy::HEAD_REFRESH_INTERVAL,
            debounce: proxy::HEAD_DEBOUNCE,
            max_age: proxy::MEMO_MAX_AGE,
            overrides: HashMap::new(),
        }
    }
}

impl ProxyConfig {
    /// Get effective memo lifetime for an operation
    ///
    /// Returns the operation override if set, otherwise the global default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chaincache::{Operation, ProxyConfig};
    /// use std::time::Duration;
    ///
    /// let mut config = ProxyConfig::default();
    /// config.set_operation_max_age(Operation::Constants, Duration::from_secs(600));
    ///
    /// assert_eq!(config.get_max_age(Operation::Constants), Duration::from_secs(600));
    /// assert_eq!(config.get_max_age(Operation::Balance), Duration::from_secs(30));
    /// ```
    pub fn get_max_age(&self, operation: Operation) -> Duration {
        self.overrides
            .get(&operation)
            .copied()
            .unwrap_or(self.max_age)
    }

    /// Set an operation-specific memo lifetime
    pub fn set_operation_max_age(&mut self, operation: Operation, max_age: Duration) {
        self.overrides.insert(operation, max_age);
    }
}

/// Builder for [`ProxyConfig`]
///
/// # Example
///
/// ```rust
/// use chaincache::{Operation, ProxyConfigBuilder};
/// use std::time::Duration;
///
/// let config = ProxyConfigBuilder::new()
///     .debounce(Duration::from_millis(50))
///     .max_age(Duration::from_secs(10))
///     .operation_max_age(Operation::Balance, Duration::from_secs(5))
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProxyConfigBuilder {
    config: ProxyConfig,
}

impl ProxyConfigBuilder {
    /// Create a new builder starting from [`ProxyConfig::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the default timings
    ///
    /// Same starting point as [`new`](Self::new); reads better in front of
    /// a chain of overrides.
    pub fn with_defaults() -> Self {
        Self::new()
    }

    /// Set how long a resolved head hash is trusted
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.config.refresh_interval = interval;
        self
    }

    /// Set the head refresh debounce window
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.config.debounce = debounce;
        self
    }

    /// Set the global memo lifetime
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = max_age;
        self
    }

    /// Set the memo lifetime of one operation
    ///
    /// # Example
    ///
    /// ```rust
    /// use chaincache::{Operation, ProxyConfigBuilder};
    /// use std::time::Duration;
    ///
    /// let config = ProxyConfigBuilder::new()
    ///     .operation_max_age(Operation::Constants, Duration::from_secs(3600))
    ///     .build();
    /// assert_eq!(config.get_max_age(Operation::Constants), Duration::from_secs(3600));
    /// ```
    pub fn operation_max_age(mut self, operation: Operation, max_age: Duration) -> Self {
        self.config.set_operation_max_age(operation, max_age);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ProxyConfig {
        self.config
    }
}

/// Lifetimes of the stale-while-revalidate fetchers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherTtls {
    /// Default: 3 seconds
    pub head_block: Duration,
    /// Default: 30 seconds
    pub storage: Duration,
    /// Default: 30 seconds
    pub balance: Duration,
    /// Default: 6 hours
    pub constants: Duration,
}

impl Default for FetcherTtls {
    fn default() -> Self {
        Self {
            head_block: fetchers::HEAD_BLOCK_TTL,
            storage: fetchers::STORAGE_TTL,
            balance: fetchers::BALANCE_TTL,
            constants: fetchers::CONSTANTS_TTL,
        }
    }
}

/// Node connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSettings {
    /// Base URL of the node (`RPC_NODE`)
    pub rpc_node: String,
    /// Requests per second (`RPC_RATE_LIMIT`), unlimited when unset
    pub rate_limit: Option<u32>,
    /// Request timeout (`RPC_TIMEOUT_SECS`)
    pub timeout: Duration,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            rpc_node: DEFAULT_RPC_NODE.to_string(),
            rate_limit: None,
            timeout: client::REQUEST_TIMEOUT,
        }
    }
}

impl NodeSettings {
    /// Load settings from the process environment
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "Ignoring unreadable .env file"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let rpc_node = present(env::RPC_NODE).unwrap_or(defaults.rpc_node);

        let rate_limit = match present(env::RPC_RATE_LIMIT) {
            Some(raw) => {
                let requests: u32 = raw
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::invalid_value(env::RPC_RATE_LIMIT, raw.clone(), e))?;
                if requests == 0 {
                    return Err(ConfigError::invalid_value(
                        env::RPC_RATE_LIMIT,
                        raw,
                        "must be at least 1",
                    ));
                }
                Some(requests)
            }
            None => None,
        };

        let timeout = match present(env::RPC_TIMEOUT_SECS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::invalid_value(env::RPC_TIMEOUT_SECS, raw.clone(), e))?,
            None => defaults.timeout,
        };

        Ok(Self {
            rpc_node,
            rate_limit,
            timeout,
        })
    }
}
