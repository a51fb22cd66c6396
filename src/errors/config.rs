// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while loading process configuration.

/// Errors that can occur while building configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable was present but could not be parsed.
    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        /// Environment variable name
        name: &'static str,
        /// The raw value that was rejected
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The node URL is not a valid absolute URL.
    #[error("Invalid node URL {url:?}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// The URL parse error
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

impl ConfigError {
    /// Helper to create an `InvalidValue` error.
    pub fn invalid_value(
        name: &'static str,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        ConfigError::InvalidValue {
            name,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}
