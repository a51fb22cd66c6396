// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

/// Call arguments could not be serialized into a cache key.
///
/// This only happens for argument types whose `Serialize` implementation
/// fails, such as maps keyed by non-string values.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to build cache key for {operation}")]
pub struct KeyError {
    operation: String,
    #[source]
    source: Arc<serde_json::Error>,
}

impl KeyError {
    pub(crate) fn new(operation: impl Into<String>, source: serde_json::Error) -> Self {
        Self {
            operation: operation.into(),
            source: Arc::new(source),
        }
    }

    /// The operation whose arguments failed to serialize.
    pub fn operation(&self) -> &str {
        &self.operation
    }
}
