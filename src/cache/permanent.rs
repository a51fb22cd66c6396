// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use dashmap::DashMap;
use std::future::Future;
use tracing::debug;

/// Successful values kept for the lifetime of the owner.
///
/// There is no expiry and no refresh: once a value is stored for a key it is
/// returned forever. Failures are never stored, so a failed lookup is simply
/// retried on the next call. Concurrent misses are not coalesced here; put a
/// [`KeyedMemoizer`](super::KeyedMemoizer) behind it when that matters.
#[derive(Debug)]
pub struct PermanentCache<T> {
    name: &'static str,
    entries: DashMap<String, T>,
}

impl<T: Clone> PermanentCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.get(key).map(|value| value.value().clone())
    }

    /// Return the stored value for `key`, or run `load` and store its success.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: String, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key) {
            debug!(cache = self.name, key = %key, "Permanent cache hit");
            return Ok(value);
        }

        let value = load().await?;
        debug!(cache = self.name, key = %key, "Storing value for process lifetime");
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
