// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Normalized cache keys derived from call arguments.
//!
//! Arguments are serialized to JSON and object keys are sorted recursively
//! before rendering, so two structurally equal argument lists always produce
//! the same key regardless of map iteration order. JSON keeps `"1"` and `1`
//! apart, which keeps differently-typed arguments from colliding.
//!
//! With serde_json's default `BTreeMap`-backed `Map` objects already come out
//! sorted; the explicit sort keeps keys stable if any crate in the build
//! turns on serde_json's `preserve_order` feature.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::errors::KeyError;

/// A deterministic string key for one call's arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for an argument list, e.g. `["KT1...","head"]` for a 2-tuple.
    ///
    /// `scope` only names the caller in the error when serialization fails.
    pub fn for_args<A>(scope: &str, args: &A) -> Result<Self, KeyError>
    where
        A: Serialize + ?Sized,
    {
        canonical_json(args)
            .map(Self)
            .map_err(|e| KeyError::new(scope, e))
    }

    /// Key for an argument list prefixed with the operation name,
    /// e.g. `balance:["tz1...","BLxyz"]`.
    pub fn for_operation<A>(operation: &str, args: &A) -> Result<Self, KeyError>
    where
        A: Serialize + ?Sized,
    {
        canonical_json(args)
            .map(|json| Self(format!("{operation}:{json}")))
            .map_err(|e| KeyError::new(operation, e))
    }

    /// The rendered key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical_json<A: Serialize + ?Sized>(args: &A) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(args)?;
    Ok(sort_objects(value).to_string())
}

/// Recursively sort object keys. A no-op reorder unless `preserve_order` is on.
fn sort_objects(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(key, value)| (key, sort_objects(value)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_objects).collect()),
        other => other,
    }
}
