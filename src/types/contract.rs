// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Callable interface of a smart contract.
///
/// Response of `/chains/main/blocks/{block}/context/contracts/{address}/entrypoints`.
/// Parameter types are kept as raw Micheline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entrypoints {
    pub entrypoints: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreachable: Vec<Value>,
}

impl Entrypoints {
    /// Entrypoint names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entrypoints.keys().map(String::as_str)
    }

    /// Whether the contract exposes an entrypoint with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entrypoints.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_entrypoints() {
        let raw = json!({
            "entrypoints": {
                "transfer": {"prim": "list"},
                "balance_of": {"prim": "pair"}
            }
        });

        let entrypoints: Entrypoints = serde_json::from_value(raw).unwrap();
        assert_eq!(
            entrypoints.names().collect::<Vec<_>>(),
            vec!["balance_of", "transfer"]
        );
        assert!(entrypoints.contains("transfer"));
        assert!(entrypoints.unreachable.is_empty());
    }
}
