// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node reads memoized by [`RemoteProxy`](super::RemoteProxy).
///
/// Each variant gets its own memoizer and its own `max_age`, and its name
/// prefixes every memo key of that operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Balance,
    LiveBlocks,
    Storage,
    Script,
    Contract,
    Entrypoints,
    ManagerKey,
    Delegate,
    BigMapExpr,
    Delegates,
    Constants,
    Block,
    BlockHeader,
    BlockMetadata,
    ChainId,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::Balance,
        Operation::LiveBlocks,
        Operation::Storage,
        Operation::Script,
        Operation::Contract,
        Operation::Entrypoints,
        Operation::ManagerKey,
        Operation::Delegate,
        Operation::BigMapExpr,
        Operation::Delegates,
        Operation::Constants,
        Operation::Block,
        Operation::BlockHeader,
        Operation::BlockMetadata,
        Operation::ChainId,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Balance => "balance",
            Operation::LiveBlocks => "live_blocks",
            Operation::Storage => "storage",
            Operation::Script => "script",
            Operation::Contract => "contract",
            Operation::Entrypoints => "entrypoints",
            Operation::ManagerKey => "manager_key",
            Operation::Delegate => "delegate",
            Operation::BigMapExpr => "big_map_expr",
            Operation::Delegates => "delegates",
            Operation::Constants => "constants",
            Operation::Block => "block",
            Operation::BlockHeader => "block_header",
            Operation::BlockMetadata => "block_metadata",
            Operation::ChainId => "chain_id",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
