// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block identities and block payloads returned by the node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Literal block reference the node understands as "current head".
pub const HEAD: &str = "head";

/// A concrete block reference accepted by the node.
///
/// Usually a block hash (`BL...`), but levels and relative references such as
/// `head~2` are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Create a block id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id as sent to the node.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id is the node's `head` sentinel.
    pub fn is_head(&self) -> bool {
        self.0 == HEAD
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which snapshot of chain state a read should observe.
///
/// [`BlockRef::Head`] asks for "whatever is current". A pinned
/// [`BlockRef::At`] is forwarded as-is, except that the literal `head` id is
/// treated exactly like [`BlockRef::Head`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlockRef {
    #[default]
    Head,
    At(BlockId),
}

impl BlockRef {
    /// Pin a read to a specific block.
    pub fn at(id: impl Into<BlockId>) -> Self {
        BlockRef::At(id.into())
    }

    /// True when the caller means "current state" rather than a snapshot.
    pub fn wants_head(&self) -> bool {
        match self {
            BlockRef::Head => true,
            BlockRef::At(id) => id.is_head(),
        }
    }

    /// The pinned block id, or `None` when the caller wants the head.
    pub fn pinned(&self) -> Option<&BlockId> {
        match self {
            BlockRef::At(id) if !id.is_head() => Some(id),
            _ => None,
        }
    }

    /// Path segment used in node URLs.
    pub fn as_str(&self) -> &str {
        match self {
            BlockRef::Head => HEAD,
            BlockRef::At(id) => id.as_str(),
        }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BlockId> for BlockRef {
    fn from(id: BlockId) -> Self {
        BlockRef::At(id)
    }
}

impl From<Option<BlockId>> for BlockRef {
    fn from(id: Option<BlockId>) -> Self {
        id.map_or(BlockRef::Head, BlockRef::At)
    }
}

impl FromStr for BlockRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == HEAD {
            Ok(BlockRef::Head)
        } else {
            Ok(BlockRef::At(BlockId::new(s)))
        }
    }
}

/// Shell header fields shared by `/header` and the `header` object of a full block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellHeader {
    pub level: i64,
    pub proto: u32,
    pub predecessor: BlockId,
    pub timestamp: DateTime<Utc>,
    /// Protocol-specific fields (fitness, context, signature, ...)
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Response of `/chains/main/blocks/{block}/header`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub protocol: String,
    pub chain_id: String,
    pub hash: BlockId,
    #[serde(flatten)]
    pub shell: ShellHeader,
}

impl BlockHeader {
    /// Level of this block.
    pub fn level(&self) -> i64 {
        self.shell.level
    }

    /// Condensed identity used when reporting which snapshot a value came from.
    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            level: self.shell.level,
            hash: self.hash.clone(),
            timestamp: self.shell.timestamp,
        }
    }
}

/// Response of `/chains/main/blocks/{block}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub protocol: String,
    pub chain_id: String,
    pub hash: BlockId,
    pub header: ShellHeader,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub operations: Value,
}

impl Block {
    /// Condensed identity used when reporting which snapshot a value came from.
    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            level: self.header.level,
            hash: self.hash.clone(),
            timestamp: self.header.timestamp,
        }
    }
}

/// Level, hash and timestamp of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub level: i64,
    pub hash: BlockId,
    pub timestamp: DateTime<Utc>,
}
