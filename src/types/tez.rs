// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for native tez amounts
//!
//! The node reports balances as decimal strings of mutez (1 tez = 10^6 mutez).

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;

/// Number of mutez in one tez
pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

/// An amount of native tez, in mutez
///
/// # Examples
///
/// ```
/// use chaincache::Mutez;
///
/// let balance = Mutez::new(2_500_000);
/// assert!((balance.to_tez() - 2.5).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Mutez(u64);

impl Mutez {
    /// Zero mutez
    pub const ZERO: Self = Self(0);

    /// Create a new amount from raw mutez
    pub const fn new(mutez: u64) -> Self {
        Self(mutez)
    }

    /// Get the raw mutez value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert to tez
    ///
    /// Returns f64 for display purposes. This is a lossy conversion.
    pub fn to_tez(&self) -> f64 {
        self.0 as f64 / MUTEZ_PER_TEZ as f64
    }

    /// Add two amounts, returning `None` on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl Add for Mutez {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Mutez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mutez", self.0)
    }
}

impl From<u64> for Mutez {
    fn from(mutez: u64) -> Self {
        Self(mutez)
    }
}

// The node encodes balances as JSON strings to stay within JavaScript's
// safe integer range.
impl Serialize for Mutez {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Mutez {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(mutez) => Ok(Self(mutez)),
            Raw::Text(text) => text
                .parse::<u64>()
                .map(Self)
                .map_err(|e| de::Error::custom(format!("invalid mutez amount {text:?}: {e}"))),
        }
    }
}
