// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for node data.
//!
//! - Block references and the "current head" sentinel
//! - Block and header payloads
//! - Native tez amounts
//! - Contract entrypoints
//!
//! Micheline values (storage, scripts, big map values) stay as
//! [`serde_json::Value`]; decoding them belongs to the calling layer.

pub mod block;
pub mod contract;
pub mod tez;

// Note: Public types are re-exported from lib.rs, not here
