// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! # Ledger Source Layer
//!
//! Everything needed to consume settled ledgers from a Stellar-RPC node:
//!
//! - **`types`**: the normalized wire model — operations, typed operation
//!   results, Soroban values (`ScVal`) and contract events — as decoded from
//!   the node's JSON-formatted ledger metadata.
//! - **`backend`**: the `LedgerBackend` trait (health check, range
//!   preparation, per-sequence fetch) and its JSON-RPC implementation.
//! - **`reader`**: in-order transaction iteration over one ledger plus the
//!   success filter that discards failed transactions.
//!
//! The binary XDR decoding itself happens node-side; this layer only maps the
//! node's structured output into crate types.

/// Normalized ledger, transaction, operation and Soroban value types
pub mod types;

/// Ledger backend trait and the Stellar-RPC JSON-RPC client
pub mod backend;

/// Transaction iteration and success filtering
pub mod reader;
