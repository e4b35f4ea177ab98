// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! # Celerfi Stellar DEX Indexer
//!
//! Streams settled ledgers from a Stellar-RPC node and extracts DEX trading
//! activity and oracle price updates:
//! - Classic order-book trades (manage buy/sell offer operations)
//! - Soroban AMM swaps (any contract emitting the standard `trade` event)
//! - Reflector oracle price feeds (`set_price` invocations)
//!
//! Normalized records are persisted to PostgreSQL in idempotent batches so the
//! stream can resume after a restart without losing or duplicating data.

pub mod config;
pub mod db;
pub mod enrichment;
pub mod ledger;
pub mod processors;
pub mod utils;
