// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Per-protocol decoders.
//!
//! Each submodule turns one on-chain surface into normalized records:
//! `stellar_dex` reads classic manage-offer operations and their results,
//! `soroban_amm` reads `trade` contract events, `reflector` reads oracle
//! `set_price` invocations. Decoders are pure over their inputs; anything
//! malformed is skipped at the smallest possible granularity.

pub mod reflector;
pub mod soroban_amm;
pub mod stellar_dex;

use chrono::NaiveDateTime;

/// Ledger position shared by every record decoded from one operation.
#[derive(Debug, Clone, Copy)]
pub struct TradeContext<'a> {
    pub block_time: NaiveDateTime,
    pub ledger_sequence: i64,
    pub transaction_hash: &'a str,
    pub operation_index: i32,
}
