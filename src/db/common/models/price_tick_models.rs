// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::extra_unused_lifetimes)]

use crate::db::postgres::schema::price_ticks;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use field_count::FieldCount;
use serde::{Deserialize, Serialize};

/// One oracle price observation.
///
/// The timestamp comes from the on-chain update itself, not the block time.
/// Natural key is (asset_id, timestamp, source_id); inserts are idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable, FieldCount)]
#[diesel(table_name = price_ticks)]
pub struct PriceTick {
    pub timestamp: NaiveDateTime,
    pub asset_id: String,
    pub source_id: String,
    pub source_type: String,
    pub price_usd: BigDecimal,
    pub volume_usd: Option<BigDecimal>,
    pub ledger_seq: i64,
    pub tx_hash: String,
}
