// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::extra_unused_lifetimes)]

use crate::db::postgres::schema::liquidity_pools;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub const POOL_TYPE_CONSTANT_PRODUCT: &str = "CONSTANT_PRODUCT";
pub const UNKNOWN_TOKEN_A: &str = "UNKNOWN_TOKEN_A";
pub const UNKNOWN_TOKEN_B: &str = "UNKNOWN_TOKEN_B";

/// Lazily-created placeholder for a pool address seen in a trade event.
///
/// Token identities start unknown and are filled in by later enrichment
/// passes; rows are upserted, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = liquidity_pools)]
pub struct LiquidityPoolModel {
    pub pool_address: String,
    pub token_a: String,
    pub token_b: String,
    pub fee_bps: i32,
    pub pool_type: String,
    pub created_at: NaiveDateTime,
}

impl LiquidityPoolModel {
    /// Placeholder row written on the first sighting of a pool address.
    pub fn placeholder(pool_address: String) -> Self {
        Self {
            pool_address,
            token_a: UNKNOWN_TOKEN_A.to_string(),
            token_b: UNKNOWN_TOKEN_B.to_string(),
            // 0.3% until the pool contract is interrogated
            fee_bps: 30,
            pool_type: POOL_TYPE_CONSTANT_PRODUCT.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
