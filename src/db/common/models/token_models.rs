// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::extra_unused_lifetimes)]

use crate::db::postgres::schema::token_info;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Detailed supply composition for Stellar Asset Contracts, aggregated from
/// the classic ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyBreakdown {
    /// In user wallets
    pub authorized: f64,
    /// In liquidity pools
    pub liquidity_pools: f64,
    /// In smart contracts
    pub contracts: f64,
    /// In claimable balances
    pub claimable_balances: f64,
    pub total: f64,
}

/// Metadata for an asset, refreshed asynchronously by enrichment and upserted
/// keyed by contract address. The `decimals` value, once known, is
/// authoritative for fixed-point conversions of that asset.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = token_info)]
pub struct TokenInfoModel {
    pub contract_address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: i32,
    pub total_supply: Option<String>,
    pub admin_address: Option<String>,
    pub is_auth_revocable: bool,
    pub is_mintable: bool,
    /// Is this a Stellar Asset Contract wrapping a classic asset
    pub is_sac: bool,
    pub num_accounts: Option<i32>,
    pub supply_breakdown: Option<serde_json::Value>,
}
