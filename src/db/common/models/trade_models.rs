// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::extra_unused_lifetimes)]

use crate::db::postgres::schema::transaction_models;
use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use field_count::FieldCount;
use serde::{Deserialize, Serialize};

pub const DEX_TYPE_AMM: &str = "AMM";
pub const DEX_TYPE_ORDERBOOK: &str = "ORDERBOOK";

/// One crossed counter-offer, owned by its parent trade and serialized into
/// the row's JSONB `order_matches` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMatch {
    pub order_type: String,
    pub amount_bought: BigDecimal,
    pub amount_sold: BigDecimal,
    pub asset_bought: String,
    pub asset_sold: String,
    /// Owner of the counter offer.
    pub owner: String,
    /// Matched offer ID.
    pub offer_id: i64,
}

/// One normalized DEX trade as emitted by a decoder.
///
/// Immutable after creation; persisted once via idempotent upsert on
/// `(transaction_hash, operation_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub block_time: NaiveDateTime,
    pub ledger_sequence: i64,
    pub transaction_hash: String,
    pub operation_index: i32,
    pub dex_name: String,
    pub dex_type: String,
    pub source_account: String,
    pub token_in: String,
    pub token_out: String,
    pub offer_id: Option<i64>,
    pub matched_offer_id: Option<i64>,
    pub buyer_account: Option<String>,
    pub seller_account: Option<String>,
    pub offer_buy_amount: Option<BigDecimal>,
    pub offer_sell_amount: Option<BigDecimal>,
    pub amount_bought: BigDecimal,
    pub amount_sold: BigDecimal,
    pub offer_price: Option<BigDecimal>,
    pub dex_fee: Option<BigDecimal>,
    pub pool_address: Option<String>,
    pub status: Option<String>,
    pub order_matches: Vec<OrderMatch>,
}

impl TradeRecord {
    /// Serialize the nested match list and produce the insertable row.
    ///
    /// Failure here is the row-level encoding failure that aborts the whole
    /// batch in the sink.
    pub fn into_model(self) -> Result<TransactionModel> {
        let order_matches = serde_json::to_value(&self.order_matches)
            .context("failed to serialize order matches to JSON")?;
        Ok(TransactionModel {
            block_time: self.block_time,
            ledger_sequence: self.ledger_sequence,
            transaction_hash: self.transaction_hash,
            operation_index: self.operation_index,
            dex_name: self.dex_name,
            dex_type: self.dex_type,
            source_account: self.source_account,
            token_in: self.token_in,
            token_out: self.token_out,
            offer_id: self.offer_id,
            matched_offer_id: self.matched_offer_id,
            buyer_account: self.buyer_account,
            seller_account: self.seller_account,
            offer_buy_amount: self.offer_buy_amount,
            offer_sell_amount: self.offer_sell_amount,
            amount_bought: self.amount_bought,
            amount_sold: self.amount_sold,
            offer_price: self.offer_price,
            dex_fee: self.dex_fee,
            pool_address: self.pool_address,
            status: self.status,
            order_matches,
        })
    }
}

/// Row-level representation of a trade.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, FieldCount)]
#[diesel(table_name = transaction_models)]
pub struct TransactionModel {
    pub block_time: NaiveDateTime,
    pub ledger_sequence: i64,
    pub transaction_hash: String,
    pub operation_index: i32,
    pub dex_name: String,
    pub dex_type: String,
    pub source_account: String,
    pub token_in: String,
    pub token_out: String,
    pub offer_id: Option<i64>,
    pub matched_offer_id: Option<i64>,
    pub buyer_account: Option<String>,
    pub seller_account: Option<String>,
    pub offer_buy_amount: Option<BigDecimal>,
    pub offer_sell_amount: Option<BigDecimal>,
    pub amount_bought: BigDecimal,
    pub amount_sold: BigDecimal,
    pub offer_price: Option<BigDecimal>,
    pub dex_fee: Option<BigDecimal>,
    pub pool_address: Option<String>,
    pub status: Option<String>,
    pub order_matches: serde_json::Value,
}
