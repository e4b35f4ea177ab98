// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! The storage contract every record writer goes through.
//!
//! The streaming loop and the enrichment workers only ever see this trait,
//! which keeps the pipeline testable against an in-memory fake and keeps all
//! writers on independent storage transactions.

use crate::db::common::models::pool_models::LiquidityPoolModel;
use crate::db::common::models::price_tick_models::PriceTick;
use crate::db::common::models::token_models::TokenInfoModel;
use crate::db::common::models::trade_models::TradeRecord;
use anyhow::Result;
use async_trait::async_trait;

/// Durable, idempotent persistence for normalized records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist a batch of trades in a single storage transaction.
    ///
    /// All-or-nothing: any row-level failure rolls back the whole batch.
    /// Re-inserting a trade with the same (transaction_hash,
    /// operation_index) upserts the latest values.
    async fn insert_trades(&self, trades: Vec<TradeRecord>) -> Result<()>;

    /// Persist a batch of price ticks in a single storage transaction.
    ///
    /// Idempotent on (asset_id, timestamp, source_id); replays are no-ops.
    async fn insert_price_ticks(&self, ticks: Vec<PriceTick>) -> Result<()>;

    /// Insert-or-update token metadata keyed by contract address.
    async fn upsert_token(&self, token: TokenInfoModel) -> Result<()>;

    /// Insert-or-update a liquidity pool keyed by pool address.
    async fn upsert_pool(&self, pool: LiquidityPoolModel) -> Result<()>;

    async fn token_exists(&self, contract_address: &str) -> Result<bool>;

    async fn pool_exists(&self, pool_address: &str) -> Result<bool>;

    /// Known decimals for an already-enriched token, if any.
    async fn token_decimals(&self, contract_address: &str) -> Result<Option<i32>>;

    /// Highest ledger sequence present in committed trades; the durable form
    /// of the stream cursor.
    async fn last_committed_sequence(&self) -> Result<Option<u32>>;
}
