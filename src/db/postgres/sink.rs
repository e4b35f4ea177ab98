// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL implementation of the record sink.
//!
//! Batched inserts open one database transaction, bulk-load in chunks sized
//! to the bind-parameter limit, and commit; any row failure (including a
//! non-serializable nested match list) rolls back the entire batch. Partial
//! batch success is not a supported semantics.

use crate::db::common::models::pool_models::LiquidityPoolModel;
use crate::db::common::models::price_tick_models::PriceTick;
use crate::db::common::models::token_models::TokenInfoModel;
use crate::db::common::models::trade_models::{TradeRecord, TransactionModel};
use crate::db::postgres::schema::{liquidity_pools, price_ticks, token_info, transaction_models};
use crate::db::sink::RecordSink;
use crate::utils::database::{get_chunks, ArcDbPool};
use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::dsl::{exists, max, select};
use diesel::upsert::excluded;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use field_count::FieldCount;
use tracing::debug;

pub struct PostgresSink {
    pool: ArcDbPool,
}

impl PostgresSink {
    pub fn new(pool: ArcDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSink for PostgresSink {
    async fn insert_trades(&self, trades: Vec<TradeRecord>) -> Result<()> {
        if trades.is_empty() {
            return Ok(());
        }

        let mut conn = self.pool.get().await.context("no database connection")?;
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            async move {
                // Row encoding happens inside the transaction scope so a bad
                // row aborts the whole batch with a rollback.
                let rows = trades
                    .into_iter()
                    .map(TradeRecord::into_model)
                    .collect::<Result<Vec<_>>>()?;

                for (start, end) in get_chunks(rows.len(), TransactionModel::field_count()) {
                    diesel::insert_into(transaction_models::table)
                        .values(&rows[start..end])
                        .on_conflict((
                            transaction_models::transaction_hash,
                            transaction_models::operation_index,
                        ))
                        .do_update()
                        .set((
                            transaction_models::block_time
                                .eq(excluded(transaction_models::block_time)),
                            transaction_models::ledger_sequence
                                .eq(excluded(transaction_models::ledger_sequence)),
                            transaction_models::dex_name
                                .eq(excluded(transaction_models::dex_name)),
                            transaction_models::dex_type
                                .eq(excluded(transaction_models::dex_type)),
                            transaction_models::source_account
                                .eq(excluded(transaction_models::source_account)),
                            transaction_models::token_in
                                .eq(excluded(transaction_models::token_in)),
                            transaction_models::token_out
                                .eq(excluded(transaction_models::token_out)),
                            transaction_models::offer_id
                                .eq(excluded(transaction_models::offer_id)),
                            transaction_models::matched_offer_id
                                .eq(excluded(transaction_models::matched_offer_id)),
                            transaction_models::buyer_account
                                .eq(excluded(transaction_models::buyer_account)),
                            transaction_models::seller_account
                                .eq(excluded(transaction_models::seller_account)),
                            transaction_models::offer_buy_amount
                                .eq(excluded(transaction_models::offer_buy_amount)),
                            transaction_models::offer_sell_amount
                                .eq(excluded(transaction_models::offer_sell_amount)),
                            transaction_models::amount_bought
                                .eq(excluded(transaction_models::amount_bought)),
                            transaction_models::amount_sold
                                .eq(excluded(transaction_models::amount_sold)),
                            transaction_models::offer_price
                                .eq(excluded(transaction_models::offer_price)),
                            transaction_models::dex_fee
                                .eq(excluded(transaction_models::dex_fee)),
                            transaction_models::pool_address
                                .eq(excluded(transaction_models::pool_address)),
                            transaction_models::status.eq(excluded(transaction_models::status)),
                            transaction_models::order_matches
                                .eq(excluded(transaction_models::order_matches)),
                        ))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .context("trade batch insert rolled back")
    }

    async fn insert_price_ticks(&self, ticks: Vec<PriceTick>) -> Result<()> {
        if ticks.is_empty() {
            return Ok(());
        }

        let mut conn = self.pool.get().await.context("no database connection")?;
        conn.transaction::<_, anyhow::Error, _>(|conn| {
            async move {
                for (start, end) in get_chunks(ticks.len(), PriceTick::field_count()) {
                    // Ticks are immutable observations: replays are no-ops.
                    diesel::insert_into(price_ticks::table)
                        .values(&ticks[start..end])
                        .on_conflict((
                            price_ticks::asset_id,
                            price_ticks::timestamp,
                            price_ticks::source_id,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .context("price tick batch insert rolled back")
    }

    async fn upsert_token(&self, token: TokenInfoModel) -> Result<()> {
        let mut conn = self.pool.get().await.context("no database connection")?;
        debug!("💾 Upserting token metadata for {}", token.contract_address);

        diesel::insert_into(token_info::table)
            .values(&token)
            .on_conflict(token_info::contract_address)
            .do_update()
            .set((
                token_info::symbol.eq(excluded(token_info::symbol)),
                token_info::name.eq(excluded(token_info::name)),
                token_info::decimals.eq(excluded(token_info::decimals)),
                token_info::total_supply.eq(excluded(token_info::total_supply)),
                token_info::admin_address.eq(excluded(token_info::admin_address)),
                token_info::is_auth_revocable.eq(excluded(token_info::is_auth_revocable)),
                token_info::is_mintable.eq(excluded(token_info::is_mintable)),
                token_info::is_sac.eq(excluded(token_info::is_sac)),
                token_info::num_accounts.eq(excluded(token_info::num_accounts)),
                token_info::supply_breakdown.eq(excluded(token_info::supply_breakdown)),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn upsert_pool(&self, pool: LiquidityPoolModel) -> Result<()> {
        let mut conn = self.pool.get().await.context("no database connection")?;
        debug!("💾 Upserting liquidity pool {}", pool.pool_address);

        diesel::insert_into(liquidity_pools::table)
            .values(&pool)
            .on_conflict(liquidity_pools::pool_address)
            .do_update()
            .set((
                liquidity_pools::token_a.eq(excluded(liquidity_pools::token_a)),
                liquidity_pools::token_b.eq(excluded(liquidity_pools::token_b)),
                liquidity_pools::fee_bps.eq(excluded(liquidity_pools::fee_bps)),
                liquidity_pools::pool_type.eq(excluded(liquidity_pools::pool_type)),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn token_exists(&self, contract_address: &str) -> Result<bool> {
        let mut conn = self.pool.get().await.context("no database connection")?;
        let found = select(exists(
            token_info::table.filter(token_info::contract_address.eq(contract_address)),
        ))
        .get_result::<bool>(&mut conn)
        .await?;
        Ok(found)
    }

    async fn pool_exists(&self, pool_address: &str) -> Result<bool> {
        let mut conn = self.pool.get().await.context("no database connection")?;
        let found = select(exists(
            liquidity_pools::table.filter(liquidity_pools::pool_address.eq(pool_address)),
        ))
        .get_result::<bool>(&mut conn)
        .await?;
        Ok(found)
    }

    async fn token_decimals(&self, contract_address: &str) -> Result<Option<i32>> {
        let mut conn = self.pool.get().await.context("no database connection")?;
        let decimals = token_info::table
            .filter(token_info::contract_address.eq(contract_address))
            .select(token_info::decimals)
            .first::<i32>(&mut conn)
            .await
            .optional()?;
        Ok(decimals)
    }

    async fn last_committed_sequence(&self) -> Result<Option<u32>> {
        let mut conn = self.pool.get().await.context("no database connection")?;
        let last: Option<i64> = transaction_models::table
            .select(max(transaction_models::ledger_sequence))
            .first(&mut conn)
            .await?;
        Ok(last.map(|seq| seq as u32))
    }
}
