// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Soroban AMM swap decoder.
//!
//! Any contract event whose topic 0 is the `trade` symbol is treated as a
//! swap, whatever contract emitted it: topics 1 and 2 name the input and
//! output assets and the data vec carries [sold, bought, fee] as scaled
//! i128s. Amount scale is the asset's enriched decimals when the cache
//! knows them, the native 7 otherwise.

use super::constants::*;
use crate::db::common::models::trade_models::{TradeRecord, DEX_TYPE_AMM};
use crate::enrichment::TokenDecimalsCache;
use crate::ledger::types::ContractEvent;
use crate::processors::events::TradeContext;
use crate::utils::numeric::{i128_parts_to_decimal, NATIVE_SCALE};
use bigdecimal::{BigDecimal, Zero};
use tracing::debug;

pub struct SorobanAmmProcessor {
    decimals: TokenDecimalsCache,
}

impl SorobanAmmProcessor {
    pub fn new(decimals: TokenDecimalsCache) -> Self {
        Self { decimals }
    }

    /// True when the event's topic 0 is the `trade` symbol.
    pub fn is_trade_event(event: &ContractEvent) -> bool {
        event
            .topics
            .first()
            .and_then(|t| t.as_symbol())
            .map(|s| s == TRADE_EVENT_SYMBOL)
            .unwrap_or(false)
    }

    /// Decode one `trade` event into a record. `None` skips just this event:
    /// malformed topics, short data vec, or a non-positive leg.
    pub async fn process_trade_event(
        &self,
        ctx: &TradeContext<'_>,
        source_account: &str,
        event: &ContractEvent,
    ) -> Option<TradeRecord> {
        let token_in = event.topics.get(1).and_then(|t| t.as_address());
        let token_out = event.topics.get(2).and_then(|t| t.as_address());
        let (Some(token_in), Some(token_out)) = (token_in, token_out) else {
            debug!(
                "⚠️ trade event from {} lacks asset topics, skipping",
                event.contract_id
            );
            return None;
        };

        let data = event.data.as_vec()?;
        if data.len() < TRADE_DATA_MIN_LEN {
            debug!(
                "⚠️ trade event from {} has {} data entries, need {}",
                event.contract_id,
                data.len(),
                TRADE_DATA_MIN_LEN
            );
            return None;
        }
        let sold = data[0].as_i128()?;
        let bought = data[1].as_i128()?;
        let fee = data[2].as_i128()?;

        let scale_in = self.asset_scale(token_in).await;
        let scale_out = self.asset_scale(token_out).await;

        let amount_sold = i128_parts_to_decimal(sold.hi, sold.lo, scale_in);
        let amount_bought = i128_parts_to_decimal(bought.hi, bought.lo, scale_out);
        // Both legs must be strictly positive. A negative i128 here is a
        // contract emitting garbage, not a refund.
        let zero = BigDecimal::zero();
        if amount_sold <= zero || amount_bought <= zero {
            debug!(
                "Non-positive swap amount on {} in tx {}, dropped",
                event.contract_id, ctx.transaction_hash
            );
            return None;
        }
        // Fee is charged on the input leg.
        let dex_fee = i128_parts_to_decimal(fee.hi, fee.lo, scale_in);

        debug!(
            "🔄 AMM swap on {}: {} {} -> {} {}",
            event.contract_id, amount_sold, token_in, amount_bought, token_out
        );

        Some(TradeRecord {
            block_time: ctx.block_time,
            ledger_sequence: ctx.ledger_sequence,
            transaction_hash: ctx.transaction_hash.to_string(),
            operation_index: ctx.operation_index,
            dex_name: AMM_DEX_NAME.to_string(),
            dex_type: DEX_TYPE_AMM.to_string(),
            source_account: source_account.to_string(),
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            offer_id: None,
            matched_offer_id: None,
            buyer_account: Some(source_account.to_string()),
            seller_account: None,
            offer_buy_amount: None,
            offer_sell_amount: None,
            amount_bought,
            amount_sold,
            offer_price: None,
            dex_fee: Some(dex_fee),
            pool_address: Some(event.contract_id.clone()),
            status: None,
            order_matches: vec![],
        })
    }

    async fn asset_scale(&self, asset: &str) -> u32 {
        self.decimals.get(asset).await.unwrap_or(NATIVE_SCALE)
    }
}
