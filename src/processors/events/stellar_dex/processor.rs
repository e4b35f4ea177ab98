// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Classic order-book decoder.
//!
//! Manage-offer operations carry the trader's intent; the matching outcome
//! lives in the paired operation result. A successful result with no claim
//! atoms means the offer was posted to the book; claim atoms record the
//! counter-offers it crossed, and the remaining offer entry (if any) decides
//! whether the fill was partial.

use super::constants::*;
use crate::db::common::models::trade_models::{OrderMatch, TradeRecord, DEX_TYPE_ORDERBOOK};
use crate::ledger::types::{
    Asset, ClaimAtom, ManageBuyOfferOp, ManageOfferResult, ManageSellOfferOp, OfferResultCode,
    Price,
};
use crate::processors::events::TradeContext;
use crate::utils::formatters::format_asset;
use crate::utils::numeric::{price_ratio, stroops_to_decimal};
use bigdecimal::{BigDecimal, Zero};
use tracing::debug;

pub struct StellarDexProcessor;

impl StellarDexProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Decode a manage-sell-offer operation. `None` for failed results,
    /// cancellations (zero amount) and degenerate prices.
    pub fn process_sell_offer(
        &self,
        ctx: &TradeContext<'_>,
        source_account: &str,
        op: &ManageSellOfferOp,
        result: &ManageOfferResult,
    ) -> Option<TradeRecord> {
        if op.amount == 0 {
            debug!("Offer deletion in tx {}, no trade", ctx.transaction_hash);
            return None;
        }
        let sell_amount = stroops_to_decimal(op.amount);
        let buy_amount = &sell_amount * price_ratio(op.price.n, op.price.d);
        self.build_record(
            ctx,
            source_account,
            &op.selling,
            &op.buying,
            sell_amount,
            buy_amount,
            op.price,
            op.offer_id,
            result,
            false,
        )
    }

    /// Decode a manage-buy-offer operation. The sell side is derived from
    /// the buy amount through the offer price.
    pub fn process_buy_offer(
        &self,
        ctx: &TradeContext<'_>,
        source_account: &str,
        op: &ManageBuyOfferOp,
        result: &ManageOfferResult,
    ) -> Option<TradeRecord> {
        if op.buy_amount == 0 {
            debug!("Offer deletion in tx {}, no trade", ctx.transaction_hash);
            return None;
        }
        let buy_amount = stroops_to_decimal(op.buy_amount);
        let sell_amount = &buy_amount * price_ratio(op.price.n, op.price.d);
        self.build_record(
            ctx,
            source_account,
            &op.selling,
            &op.buying,
            sell_amount,
            buy_amount,
            op.price,
            op.offer_id,
            result,
            true,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build_record(
        &self,
        ctx: &TradeContext<'_>,
        source_account: &str,
        selling: &Asset,
        buying: &Asset,
        sell_amount: BigDecimal,
        buy_amount: BigDecimal,
        price: Price,
        op_offer_id: i64,
        result: &ManageOfferResult,
        is_buy_offer: bool,
    ) -> Option<TradeRecord> {
        if result.code != OfferResultCode::Success {
            return None;
        }
        let success = result.success.as_ref()?;

        let zero = BigDecimal::zero();
        if sell_amount <= zero || buy_amount <= zero {
            debug!(
                "Degenerate offer price {}/{} in tx {}, skipping",
                price.n, price.d, ctx.transaction_hash
            );
            return None;
        }

        let remaining_id = success
            .offer
            .as_ref()
            .map(|offer| offer.offer_id)
            .filter(|id| *id != 0);
        let status = match (success.offers_claimed.is_empty(), remaining_id) {
            (true, _) => STATUS_POSTED,
            (false, None) => STATUS_MATCHED,
            (false, Some(_)) => STATUS_PARTIALLY_MATCHED,
        };

        let order_matches = success
            .offers_claimed
            .iter()
            .map(claim_to_match)
            .collect::<Vec<_>>();

        // The operation carries the id only when amending an existing offer;
        // for a new offer the id is assigned in the result.
        let offer_id = if op_offer_id != 0 {
            Some(op_offer_id)
        } else {
            remaining_id
        };

        debug!(
            "📖 {} offer in tx {}: {} -> {}, {} matches",
            status,
            ctx.transaction_hash,
            format_asset(selling),
            format_asset(buying),
            order_matches.len()
        );

        Some(TradeRecord {
            block_time: ctx.block_time,
            ledger_sequence: ctx.ledger_sequence,
            transaction_hash: ctx.transaction_hash.to_string(),
            operation_index: ctx.operation_index,
            dex_name: STELLAR_DEX_NAME.to_string(),
            dex_type: DEX_TYPE_ORDERBOOK.to_string(),
            source_account: source_account.to_string(),
            token_in: format_asset(selling),
            token_out: format_asset(buying),
            offer_id,
            matched_offer_id: if status == STATUS_PARTIALLY_MATCHED {
                remaining_id
            } else {
                None
            },
            buyer_account: is_buy_offer.then(|| source_account.to_string()),
            seller_account: (!is_buy_offer).then(|| source_account.to_string()),
            offer_buy_amount: Some(buy_amount.clone()),
            offer_sell_amount: Some(sell_amount.clone()),
            amount_bought: buy_amount,
            amount_sold: sell_amount,
            offer_price: Some(price_ratio(price.n, price.d)),
            dex_fee: None,
            pool_address: None,
            status: Some(status.to_string()),
            order_matches,
        })
    }
}

impl Default for StellarDexProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn claim_to_match(claim: &ClaimAtom) -> OrderMatch {
    OrderMatch {
        order_type: ORDER_TYPE_COUNTER_OFFER.to_string(),
        amount_bought: stroops_to_decimal(claim.amount_bought),
        amount_sold: stroops_to_decimal(claim.amount_sold),
        asset_bought: format_asset(&claim.asset_bought),
        asset_sold: format_asset(&claim.asset_sold),
        owner: claim.seller_id.clone(),
        offer_id: claim.offer_id,
    }
}
