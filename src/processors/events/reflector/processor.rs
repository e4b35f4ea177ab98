// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Reflector `set_price` decoder.
//!
//! Each invocation carries a position-indexed vec of 14-decimal prices
//! (arg 0) and a millisecond feed timestamp (arg 1). Asset identity comes
//! from the registry's snapshot of the contract's `assets()` list; ticks
//! keep the feed timestamp, not the ledger close time. Only strictly
//! positive prices become ticks.

use super::constants::*;
use super::registry::OracleRegistry;
use crate::db::common::models::price_tick_models::PriceTick;
use crate::ledger::types::ScVal;
use crate::processors::events::TradeContext;
use crate::utils::numeric::i128_parts_to_decimal;
use bigdecimal::{BigDecimal, Zero};
use chrono::DateTime;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ReflectorProcessor {
    registry: Arc<OracleRegistry>,
}

impl ReflectorProcessor {
    pub fn new(registry: Arc<OracleRegistry>) -> Self {
        Self { registry }
    }

    /// Decode one `set_price` invocation into its surviving price ticks.
    pub fn process_set_price(
        &self,
        ctx: &TradeContext<'_>,
        contract_address: &str,
        args: &[ScVal],
    ) -> Vec<PriceTick> {
        let Some(assets) = self.registry.assets(contract_address) else {
            warn!(
                "⚠️ No asset list for oracle {}, skipping set_price in tx {}",
                contract_address, ctx.transaction_hash
            );
            return Vec::new();
        };

        let Some(prices) = args.first().and_then(ScVal::as_vec) else {
            warn!(
                "⚠️ set_price without a price vec in tx {}",
                ctx.transaction_hash
            );
            return Vec::new();
        };
        let Some(timestamp) = args
            .get(1)
            .and_then(ScVal::as_u64)
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            .map(|dt| dt.naive_utc())
        else {
            warn!(
                "⚠️ set_price without a valid timestamp in tx {}",
                ctx.transaction_hash
            );
            return Vec::new();
        };

        let mut ticks = Vec::with_capacity(prices.len());
        for (position, value) in prices.iter().enumerate() {
            let Some(parts) = value.as_i128() else {
                debug!("Non-i128 price at position {}, skipping", position);
                continue;
            };
            let price_usd = i128_parts_to_decimal(parts.hi, parts.lo, REFLECTOR_SCALE);
            // Zeros are decode noise and negatives are corrupt feed data;
            // only strictly positive prices become ticks.
            if price_usd <= BigDecimal::zero() {
                continue;
            }
            let Some(asset_id) = assets.get(position) else {
                warn!(
                    "⚠️ Price at position {} beyond {}-asset list of {}",
                    position,
                    assets.len(),
                    contract_address
                );
                continue;
            };

            ticks.push(PriceTick {
                timestamp,
                asset_id: asset_id.clone(),
                source_id: REFLECTOR_SOURCE_ID.to_string(),
                source_type: SOURCE_TYPE_ORACLE.to_string(),
                price_usd,
                volume_usd: None,
                ledger_seq: ctx.ledger_sequence,
                tx_hash: ctx.transaction_hash.to_string(),
            });
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::Int128Parts;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDateTime;

    const ORACLE: &str = "CAFJZQWSED6YAWZU3GWRTOCNPPCGBN32L7QV43XX5LZLFTK6JLN34DLN";

    fn processor(assets: Vec<&str>) -> ReflectorProcessor {
        ReflectorProcessor::new(Arc::new(OracleRegistry::with_assets([(
            ORACLE.to_string(),
            assets.into_iter().map(str::to_string).collect(),
        )])))
    }

    fn ctx() -> TradeContext<'static> {
        TradeContext {
            block_time: NaiveDateTime::default(),
            ledger_sequence: 1234,
            transaction_hash: "0ddba11",
            operation_index: 0,
        }
    }

    fn price(lo: u64) -> ScVal {
        ScVal::I128(Int128Parts { hi: 0, lo })
    }

    fn signed_price(value: i128) -> ScVal {
        ScVal::I128(Int128Parts {
            hi: (value >> 64) as i64,
            lo: value as u64,
        })
    }

    // [150e14, 0] at feed time 1700000000000 ms: one tick at exactly 150,
    // zero dropped.
    #[test]
    fn zero_prices_never_become_ticks() {
        let ticks = processor(vec!["BTC", "ETH"]).process_set_price(
            &ctx(),
            ORACLE,
            &[
                ScVal::Vec(vec![price(15_000_000_000_000_000), price(0)]),
                ScVal::U64(1_700_000_000_000),
            ],
        );

        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].asset_id, "BTC");
        assert_eq!(ticks[0].price_usd, BigDecimal::from(150));
        assert_eq!(ticks[0].source_id, "reflector");
        assert_eq!(ticks[0].source_type, "oracle_onchain");
        assert_eq!(ticks[0].timestamp.and_utc().timestamp(), 1_700_000_000);
        assert_eq!(ticks[0].ledger_seq, 1234);
    }

    #[test]
    fn negative_prices_never_become_ticks() {
        let ticks = processor(vec!["BTC", "ETH"]).process_set_price(
            &ctx(),
            ORACLE,
            &[
                ScVal::Vec(vec![
                    signed_price(-15_000_000_000_000_000),
                    price(320_000_000_000_000_000),
                ]),
                ScVal::U64(1_700_000_000_000),
            ],
        );

        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].asset_id, "ETH");
        assert_eq!(ticks[0].price_usd, BigDecimal::from(3200));
    }

    #[test]
    fn unknown_asset_list_skips_the_invocation() {
        let processor = ReflectorProcessor::new(Arc::new(OracleRegistry::empty()));
        let ticks = processor.process_set_price(
            &ctx(),
            ORACLE,
            &[
                ScVal::Vec(vec![price(1_000)]),
                ScVal::U64(1_700_000_000_000),
            ],
        );
        assert!(ticks.is_empty());
    }

    #[test]
    fn positions_beyond_the_asset_list_are_skipped() {
        let ticks = processor(vec!["BTC"]).process_set_price(
            &ctx(),
            ORACLE,
            &[
                ScVal::Vec(vec![price(1_000), price(2_000)]),
                ScVal::U64(1_700_000_000_000),
            ],
        );
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].asset_id, "BTC");
    }

    #[test]
    fn malformed_arguments_yield_no_ticks() {
        let p = processor(vec!["BTC"]);
        assert!(p.process_set_price(&ctx(), ORACLE, &[]).is_empty());
        assert!(p
            .process_set_price(&ctx(), ORACLE, &[ScVal::U64(5), ScVal::U64(5)])
            .is_empty());
        // Missing timestamp
        assert!(p
            .process_set_price(&ctx(), ORACLE, &[ScVal::Vec(vec![price(1_000)])])
            .is_empty());
    }
}
