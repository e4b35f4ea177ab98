// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Operation routing.
//!
//! One pass over a ledger: failed transactions drop at the door, then each
//! operation goes to exactly one decoder. Soroban swaps are contract events
//! rather than operations, so the first invoke-host-function operation that
//! is not an oracle update triggers a single scan of the transaction's event
//! list; the handled flag keeps multi-invoke transactions from decoding the
//! same events twice.

use crate::db::common::models::price_tick_models::PriceTick;
use crate::db::common::models::trade_models::{TradeRecord, DEX_TYPE_AMM};
use crate::enrichment::worker::EnrichmentHandle;
use crate::enrichment::TokenDecimalsCache;
use crate::ledger::reader::{is_successful, operation_result, LedgerTransactionReader};
use crate::ledger::types::{
    InvokeHostFunctionOp, LedgerMeta, LedgerTransaction, OperationBody, OperationResult,
};
use crate::processors::events::reflector::constants::SET_PRICE_FUNCTION;
use crate::processors::events::reflector::processor::ReflectorProcessor;
use crate::processors::events::reflector::registry::OracleRegistry;
use crate::processors::events::soroban_amm::processor::SorobanAmmProcessor;
use crate::processors::events::stellar_dex::processor::StellarDexProcessor;
use crate::processors::events::TradeContext;
use std::sync::Arc;
use tracing::debug;

/// Everything one ledger produced, in ledger order.
#[derive(Debug, Default)]
pub struct LedgerRecords {
    pub trades: Vec<TradeRecord>,
    pub ticks: Vec<PriceTick>,
}

pub struct OperationDispatcher {
    registry: Arc<OracleRegistry>,
    order_book: StellarDexProcessor,
    amm: SorobanAmmProcessor,
    oracle: ReflectorProcessor,
    enrichment: EnrichmentHandle,
}

impl OperationDispatcher {
    pub fn new(
        registry: Arc<OracleRegistry>,
        decimals: TokenDecimalsCache,
        enrichment: EnrichmentHandle,
    ) -> Self {
        Self {
            registry: Arc::clone(&registry),
            order_book: StellarDexProcessor::new(),
            amm: SorobanAmmProcessor::new(decimals),
            oracle: ReflectorProcessor::new(registry),
            enrichment,
        }
    }

    pub async fn process_ledger(&self, meta: &LedgerMeta) -> LedgerRecords {
        let mut records = LedgerRecords::default();
        let block_time = meta.block_time();

        for tx in LedgerTransactionReader::new(meta) {
            if !is_successful(tx) {
                continue;
            }
            // One event scan per transaction, however many invokes it has.
            let mut amm_events_handled = false;

            for (op_index, op) in tx.operations.iter().enumerate() {
                let ctx = TradeContext {
                    block_time,
                    ledger_sequence: meta.sequence as i64,
                    transaction_hash: &tx.hash,
                    operation_index: op_index as i32,
                };
                let source = op.source_account.as_deref().unwrap_or(&tx.source_account);

                match &op.body {
                    OperationBody::ManageSellOffer(offer) => {
                        let Some(OperationResult::ManageSellOffer(result)) =
                            operation_result(tx, op_index)
                        else {
                            continue;
                        };
                        if let Some(trade) =
                            self.order_book.process_sell_offer(&ctx, source, offer, result)
                        {
                            self.schedule_trade_enrichment(&trade).await;
                            records.trades.push(trade);
                        }
                    }
                    OperationBody::ManageBuyOffer(offer) => {
                        let Some(OperationResult::ManageBuyOffer(result)) =
                            operation_result(tx, op_index)
                        else {
                            continue;
                        };
                        if let Some(trade) =
                            self.order_book.process_buy_offer(&ctx, source, offer, result)
                        {
                            self.schedule_trade_enrichment(&trade).await;
                            records.trades.push(trade);
                        }
                    }
                    OperationBody::InvokeHostFunction(invoke) => {
                        // Same rule as the offer arms: an operation without a
                        // result entry is not decoded.
                        if operation_result(tx, op_index).is_none() {
                            continue;
                        }
                        if self.is_oracle_update(invoke) {
                            let contract = invoke.contract_address.as_deref().unwrap_or_default();
                            records
                                .ticks
                                .extend(self.oracle.process_set_price(&ctx, contract, &invoke.args));
                        } else if !amm_events_handled {
                            amm_events_handled = true;
                            self.process_contract_events(&ctx, tx, source, &mut records)
                                .await;
                        }
                    }
                    OperationBody::LiquidityPoolDeposit | OperationBody::LiquidityPoolWithdraw => {
                        // No decoder yet; noted so the gap is visible in logs.
                        debug!(
                            "Liquidity pool operation in tx {} not decoded",
                            tx.hash
                        );
                    }
                    OperationBody::Other => {}
                }
            }
        }
        records
    }

    fn is_oracle_update(&self, invoke: &InvokeHostFunctionOp) -> bool {
        invoke
            .contract_address
            .as_deref()
            .map(|addr| self.registry.is_oracle(addr))
            .unwrap_or(false)
            && invoke.function_name.as_deref() == Some(SET_PRICE_FUNCTION)
    }

    async fn process_contract_events(
        &self,
        ctx: &TradeContext<'_>,
        tx: &LedgerTransaction,
        source: &str,
        records: &mut LedgerRecords,
    ) {
        for event in &tx.events {
            if !SorobanAmmProcessor::is_trade_event(event) {
                continue;
            }
            if let Some(trade) = self.amm.process_trade_event(ctx, source, event).await {
                self.schedule_trade_enrichment(&trade).await;
                records.trades.push(trade);
            }
        }
    }

    async fn schedule_trade_enrichment(&self, trade: &TradeRecord) {
        self.schedule_token_if_contract(&trade.token_in).await;
        self.schedule_token_if_contract(&trade.token_out).await;
        if trade.dex_type == DEX_TYPE_AMM {
            if let Some(pool) = &trade.pool_address {
                self.enrichment.schedule_pool(pool.clone()).await;
            }
        }
    }

    /// Classic assets carry `CODE:ISSUER` (or `XLM`) keys with no contract
    /// behind them; only contract addresses get an enrichment job.
    async fn schedule_token_if_contract(&self, asset_id: &str) {
        if !asset_id.starts_with('C') || asset_id.contains(':') {
            return;
        }
        self.enrichment.schedule_token(asset_id.to_string()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::*;
    use crate::processors::events::reflector::constants::REFLECTOR_CONTRACTS;

    fn dispatcher_with_oracle() -> OperationDispatcher {
        dispatcher_with_enrichment(EnrichmentHandle::disabled())
    }

    fn dispatcher_with_enrichment(enrichment: EnrichmentHandle) -> OperationDispatcher {
        let registry = OracleRegistry::with_assets([(
            REFLECTOR_CONTRACTS[0].to_string(),
            vec!["BTC".to_string()],
        )]);
        OperationDispatcher::new(Arc::new(registry), TokenDecimalsCache::new(), enrichment)
    }

    fn trade_event() -> ContractEvent {
        ContractEvent {
            contract_id: "CBQHNAXSI55GX2GN6D67GK7BHVPSLJUGZQEU7WJ5LKR5PNUCGLIMAO4K".to_string(),
            topics: vec![
                ScVal::Symbol("trade".to_string()),
                ScVal::Address("CAAA".to_string()),
                ScVal::Address("CBBB".to_string()),
            ],
            data: ScVal::Vec(vec![
                ScVal::I128(Int128Parts { hi: 0, lo: 10_000_000 }),
                ScVal::I128(Int128Parts { hi: 0, lo: 20_000_000 }),
                ScVal::I128(Int128Parts { hi: 0, lo: 0 }),
            ]),
        }
    }

    fn invoke_op(contract: &str, function: &str, args: Vec<ScVal>) -> Operation {
        Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                contract_address: Some(contract.to_string()),
                function_name: Some(function.to_string()),
                args,
            }),
        }
    }

    fn ledger(transactions: Vec<LedgerTransaction>) -> LedgerMeta {
        LedgerMeta {
            sequence: 100,
            close_time: 1_700_000_000,
            transactions,
        }
    }

    #[tokio::test]
    async fn failed_transactions_produce_nothing() {
        let tx = LedgerTransaction {
            hash: "dead".to_string(),
            source_account: "GSOURCE".to_string(),
            result_code: TransactionResultCode::TxFailed,
            operations: vec![invoke_op("CAMM", "swap", vec![])],
            operation_results: None,
            events: vec![trade_event()],
        };
        let records = dispatcher_with_oracle().process_ledger(&ledger(vec![tx])).await;
        assert!(records.trades.is_empty());
        assert!(records.ticks.is_empty());
    }

    #[tokio::test]
    async fn multi_invoke_transactions_scan_events_once() {
        let tx = LedgerTransaction {
            hash: "beef".to_string(),
            source_account: "GSOURCE".to_string(),
            result_code: TransactionResultCode::TxSuccess,
            operations: vec![
                invoke_op("CAMM", "swap", vec![]),
                invoke_op("CAMM", "swap", vec![]),
            ],
            operation_results: Some(vec![
                OperationResult::InvokeHostFunction,
                OperationResult::InvokeHostFunction,
            ]),
            events: vec![trade_event()],
        };
        let records = dispatcher_with_oracle().process_ledger(&ledger(vec![tx])).await;
        assert_eq!(records.trades.len(), 1);
        assert_eq!(records.trades[0].dex_type, DEX_TYPE_AMM);
    }

    #[tokio::test]
    async fn oracle_updates_route_to_the_reflector_decoder() {
        let tx = LedgerTransaction {
            hash: "feed".to_string(),
            source_account: "GORACLE".to_string(),
            result_code: TransactionResultCode::TxSuccess,
            operations: vec![invoke_op(
                REFLECTOR_CONTRACTS[0],
                "set_price",
                vec![
                    ScVal::Vec(vec![ScVal::I128(Int128Parts {
                        hi: 0,
                        lo: 15_000_000_000_000_000,
                    })]),
                    ScVal::U64(1_700_000_000_000),
                ],
            )],
            operation_results: Some(vec![OperationResult::InvokeHostFunction]),
            events: vec![],
        };
        let records = dispatcher_with_oracle().process_ledger(&ledger(vec![tx])).await;
        assert!(records.trades.is_empty());
        assert_eq!(records.ticks.len(), 1);
        assert_eq!(records.ticks[0].asset_id, "BTC");
    }

    #[tokio::test]
    async fn orderbook_operations_need_a_matching_result() {
        let offer = ManageSellOfferOp {
            selling: Asset::Native,
            buying: Asset::CreditAlphanum4 {
                code: "USDC".to_string(),
                issuer: "GISSUER".to_string(),
            },
            amount: 10_000_000,
            price: Price { n: 1, d: 1 },
            offer_id: 0,
        };
        let mut tx = LedgerTransaction {
            hash: "cafe".to_string(),
            source_account: "GSELLER".to_string(),
            result_code: TransactionResultCode::TxSuccess,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::ManageSellOffer(offer),
            }],
            operation_results: Some(vec![OperationResult::ManageSellOffer(ManageOfferResult {
                code: OfferResultCode::Success,
                success: Some(ManageOfferSuccess {
                    offers_claimed: vec![],
                    offer: Some(OfferEntry { offer_id: 7 }),
                }),
            })]),
            events: vec![],
        };

        let records = dispatcher_with_oracle()
            .process_ledger(&ledger(vec![tx.clone()]))
            .await;
        assert_eq!(records.trades.len(), 1);
        assert_eq!(records.trades[0].status.as_deref(), Some("POSTED"));

        // Result list shorter than the operation list: operation skipped.
        tx.operation_results = Some(vec![]);
        let records = dispatcher_with_oracle().process_ledger(&ledger(vec![tx])).await;
        assert!(records.trades.is_empty());
    }

    #[tokio::test]
    async fn invoke_operations_need_a_result_entry_too() {
        let mut tx = LedgerTransaction {
            hash: "f00d".to_string(),
            source_account: "GSOURCE".to_string(),
            result_code: TransactionResultCode::TxSuccess,
            operations: vec![
                invoke_op("CAMM", "swap", vec![]),
                invoke_op(
                    REFLECTOR_CONTRACTS[0],
                    "set_price",
                    vec![
                        ScVal::Vec(vec![ScVal::I128(Int128Parts {
                            hi: 0,
                            lo: 15_000_000_000_000_000,
                        })]),
                        ScVal::U64(1_700_000_000_000),
                    ],
                ),
            ],
            operation_results: None,
            events: vec![trade_event()],
        };

        // No result list at all: neither the AMM events nor the oracle
        // update get decoded.
        let records = dispatcher_with_oracle()
            .process_ledger(&ledger(vec![tx.clone()]))
            .await;
        assert!(records.trades.is_empty());
        assert!(records.ticks.is_empty());

        // Result list shorter than the operation list: only the covered
        // operation is decoded.
        tx.operation_results = Some(vec![OperationResult::InvokeHostFunction]);
        let records = dispatcher_with_oracle().process_ledger(&ledger(vec![tx])).await;
        assert_eq!(records.trades.len(), 1);
        assert!(records.ticks.is_empty());
    }

    #[tokio::test]
    async fn enrichment_only_schedules_contract_addresses() {
        use crate::enrichment::worker::EnrichmentJob;
        use tokio::sync::mpsc;

        let (tx_jobs, mut rx_jobs) = mpsc::channel(16);
        let dispatcher = dispatcher_with_enrichment(EnrichmentHandle::with_sender(tx_jobs));

        let orderbook_tx = LedgerTransaction {
            hash: "cafe".to_string(),
            source_account: "GSELLER".to_string(),
            result_code: TransactionResultCode::TxSuccess,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::ManageSellOffer(ManageSellOfferOp {
                    selling: Asset::Native,
                    buying: Asset::CreditAlphanum4 {
                        code: "CHF".to_string(),
                        issuer: "GISSUER".to_string(),
                    },
                    amount: 10_000_000,
                    price: Price { n: 1, d: 1 },
                    offer_id: 0,
                }),
            }],
            operation_results: Some(vec![OperationResult::ManageSellOffer(ManageOfferResult {
                code: OfferResultCode::Success,
                success: Some(ManageOfferSuccess {
                    offers_claimed: vec![],
                    offer: Some(OfferEntry { offer_id: 7 }),
                }),
            })]),
            events: vec![],
        };
        let amm_tx = LedgerTransaction {
            hash: "beef".to_string(),
            source_account: "GTRADER".to_string(),
            result_code: TransactionResultCode::TxSuccess,
            operations: vec![invoke_op("CAMM", "swap", vec![])],
            operation_results: Some(vec![OperationResult::InvokeHostFunction]),
            events: vec![trade_event()],
        };

        let records = dispatcher
            .process_ledger(&ledger(vec![orderbook_tx, amm_tx]))
            .await;
        assert_eq!(records.trades.len(), 2);

        // Only the AMM legs and pool make it into the queue. The classic
        // trade's `XLM` and `CHF:GISSUER` keys name no contract, even
        // though the code side starts with a plausible `C`.
        let mut scheduled = Vec::new();
        while let Ok(job) = rx_jobs.try_recv() {
            scheduled.push(job);
        }
        assert_eq!(
            scheduled,
            vec![
                EnrichmentJob::Token {
                    address: "CAAA".to_string()
                },
                EnrichmentJob::Token {
                    address: "CBBB".to_string()
                },
                EnrichmentJob::Pool {
                    address: "CBQHNAXSI55GX2GN6D67GK7BHVPSLJUGZQEU7WJ5LKR5PNUCGLIMAO4K"
                        .to_string()
                },
            ]
        );
    }
}
