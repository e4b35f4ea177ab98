// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline tests over in-memory ledger and storage fakes.
//!
//! The memory sink is keyed exactly like the Postgres tables so upsert
//! semantics (and therefore replay idempotence) are exercised for real.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use stellar_dex_indexer::config::DeploymentMode;
use stellar_dex_indexer::db::common::models::pool_models::LiquidityPoolModel;
use stellar_dex_indexer::db::common::models::price_tick_models::PriceTick;
use stellar_dex_indexer::db::common::models::token_models::TokenInfoModel;
use stellar_dex_indexer::db::common::models::trade_models::{TradeRecord, TransactionModel};
use stellar_dex_indexer::db::sink::RecordSink;
use stellar_dex_indexer::enrichment::worker::EnrichmentHandle;
use stellar_dex_indexer::enrichment::TokenDecimalsCache;
use stellar_dex_indexer::ledger::backend::{LedgerBackend, MalformedLedgerError};
use stellar_dex_indexer::ledger::types::*;
use stellar_dex_indexer::processors::dispatcher::OperationDispatcher;
use stellar_dex_indexer::processors::events::reflector::constants::REFLECTOR_CONTRACTS;
use stellar_dex_indexer::processors::events::reflector::registry::OracleRegistry;
use stellar_dex_indexer::processors::ledger_stream::run_stream_loop;
use stellar_dex_indexer::utils::starting_version::get_starting_sequence;

/// Storage fake keyed identically to the Postgres tables.
#[derive(Default)]
struct MemorySink {
    trades: Mutex<BTreeMap<(String, i32), TransactionModel>>,
    ticks: Mutex<BTreeMap<(String, NaiveDateTime, String), PriceTick>>,
    tokens: Mutex<HashMap<String, TokenInfoModel>>,
    pools: Mutex<HashMap<String, LiquidityPoolModel>>,
}

impl MemorySink {
    fn trades(&self) -> Vec<TransactionModel> {
        self.trades.lock().unwrap().values().cloned().collect()
    }

    fn ticks(&self) -> Vec<PriceTick> {
        self.ticks.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn insert_trades(&self, trades: Vec<TradeRecord>) -> Result<()> {
        // All-or-nothing like the Postgres transaction: encode everything
        // before touching the store.
        let rows = trades
            .into_iter()
            .map(TradeRecord::into_model)
            .collect::<Result<Vec<_>>>()?;
        let mut store = self.trades.lock().unwrap();
        for row in rows {
            store.insert((row.transaction_hash.clone(), row.operation_index), row);
        }
        Ok(())
    }

    async fn insert_price_ticks(&self, ticks: Vec<PriceTick>) -> Result<()> {
        let mut store = self.ticks.lock().unwrap();
        for tick in ticks {
            // on_conflict do_nothing
            store
                .entry((tick.asset_id.clone(), tick.timestamp, tick.source_id.clone()))
                .or_insert(tick);
        }
        Ok(())
    }

    async fn upsert_token(&self, token: TokenInfoModel) -> Result<()> {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.contract_address.clone(), token);
        Ok(())
    }

    async fn upsert_pool(&self, pool: LiquidityPoolModel) -> Result<()> {
        self.pools
            .lock()
            .unwrap()
            .insert(pool.pool_address.clone(), pool);
        Ok(())
    }

    async fn token_exists(&self, contract_address: &str) -> Result<bool> {
        Ok(self.tokens.lock().unwrap().contains_key(contract_address))
    }

    async fn pool_exists(&self, pool_address: &str) -> Result<bool> {
        Ok(self.pools.lock().unwrap().contains_key(pool_address))
    }

    async fn token_decimals(&self, contract_address: &str) -> Result<Option<i32>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(contract_address)
            .map(|t| t.decimals))
    }

    async fn last_committed_sequence(&self) -> Result<Option<u32>> {
        Ok(self
            .trades
            .lock()
            .unwrap()
            .values()
            .map(|t| t.ledger_sequence as u32)
            .max())
    }
}

/// Kind of failure the backend fake injects for a sequence.
enum InjectedFailure {
    Transport,
    Malformed,
}

/// Ledger source fake that signals shutdown once the stream runs past its
/// highest ledger, so `run_stream_loop` terminates.
struct MockLedgerBackend {
    latest: u32,
    ledgers: HashMap<u32, LedgerMeta>,
    /// Sequences that fail this many times before succeeding.
    failures: Mutex<HashMap<u32, (u32, InjectedFailure)>>,
    shutdown: watch::Sender<bool>,
}

impl MockLedgerBackend {
    fn new(ledgers: Vec<LedgerMeta>, shutdown: watch::Sender<bool>) -> Self {
        let latest = ledgers.iter().map(|l| l.sequence).max().unwrap_or(0);
        Self {
            latest,
            ledgers: ledgers.into_iter().map(|l| (l.sequence, l)).collect(),
            failures: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    fn fail_sequence(&self, sequence: u32, times: u32) {
        self.failures
            .lock()
            .unwrap()
            .insert(sequence, (times, InjectedFailure::Transport));
    }

    fn corrupt_sequence(&self, sequence: u32, times: u32) {
        self.failures
            .lock()
            .unwrap()
            .insert(sequence, (times, InjectedFailure::Malformed));
    }
}

#[async_trait]
impl LedgerBackend for MockLedgerBackend {
    async fn get_health(&self) -> Result<u32> {
        Ok(self.latest)
    }

    async fn prepare_range(&self, _from: u32) -> Result<()> {
        Ok(())
    }

    async fn get_ledger(&self, sequence: u32) -> Result<Option<LedgerMeta>> {
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some((remaining, kind)) = failures.get_mut(&sequence) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return match kind {
                        InjectedFailure::Transport => {
                            Err(anyhow!("injected connection failure for {sequence}"))
                        }
                        InjectedFailure::Malformed => Err(MalformedLedgerError::new(
                            sequence,
                            "injected undecodable metadata",
                        )
                        .into()),
                    };
                }
            }
        }
        if sequence > self.latest {
            let _ = self.shutdown.send(true);
            return Ok(None);
        }
        Ok(self.ledgers.get(&sequence).cloned())
    }
}

fn dispatcher() -> OperationDispatcher {
    let registry = OracleRegistry::with_assets([(
        REFLECTOR_CONTRACTS[0].to_string(),
        vec!["BTC".to_string(), "ETH".to_string()],
    )]);
    OperationDispatcher::new(
        Arc::new(registry),
        TokenDecimalsCache::new(),
        EnrichmentHandle::disabled(),
    )
}

fn i128(lo: u64) -> ScVal {
    ScVal::I128(Int128Parts { hi: 0, lo })
}

fn usdc() -> Asset {
    Asset::CreditAlphanum4 {
        code: "USDC".to_string(),
        issuer: "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN".to_string(),
    }
}

fn manage_sell_tx() -> LedgerTransaction {
    let claim = |offer_id, amount_sold, amount_bought| ClaimAtom {
        seller_id: "GCOUNTER".to_string(),
        offer_id,
        asset_sold: usdc(),
        amount_sold,
        asset_bought: Asset::Native,
        amount_bought,
    };
    LedgerTransaction {
        hash: "a1".to_string(),
        source_account: "GSELLER".to_string(),
        result_code: TransactionResultCode::TxSuccess,
        operations: vec![Operation {
            source_account: None,
            body: OperationBody::ManageSellOffer(ManageSellOfferOp {
                selling: Asset::Native,
                buying: usdc(),
                amount: 100,
                price: Price { n: 2, d: 1 },
                offer_id: 0,
            }),
        }],
        operation_results: Some(vec![OperationResult::ManageSellOffer(ManageOfferResult {
            code: OfferResultCode::Success,
            success: Some(ManageOfferSuccess {
                offers_claimed: vec![claim(11, 40, 20), claim(12, 60, 30)],
                offer: Some(OfferEntry { offer_id: 345 }),
            }),
        })]),
        events: vec![],
    }
}

fn set_price_tx() -> LedgerTransaction {
    LedgerTransaction {
        hash: "b2".to_string(),
        source_account: "GORACLE".to_string(),
        result_code: TransactionResultCode::TxSuccess,
        operations: vec![Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                contract_address: Some(REFLECTOR_CONTRACTS[0].to_string()),
                function_name: Some("set_price".to_string()),
                args: vec![
                    ScVal::Vec(vec![i128(15_000_000_000_000_000), i128(0)]),
                    ScVal::U64(1_700_000_000_000),
                ],
            }),
        }],
        operation_results: Some(vec![OperationResult::InvokeHostFunction]),
        events: vec![],
    }
}

fn zero_amount_swap_tx() -> LedgerTransaction {
    LedgerTransaction {
        hash: "c3".to_string(),
        source_account: "GTRADER".to_string(),
        result_code: TransactionResultCode::TxSuccess,
        operations: vec![Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                contract_address: Some("CPOOL".to_string()),
                function_name: Some("swap".to_string()),
                args: vec![],
            }),
        }],
        operation_results: Some(vec![OperationResult::InvokeHostFunction]),
        events: vec![ContractEvent {
            contract_id: "CPOOL".to_string(),
            topics: vec![
                ScVal::Symbol("trade".to_string()),
                ScVal::Address("CAAA".to_string()),
                ScVal::Address("CBBB".to_string()),
            ],
            data: ScVal::Vec(vec![i128(0), i128(25_000_000), i128(0)]),
        }],
    }
}

fn scenario_ledger(sequence: u32) -> LedgerMeta {
    LedgerMeta {
        sequence,
        close_time: 1_700_000_100,
        transactions: vec![manage_sell_tx(), set_price_tx(), zero_amount_swap_tx()],
    }
}

#[tokio::test]
async fn production_mode_resumes_one_past_the_committed_head() {
    let (shutdown_tx, _rx) = watch::channel(false);
    let backend = MockLedgerBackend::new(vec![scenario_ledger(600)], shutdown_tx);
    let sink = MemorySink::default();

    // Empty store falls back to the node head.
    let start = get_starting_sequence(DeploymentMode::Production, &backend, &sink)
        .await
        .unwrap();
    assert_eq!(start, 600);

    sink.insert_trades(vec![sample_trade(100)]).await.unwrap();
    sink.insert_trades(vec![sample_trade(57)]).await.unwrap();
    let start = get_starting_sequence(DeploymentMode::Production, &backend, &sink)
        .await
        .unwrap();
    assert_eq!(start, 101);

    let start = get_starting_sequence(DeploymentMode::Testing, &backend, &sink)
        .await
        .unwrap();
    assert_eq!(start, 600);
}

#[tokio::test]
async fn replaying_a_trade_is_idempotent() {
    let sink = MemorySink::default();
    let mut trade = sample_trade(42);
    sink.insert_trades(vec![trade.clone()]).await.unwrap();

    trade.amount_bought = BigDecimal::from(99);
    sink.insert_trades(vec![trade]).await.unwrap();

    let trades = sink.trades();
    assert_eq!(trades.len(), 1);
    // Replay updated in place, keyed on (transaction_hash, operation_index).
    assert_eq!(trades[0].amount_bought, BigDecimal::from(99));
}

#[tokio::test(start_paused = true)]
async fn stream_loop_persists_trades_and_ticks_before_advancing() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let backend = MockLedgerBackend::new(vec![scenario_ledger(500)], shutdown_tx);
    let sink = MemorySink::default();

    run_stream_loop(&backend, &sink, &dispatcher(), 500, shutdown_rx)
        .await
        .unwrap();

    let trades = sink.trades();
    assert_eq!(trades.len(), 1, "zero-amount swap must not persist");
    let trade = &trades[0];
    assert_eq!(trade.transaction_hash, "a1");
    assert_eq!(trade.ledger_sequence, 500);
    assert_eq!(trade.status.as_deref(), Some("PARTIALLY_MATCHED"));
    assert_eq!(trade.matched_offer_id, Some(345));
    assert_eq!(
        trade.offer_sell_amount,
        Some(BigDecimal::from_str("0.00001").unwrap())
    );
    assert_eq!(
        trade.offer_buy_amount,
        Some(BigDecimal::from_str("0.00002").unwrap())
    );
    assert_eq!(trade.order_matches.as_array().unwrap().len(), 2);

    let ticks = sink.ticks();
    assert_eq!(ticks.len(), 1, "zero price must not persist");
    assert_eq!(ticks[0].asset_id, "BTC");
    assert_eq!(ticks[0].price_usd, BigDecimal::from(150));
    assert_eq!(ticks[0].timestamp.and_utc().timestamp(), 1_700_000_000);
}

#[tokio::test(start_paused = true)]
async fn stream_loop_skips_an_undecodable_sequence_after_bounded_retries() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let backend = MockLedgerBackend::new(vec![scenario_ledger(501)], shutdown_tx);
    // 500 never decodes; the loop must give up and move to 501.
    backend.corrupt_sequence(500, u32::MAX);
    let sink = MemorySink::default();

    run_stream_loop(&backend, &sink, &dispatcher(), 500, shutdown_rx)
        .await
        .unwrap();

    let trades = sink.trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].ledger_sequence, 501);
}

#[tokio::test(start_paused = true)]
async fn transient_fetch_failures_retry_the_same_sequence() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let backend = MockLedgerBackend::new(vec![scenario_ledger(500)], shutdown_tx);
    backend.fail_sequence(500, 2);
    let sink = MemorySink::default();

    run_stream_loop(&backend, &sink, &dispatcher(), 500, shutdown_rx)
        .await
        .unwrap();

    // Third attempt succeeded, nothing skipped.
    assert_eq!(sink.trades().len(), 1);
    assert_eq!(sink.trades()[0].ledger_sequence, 500);
}

#[tokio::test(start_paused = true)]
async fn rpc_outages_never_skip_a_sequence() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let backend = MockLedgerBackend::new(vec![scenario_ledger(500)], shutdown_tx);
    // A long outage: far more consecutive transport failures than the
    // bounded decode-retry limit tolerates. The ledger must still land.
    backend.fail_sequence(500, 10);
    let sink = MemorySink::default();

    run_stream_loop(&backend, &sink, &dispatcher(), 500, shutdown_rx)
        .await
        .unwrap();

    assert_eq!(sink.trades().len(), 1);
    assert_eq!(sink.trades()[0].ledger_sequence, 500);
}

fn sample_trade(ledger_sequence: i64) -> TradeRecord {
    TradeRecord {
        block_time: NaiveDateTime::default(),
        ledger_sequence,
        transaction_hash: format!("tx{ledger_sequence}"),
        operation_index: 0,
        dex_name: "stellar_dex".to_string(),
        dex_type: "ORDERBOOK".to_string(),
        source_account: "GSELLER".to_string(),
        token_in: "XLM".to_string(),
        token_out: "USDC:GISSUER".to_string(),
        offer_id: Some(1),
        matched_offer_id: None,
        buyer_account: None,
        seller_account: Some("GSELLER".to_string()),
        offer_buy_amount: Some(BigDecimal::from(2)),
        offer_sell_amount: Some(BigDecimal::from(1)),
        amount_bought: BigDecimal::from(2),
        amount_sold: BigDecimal::from(1),
        offer_price: Some(BigDecimal::from(2)),
        dex_fee: None,
        pool_address: None,
        status: Some("MATCHED".to_string()),
        order_matches: vec![],
    }
}
