// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! The streaming loop: one cursor, one ledger at a time.
//!
//! Startup wires the pool, migrations, oracle registry and enrichment
//! workers, resolves the starting sequence for the deployment mode, then
//! hands control to `run_stream_loop`. The loop fetches, decodes and
//! persists each ledger before advancing, so the committed table is always a
//! prefix of the chain and `MAX(ledger_sequence) + 1` is a safe resume
//! point. Persistence failures are logged and the cursor still advances;
//! re-running the range later is idempotent through the upsert keys.

use crate::config::IndexerConfig;
use crate::db::postgres::sink::PostgresSink;
use crate::db::sink::RecordSink;
use crate::enrichment::client::EnrichmentClient;
use crate::enrichment::worker::spawn_enrichment_pool;
use crate::enrichment::TokenDecimalsCache;
use crate::ledger::backend::{LedgerBackend, MalformedLedgerError, RpcLedgerBackend};
use crate::processors::dispatcher::OperationDispatcher;
use crate::processors::events::reflector::registry::OracleRegistry;
use crate::utils::database::{new_db_pool, run_migrations};
use crate::utils::starting_version::get_starting_sequence;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Pause before re-requesting a sequence the node has not closed yet.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Decode failures tolerated per sequence before skipping it. Transport
/// failures never count against this: a skipped sequence is permanent under
/// `MAX + 1` resumption, so only a ledger that is provably undecodable may
/// be given up on.
const MAX_DECODE_ATTEMPTS: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(2);

pub struct LedgerStreamProcessor {
    config: IndexerConfig,
}

impl LedgerStreamProcessor {
    pub async fn new(config: IndexerConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub async fn run_processor(self) -> Result<()> {
        let config = self.config;

        run_migrations(config.postgres_connection_string.clone()).await?;
        let pool = new_db_pool(&config.postgres_connection_string, config.db_pool_size)
            .await
            .context("failed to create database pool")?;
        let sink: Arc<dyn RecordSink> = Arc::new(PostgresSink::new(pool));

        let backend = RpcLedgerBackend::new(&config.rpc_url)?;
        let client = Arc::new(EnrichmentClient::new(&config.rpc_url, &config.horizon_url)?);

        let registry = Arc::new(OracleRegistry::bootstrap(client.as_ref()).await);
        let decimals = TokenDecimalsCache::new();
        let (enrichment, _workers) = spawn_enrichment_pool(
            config.enrichment_workers,
            config.enrichment_queue_size,
            client,
            Arc::clone(&sink),
            decimals.clone(),
        );

        let dispatcher = OperationDispatcher::new(registry, decimals, enrichment);

        let start = get_starting_sequence(config.deployment_mode, &backend, sink.as_ref()).await?;
        backend.prepare_range(start).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("🛑 Shutdown signal received, finishing in-flight ledger");
                let _ = shutdown_tx.send(true);
            }
        });

        run_stream_loop(&backend, sink.as_ref(), &dispatcher, start, shutdown_rx).await
    }
}

/// Drive the cursor until shutdown. Separated from the wiring so tests can
/// run it against in-memory backends and sinks.
pub async fn run_stream_loop(
    backend: &dyn LedgerBackend,
    sink: &dyn RecordSink,
    dispatcher: &OperationDispatcher,
    start: u32,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut sequence = start;
    let mut attempts = 0u32;

    loop {
        if *shutdown.borrow() {
            info!("🛑 Ledger stream stopped at sequence {}", sequence);
            return Ok(());
        }

        match backend.get_ledger(sequence).await {
            Ok(Some(meta)) => {
                attempts = 0;
                let records = dispatcher.process_ledger(&meta).await;
                let (tx_count, trade_count, tick_count) = (
                    meta.transactions.len(),
                    records.trades.len(),
                    records.ticks.len(),
                );

                // Persist before advancing: the cursor only moves past
                // ledgers whose records got their chance to commit.
                if let Err(e) = sink.insert_trades(records.trades).await {
                    error!("❌ Trade batch for ledger {} failed: {:#}", sequence, e);
                }
                if let Err(e) = sink.insert_price_ticks(records.ticks).await {
                    error!("❌ Tick batch for ledger {} failed: {:#}", sequence, e);
                }

                info!(
                    "📦 ledger {}: {} txs, {} trades, {} ticks",
                    sequence, tx_count, trade_count, tick_count
                );
                sequence += 1;
            }
            Ok(None) => {
                // Caught up with the chain head; wait for the next close.
                tokio::select! {
                    _ = shutdown.changed() => {}
                    _ = tokio::time::sleep(POLL_INTERVAL) => {}
                }
            }
            // Undecodable metadata: the payload itself is broken, so retrying
            // forever would wedge the stream. Bounded retries, then skip.
            Err(e) if e.downcast_ref::<MalformedLedgerError>().is_some() => {
                attempts += 1;
                if attempts >= MAX_DECODE_ATTEMPTS {
                    warn!(
                        "⚠️ Skipping undecodable ledger {} after {} attempts: {:#}",
                        sequence, attempts, e
                    );
                    sequence += 1;
                    attempts = 0;
                } else {
                    warn!(
                        "⚠️ Decode of ledger {} failed (attempt {}/{}): {:#}",
                        sequence, attempts, MAX_DECODE_ATTEMPTS, e
                    );
                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = tokio::time::sleep(RETRY_PAUSE) => {}
                    }
                }
            }
            // Transport failure: the ledger exists and will decode once the
            // node is reachable again, so keep retrying the same sequence.
            Err(e) => {
                warn!("⚠️ Fetch of ledger {} failed, will retry: {:#}", sequence, e);
                tokio::select! {
                    _ = shutdown.changed() => {}
                    _ = tokio::time::sleep(RETRY_PAUSE) => {}
                }
            }
        }
    }
}
