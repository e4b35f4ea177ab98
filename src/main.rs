// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! # Celerfi Stellar DEX Indexer
//!
//! Ingests settled Stellar ledgers and indexes trading activity from:
//! - the classic order-book (manage buy/sell offers)
//! - Soroban AMMs emitting the standard `trade` event
//! - the Reflector price oracle (`set_price` feeds)

use anyhow::Result;
use clap::Parser;
use stellar_dex_indexer::config::indexer_config::{IndexerArgs, IndexerConfig};
use stellar_dex_indexer::processors::ledger_stream::LedgerStreamProcessor;
use tracing_subscriber::EnvFilter;

/// Configure jemalloc as the global allocator for better memory management
#[cfg(unix)]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

/// Main application entry point
///
/// Initializes the async runtime with optimized settings for blockchain data
/// processing and starts the streaming loop with the provided configuration.
/// Any unrecoverable startup condition (bad deployment mode, unreachable
/// database or RPC node) bubbles out as an error and exits with code 1.
fn main() -> Result<()> {
    // Use at least 16 threads for concurrent database operations and network I/O
    let num_cpus = num_cpus::get();
    let worker_threads = num_cpus.max(16);

    // Build Tokio runtime optimized for high-throughput processing
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder
        .enable_all() // Enable all I/O and timer drivers
        .worker_threads(worker_threads)
        .build()
        .expect("Failed to build async runtime")
        .block_on(async {
            let args = IndexerArgs::parse();

            // dev.env style deployments keep credentials out of the unit file
            match &args.env_file {
                Some(path) => {
                    dotenvy::from_path(path)?;
                }
                None => {
                    dotenvy::dotenv().ok();
                }
            }

            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .init();

            let config = IndexerConfig::from_env()?;
            LedgerStreamProcessor::new(config).await?.run_processor().await
        })
}
