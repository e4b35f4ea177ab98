// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use strum::{Display, EnumString};

const DEFAULT_HORIZON_URL: &str = "https://horizon.stellar.org";
const DEFAULT_DB_POOL_SIZE: u32 = 5;
const DEFAULT_ENRICHMENT_WORKERS: usize = 4;
const DEFAULT_ENRICHMENT_QUEUE_SIZE: usize = 256;

/// Command line arguments for the indexer process.
#[derive(Debug, Parser)]
#[command(name = "stellar-dex-indexer", about = "Stellar DEX and oracle indexer")]
pub struct IndexerArgs {
    /// Path to an env file loaded before reading configuration (e.g. dev.env)
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

/// Where the ledger cursor starts from on boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeploymentMode {
    /// Bounded test runs: start at the node's current latest ledger.
    Testing,
    /// Live ingestion: resume one past the last committed ledger sequence.
    Production,
}

/// Full runtime configuration, validated at startup.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub deployment_mode: DeploymentMode,
    /// Stellar-RPC endpoint used for both ledger streaming and Soroban
    /// read-only simulation calls.
    pub rpc_url: String,
    /// Horizon endpoint for classic asset supply and issuer account lookups.
    pub horizon_url: String,
    pub postgres_connection_string: String,
    pub db_pool_size: u32,
    pub enrichment_workers: usize,
    pub enrichment_queue_size: usize,
}

impl IndexerConfig {
    /// Read and validate configuration from the process environment.
    ///
    /// Fails fast on a missing/unknown deployment mode or missing endpoints;
    /// these are fatal startup conditions per the error taxonomy.
    pub fn from_env() -> Result<Self> {
        let mode_raw = std::env::var("DEPLOYMENT_ENVIRONMENT").unwrap_or_default();
        let deployment_mode = match DeploymentMode::from_str(mode_raw.trim()) {
            Ok(mode) => mode,
            Err(_) => {
                bail!("set the DEPLOYMENT_ENVIRONMENT config: options (testing, production)")
            }
        };

        let rpc_url = std::env::var("RPC_URL").context("RPC_URL must be set")?;
        let postgres_connection_string =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let horizon_url =
            std::env::var("HORIZON_URL").unwrap_or_else(|_| DEFAULT_HORIZON_URL.to_string());

        let db_pool_size = read_numeric("DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE)?;
        let enrichment_workers = read_numeric("ENRICHMENT_WORKERS", DEFAULT_ENRICHMENT_WORKERS)?;
        let enrichment_queue_size =
            read_numeric("ENRICHMENT_QUEUE_SIZE", DEFAULT_ENRICHMENT_QUEUE_SIZE)?;

        Ok(Self {
            deployment_mode,
            rpc_url,
            horizon_url,
            postgres_connection_string,
            db_pool_size,
            enrichment_workers,
            enrichment_queue_size,
        })
    }
}

fn read_numeric<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} is not a valid number: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_mode_parses_known_values() {
        assert_eq!(
            DeploymentMode::from_str("testing").unwrap(),
            DeploymentMode::Testing
        );
        assert_eq!(
            DeploymentMode::from_str("production").unwrap(),
            DeploymentMode::Production
        );
    }

    #[test]
    fn deployment_mode_rejects_unknown_values() {
        assert!(DeploymentMode::from_str("").is_err());
        assert!(DeploymentMode::from_str("staging").is_err());
    }
}
