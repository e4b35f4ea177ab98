// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Startup-time oracle asset registry.
//!
//! Reflector's `set_price` arguments carry no asset identities, only
//! positions; each contract's `assets()` view gives the position → asset
//! mapping. The registry fetches every deployment's list once at startup and
//! is read-only afterwards, so the decoder sees one consistent ordering for
//! the life of the process.

use super::constants::REFLECTOR_CONTRACTS;
use crate::enrichment::client::EnrichmentClient;
use crate::ledger::types::ScVal;
use ahash::AHashMap;
use tracing::{info, warn};

pub struct OracleRegistry {
    assets_by_contract: AHashMap<String, Vec<String>>,
}

impl OracleRegistry {
    /// Registry with no asset lists; every `set_price` will be skipped.
    pub fn empty() -> Self {
        Self {
            assets_by_contract: AHashMap::new(),
        }
    }

    /// Registry over explicit asset lists.
    pub fn with_assets(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        Self {
            assets_by_contract: entries.into_iter().collect(),
        }
    }

    /// Fetch the asset list of every known Reflector deployment. A contract
    /// whose list cannot be fetched stays unregistered; its updates are
    /// skipped rather than misattributed.
    pub async fn bootstrap(client: &EnrichmentClient) -> Self {
        let mut assets_by_contract = AHashMap::new();
        for contract in REFLECTOR_CONTRACTS {
            match client.simulate_read_only_call(contract, "assets").await {
                Ok(value) => {
                    let assets = parse_asset_list(&value);
                    info!("🔌 Oracle {}: {} tracked assets", contract, assets.len());
                    assets_by_contract.insert(contract.to_string(), assets);
                }
                Err(e) => {
                    warn!("⚠️ Failed to fetch asset list for oracle {}: {:#}", contract, e);
                }
            }
        }
        Self { assets_by_contract }
    }

    pub fn is_oracle(&self, contract: &str) -> bool {
        REFLECTOR_CONTRACTS.contains(&contract)
    }

    /// Position-indexed asset list, `None` when the list is unknown or empty.
    pub fn assets(&self, contract: &str) -> Option<&[String]> {
        self.assets_by_contract
            .get(contract)
            .map(Vec::as_slice)
            .filter(|assets| !assets.is_empty())
    }
}

/// Reflector's `Asset` enum arrives as `[tag, value]` pairs: `Stellar`
/// carries a contract address, `Other` a ticker symbol.
fn parse_asset_list(value: &ScVal) -> Vec<String> {
    let Some(items) = value.as_vec() else {
        return Vec::new();
    };
    items.iter().filter_map(parse_asset).collect()
}

fn parse_asset(item: &ScVal) -> Option<String> {
    if let Some(pair) = item.as_vec() {
        let value = pair.get(1)?;
        return value
            .as_address()
            .or_else(|| value.as_string())
            .map(str::to_string);
    }
    item.as_address()
        .or_else(|| item.as_string())
        .map(str::to_string)
}
