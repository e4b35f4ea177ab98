// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Token and pool metadata enrichment.
//!
//! Decoders only see addresses on the wire; this module fills in what the
//! addresses mean. Soroban contracts answer read-only simulations (`symbol`,
//! `name`, `decimals`, ...), Horizon answers for classic assets wrapped in
//! Stellar Asset Contracts. All of it runs detached from the streaming loop
//! on a bounded worker pool so a slow metadata endpoint can never stall
//! ledger ingestion.
//!
//! The one piece the hot path reads back is the decimals cache: once a
//! token's `decimals()` answer lands, the AMM decoder scales that asset's
//! amounts with the authoritative value instead of the native 7.

pub mod client;
pub mod pool_details;
pub mod token_details;
pub mod worker;

use ahash::AHashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared asset → decimals map, written by enrichment workers and read by
/// the AMM decoder. Absent entries fall back to the native scale.
#[derive(Clone, Default)]
pub struct TokenDecimalsCache {
    inner: Arc<RwLock<AHashMap<String, u32>>>,
}

impl TokenDecimalsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, asset: &str) -> Option<u32> {
        self.inner.read().await.get(asset).copied()
    }

    pub async fn publish(&self, asset: String, decimals: u32) {
        self.inner.write().await.insert(asset, decimals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decimals_cache_round_trips() {
        let cache = TokenDecimalsCache::new();
        assert_eq!(cache.get("CAS3J7GYLGXMF6TDJBBYYSE3HQ6BBSMLNUQ34T6TZMYMW2EVH34XOWMA").await, None);
        cache
            .publish("CAS3J7GYLGXMF6TDJBBYYSE3HQ6BBSMLNUQ34T6TZMYMW2EVH34XOWMA".to_string(), 6)
            .await;
        assert_eq!(
            cache.get("CAS3J7GYLGXMF6TDJBBYYSE3HQ6BBSMLNUQ34T6TZMYMW2EVH34XOWMA").await,
            Some(6)
        );
    }
}
