// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! First-sighting registration of AMM pools.
//!
//! Pool composition is not on the trade event, so a newly seen pool gets a
//! placeholder row immediately; token legs are filled in by a later pass
//! once the pool contract's reserves interface is wired up.

use crate::db::common::models::pool_models::LiquidityPoolModel;
use crate::db::sink::RecordSink;
use anyhow::Result;
use tracing::{debug, info};

pub async fn add_pool_data(sink: &dyn RecordSink, pool_address: &str) -> Result<()> {
    if sink.pool_exists(pool_address).await? {
        debug!("Pool {} already registered, skipping", pool_address);
        return Ok(());
    }

    sink.upsert_pool(LiquidityPoolModel::placeholder(pool_address.to_string()))
        .await?;
    info!("✅ Registered liquidity pool {}", pool_address);
    Ok(())
}
