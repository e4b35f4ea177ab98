// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Token metadata assembly.
//!
//! Soroban addresses (C...) answer the standard token interface directly.
//! Stellar Asset Contracts reveal themselves by a `CODE:GISSUER` name; for
//! those the classic Horizon record supplies the supply breakdown, holder
//! count and issuer auth flags that the contract interface cannot.

use crate::db::common::models::token_models::{SupplyBreakdown, TokenInfoModel};
use crate::db::sink::RecordSink;
use crate::enrichment::client::{EnrichmentClient, HorizonAssetRecord};
use crate::enrichment::TokenDecimalsCache;
use crate::utils::formatters::parse_sac_name;
use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use tracing::{debug, info};

/// Fetch, assemble and store metadata for one token address, then publish
/// its decimals to the shared cache. Already-known tokens are a no-op.
pub async fn add_token_data(
    client: &EnrichmentClient,
    sink: &dyn RecordSink,
    cache: &TokenDecimalsCache,
    token_address: &str,
) -> Result<()> {
    if sink.token_exists(token_address).await? {
        // Re-seed the cache from the store so decimals survive restarts.
        if cache.get(token_address).await.is_none() {
            if let Some(decimals) = sink.token_decimals(token_address).await? {
                cache.publish(token_address.to_string(), decimals as u32).await;
            }
        }
        debug!("Token {} already enriched, skipping", token_address);
        return Ok(());
    }

    if !token_address.starts_with('C') {
        // Classic asset identifiers reach here from order-book trades; their
        // records come from Horizon once a SAC wrapper is observed.
        debug!("Skipping non-contract token identifier {}", token_address);
        return Ok(());
    }

    let symbol = client
        .token_symbol(token_address)
        .await
        .context("token symbol lookup failed")?;
    let name = client
        .token_name(token_address)
        .await
        .context("token name lookup failed")?;
    let decimals = client
        .token_decimals(token_address)
        .await
        .context("token decimals lookup failed")?;

    // Both calls trap on contracts that lack them; absence is data here.
    let admin_address = client.token_admin(token_address).await.ok();
    let total_supply_raw = client.token_total_supply(token_address).await.ok();
    let mut total_supply = total_supply_raw
        .map(|raw| BigDecimal::new(BigInt::from(raw), decimals as i64).to_string());

    let sac = parse_sac_name(&name);
    let mut is_auth_revocable = false;
    let mut is_mintable = admin_address.is_some();
    let mut num_accounts = None;
    let mut supply_breakdown = None;

    if let Some((code, issuer)) = sac {
        if let Some(record) = client.horizon_asset(code, issuer).await? {
            let breakdown = supply_breakdown_from_record(&record);
            if total_supply.is_none() {
                total_supply = Some(breakdown.total.to_string());
            }
            is_auth_revocable = record.flags.auth_revocable;
            num_accounts = Some(record.num_accounts);
            supply_breakdown = Some(serde_json::to_value(&breakdown)?);
        }
        is_mintable = !client.issuer_is_locked(issuer).await.unwrap_or(false);
    } else if let Some(admin) = admin_address.as_deref() {
        // A G-address admin is a classic account whose thresholds decide
        // whether further issuance is possible.
        if admin.starts_with('G') {
            is_mintable = !client.issuer_is_locked(admin).await.unwrap_or(false);
        }
    }
    let is_sac = sac.is_some();

    let token = TokenInfoModel {
        contract_address: token_address.to_string(),
        symbol,
        name,
        decimals: decimals as i32,
        total_supply,
        admin_address,
        is_auth_revocable,
        is_mintable,
        is_sac,
        num_accounts,
        supply_breakdown,
    };

    sink.upsert_token(token).await?;
    cache.publish(token_address.to_string(), decimals).await;
    info!("✅ Enriched token {} ({} decimals)", token_address, decimals);
    Ok(())
}

fn supply_breakdown_from_record(record: &HorizonAssetRecord) -> SupplyBreakdown {
    let authorized = parse_amount(&record.balances.authorized);
    let liquidity_pools = parse_amount(&record.liquidity_pools_amount);
    let contracts = parse_amount(&record.contracts_amount);
    let claimable_balances = parse_amount(&record.claimable_balances_amount);
    SupplyBreakdown {
        authorized,
        liquidity_pools,
        contracts,
        claimable_balances,
        total: authorized + liquidity_pools + contracts + claimable_balances,
    }
}

fn parse_amount(amount: &str) -> f64 {
    amount.parse().unwrap_or(0.0)
}
