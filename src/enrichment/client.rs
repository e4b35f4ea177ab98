// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Read-only metadata clients: Soroban contract simulation over Stellar-RPC
//! and classic-asset lookups over Horizon.

use crate::ledger::types::ScVal;
use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct JsonRpcRequest<P: Serialize> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateParams {
    invocation: Invocation,
    xdr_format: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Invocation {
    contract_address: String,
    function_name: String,
    args: Vec<ScVal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResult {
    #[serde(default)]
    results: Vec<SimulationItem>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulationItem {
    return_value_json: ScVal,
}

/// Horizon `/assets` record, trimmed to the fields the supply breakdown
/// needs.
#[derive(Debug, Deserialize)]
pub struct HorizonAssetRecord {
    pub balances: HorizonAssetBalances,
    pub liquidity_pools_amount: String,
    pub contracts_amount: String,
    pub claimable_balances_amount: String,
    pub num_accounts: i32,
    pub flags: HorizonAssetFlags,
}

#[derive(Debug, Deserialize)]
pub struct HorizonAssetBalances {
    pub authorized: String,
}

#[derive(Debug, Deserialize)]
pub struct HorizonAssetFlags {
    pub auth_revocable: bool,
}

#[derive(Debug, Deserialize)]
struct HorizonAssetsPage {
    #[serde(rename = "_embedded")]
    embedded: HorizonEmbedded,
}

#[derive(Debug, Deserialize)]
struct HorizonEmbedded {
    records: Vec<HorizonAssetRecord>,
}

#[derive(Debug, Deserialize)]
struct HorizonAccount {
    thresholds: HorizonThresholds,
}

#[derive(Debug, Deserialize)]
struct HorizonThresholds {
    med_threshold: u8,
    high_threshold: u8,
}

/// Metadata lookups against a Stellar-RPC node and a Horizon instance.
pub struct EnrichmentClient {
    http: reqwest::Client,
    rpc_endpoint: Url,
    horizon_endpoint: Url,
}

impl EnrichmentClient {
    pub fn new(rpc_url: &str, horizon_url: &str) -> Result<Self> {
        let rpc_endpoint = Url::parse(rpc_url).context("invalid RPC_URL")?;
        let horizon_endpoint = Url::parse(horizon_url).context("invalid HORIZON_URL")?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build enrichment HTTP client")?;
        Ok(Self {
            http,
            rpc_endpoint,
            horizon_endpoint,
        })
    }

    /// Simulate a no-argument read-only contract call and return its value.
    pub async fn simulate_read_only_call(
        &self,
        contract_address: &str,
        function_name: &str,
    ) -> Result<ScVal> {
        self.simulate(contract_address, function_name, Vec::new()).await
    }

    pub async fn simulate(
        &self,
        contract_address: &str,
        function_name: &str,
        args: Vec<ScVal>,
    ) -> Result<ScVal> {
        let params = SimulateParams {
            invocation: Invocation {
                contract_address: contract_address.to_string(),
                function_name: function_name.to_string(),
                args,
            },
            xdr_format: "json",
        };
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "simulateTransaction",
            params,
        };

        let response: JsonRpcResponse<SimulateResult> = self
            .http
            .post(self.rpc_endpoint.clone())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("simulation of {contract_address}.{function_name} failed"))?
            .json()
            .await
            .context("simulateTransaction response is not valid JSON")?;

        if let Some(err) = response.error {
            bail!("simulateTransaction RPC error {}: {}", err.code, err.message);
        }
        let result = response
            .result
            .ok_or_else(|| anyhow!("simulateTransaction response carried no result"))?;
        if let Some(err) = result.error {
            bail!("{contract_address}.{function_name} simulation error: {err}");
        }
        result
            .results
            .into_iter()
            .next()
            .map(|item| item.return_value_json)
            .ok_or_else(|| anyhow!("{contract_address}.{function_name} returned no value"))
    }

    pub async fn token_symbol(&self, contract_address: &str) -> Result<String> {
        let value = self.simulate_read_only_call(contract_address, "symbol").await?;
        string_value(&value).ok_or_else(|| anyhow!("symbol() returned a non-string value"))
    }

    pub async fn token_name(&self, contract_address: &str) -> Result<String> {
        let value = self.simulate_read_only_call(contract_address, "name").await?;
        string_value(&value).ok_or_else(|| anyhow!("name() returned a non-string value"))
    }

    pub async fn token_decimals(&self, contract_address: &str) -> Result<u32> {
        let value = self.simulate_read_only_call(contract_address, "decimals").await?;
        value
            .as_u32()
            .ok_or_else(|| anyhow!("decimals() returned a non-u32 value"))
    }

    /// `admin()` traps on tokens without an administrator; errors are the
    /// caller's signal that the token has none.
    pub async fn token_admin(&self, contract_address: &str) -> Result<String> {
        let value = self.simulate_read_only_call(contract_address, "admin").await?;
        value
            .as_address()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("admin() returned a non-address value"))
    }

    pub async fn token_total_supply(&self, contract_address: &str) -> Result<i128> {
        let value = self
            .simulate_read_only_call(contract_address, "total_supply")
            .await?;
        value
            .as_i128()
            .map(|parts| parts.value())
            .ok_or_else(|| anyhow!("total_supply() returned a non-i128 value"))
    }

    /// Horizon record for a classic asset, `None` when the asset is unknown.
    pub async fn horizon_asset(&self, code: &str, issuer: &str) -> Result<Option<HorizonAssetRecord>> {
        let mut url = self.horizon_endpoint.join("assets")?;
        url.query_pairs_mut()
            .append_pair("asset_code", code)
            .append_pair("asset_issuer", issuer);

        let page: HorizonAssetsPage = self
            .get_json(url)
            .await
            .with_context(|| format!("Horizon asset lookup for {code}:{issuer} failed"))?;
        Ok(page.embedded.records.into_iter().next())
    }

    /// An issuer with zeroed medium and high thresholds has locked its master
    /// key: no further issuance is possible.
    pub async fn issuer_is_locked(&self, account_id: &str) -> Result<bool> {
        let url = self.horizon_endpoint.join(&format!("accounts/{account_id}"))?;
        let account: HorizonAccount = self
            .get_json(url)
            .await
            .with_context(|| format!("Horizon account lookup for {account_id} failed"))?;
        Ok(account.thresholds.med_threshold == 0 && account.thresholds.high_threshold == 0)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

fn string_value(value: &ScVal) -> Option<String> {
    value
        .as_string()
        .or_else(|| value.as_symbol())
        .map(str::to_string)
}
