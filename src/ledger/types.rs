// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Normalized ledger wire model.
//!
//! These types mirror the JSON-formatted XDR the RPC node produces, reduced
//! to the variants this indexer interprets. Accessors follow the checked
//! `as_*` style so decoders can skip malformed values instead of panicking.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A signed 128-bit integer split into its two's-complement (hi, lo) parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Int128Parts {
    pub hi: i64,
    pub lo: u64,
}

impl Int128Parts {
    pub fn value(&self) -> i128 {
        ((self.hi as i128) << 64) | (self.lo as i128)
    }
}

/// Soroban contract value, limited to the kinds the decoders consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScVal {
    Void,
    Bool(bool),
    U32(u32),
    U64(u64),
    I128(Int128Parts),
    Symbol(String),
    String(String),
    Address(String),
    Vec(Vec<ScVal>),
}

impl ScVal {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            ScVal::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ScVal::String(s) => Some(s),
            ScVal::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            ScVal::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ScVal::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ScVal::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<Int128Parts> {
        match self {
            ScVal::I128(parts) => Some(*parts),
            _ => None,
        }
    }

    pub fn as_vec(&self) -> Option<&[ScVal]> {
        match self {
            ScVal::Vec(items) => Some(items),
            _ => None,
        }
    }
}

/// Classic asset identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Native,
    CreditAlphanum4 { code: String, issuer: String },
    CreditAlphanum12 { code: String, issuer: String },
}

/// Rational price as stored in offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManageSellOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    /// Amount of `selling` offered, in stroops. Zero deletes the offer.
    pub amount: i64,
    pub price: Price,
    pub offer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManageBuyOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    /// Amount of `buying` sought, in stroops. Zero deletes the offer.
    pub buy_amount: i64,
    pub price: Price,
    pub offer_id: i64,
}

/// An invoke-contract host function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeHostFunctionOp {
    /// Target contract address; absent for non-invoke host functions
    /// (wasm uploads, contract creation).
    pub contract_address: Option<String>,
    pub function_name: Option<String>,
    #[serde(default)]
    pub args: Vec<ScVal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationBody {
    ManageBuyOffer(ManageBuyOfferOp),
    ManageSellOffer(ManageSellOfferOp),
    InvokeHostFunction(InvokeHostFunctionOp),
    LiquidityPoolDeposit,
    LiquidityPoolWithdraw,
    /// Operation kinds this indexer does not interpret.
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub source_account: Option<String>,
    pub body: OperationBody,
}

/// One crossed counter-offer recorded in a manage-offer success result.
///
/// Amounts and assets are from the counter-offer owner's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAtom {
    pub seller_id: String,
    pub offer_id: i64,
    pub asset_sold: Asset,
    pub amount_sold: i64,
    pub asset_bought: Asset,
    pub amount_bought: i64,
}

/// The offer left on the book after matching, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferEntry {
    pub offer_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferResultCode {
    Success,
    #[serde(other)]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManageOfferResult {
    pub code: OfferResultCode,
    pub success: Option<ManageOfferSuccess>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManageOfferSuccess {
    #[serde(default)]
    pub offers_claimed: Vec<ClaimAtom>,
    /// Remaining offer on the book; `None` or id 0 means fully consumed.
    pub offer: Option<OfferEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    ManageBuyOffer(ManageOfferResult),
    ManageSellOffer(ManageOfferResult),
    InvokeHostFunction,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionResultCode {
    TxSuccess,
    #[serde(other)]
    TxFailed,
}

/// A structured, topic-tagged emission from a Soroban contract invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub contract_id: String,
    #[serde(default)]
    pub topics: Vec<ScVal>,
    pub data: ScVal,
}

/// One settled transaction with its result and emitted contract events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub hash: String,
    pub source_account: String,
    pub result_code: TransactionResultCode,
    #[serde(default)]
    pub operations: Vec<Operation>,
    /// Per-operation results; absent for malformed or fee-bump-wrapped
    /// result encodings the node could not expand.
    pub operation_results: Option<Vec<OperationResult>>,
    #[serde(default)]
    pub events: Vec<ContractEvent>,
}

/// One sequentially-numbered batch of settled transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerMeta {
    pub sequence: u32,
    /// Ledger close time, unix seconds.
    pub close_time: i64,
    #[serde(default)]
    pub transactions: Vec<LedgerTransaction>,
}

impl LedgerMeta {
    /// Ledger close time as a naive UTC timestamp.
    pub fn block_time(&self) -> NaiveDateTime {
        DateTime::from_timestamp(self.close_time, 0)
            .unwrap_or_default()
            .naive_utc()
    }
}
