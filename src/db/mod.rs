// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! # Database Layer
//!
//! This module provides the database abstraction layer for the indexer,
//! including models, schema definitions, and the persistence sink.
//!
//! ## Architecture
//!
//! - **Common models**: the normalized records the decoders emit
//! - **PostgreSQL-specific code**: diesel schema and the sink implementation
//! - **`sink`**: the `RecordSink` contract every writer goes through,
//!   substitutable with an in-memory fake for testing
//!
//! ## Database Schema
//!
//! Four logical tables:
//! - `transaction_models`: one row per normalized DEX trade, with the
//!   counter-offer matches as a nested JSONB document
//! - `price_ticks`: oracle price observations
//! - `token_info`: asset metadata filled in by enrichment
//! - `liquidity_pools`: lazily-created pool placeholders
//!
//! ## Write Contracts
//!
//! Batched inserts (trades, ticks) are transactional and all-or-nothing;
//! token and pool writes are conflict-resolving upserts keyed by natural
//! identity, so repeated enrichment stays idempotent.

/// Common record models shared by decoders, sink and tests
pub mod common;

/// PostgreSQL-specific implementation: diesel schema and the sink
pub mod postgres;

/// The storage contract all record writers go through
pub mod sink;
