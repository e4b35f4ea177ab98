// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! # Utility Functions and Shared Components
//!
//! This module contains utility functions and shared components used
//! throughout the indexer for database operations, fixed-point decoding and
//! cursor management.
//!
//! ## Key Components
//!
//! ### Database Utilities (`database`)
//! - Connection pool management and configuration
//! - Embedded migration runner
//!
//! ### Fixed-Point Codec (`numeric`)
//! - Exact 128-bit fixed-point to decimal conversion
//! - Native 7-decimal (stroop) helpers
//!
//! ### Formatters (`formatters`)
//! - Canonical asset keys (`XLM`, `CODE:ISSUER`)
//! - Stellar Asset Contract (SAC) name detection
//!
//! ### Cursor Management (`starting_version`)
//! - Determines the starting ledger sequence for streaming
//! - Handles resume from the last committed sequence

/// Database connection management, pooling, and migration utilities
pub mod database;

/// Fixed-point decimal decoding for 128-bit on-chain amounts
pub mod numeric;

/// Asset and address rendering helpers
pub mod formatters;

/// Ledger cursor resolution and starting sequence determination
pub mod starting_version;
