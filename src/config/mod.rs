// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! # Configuration Management
//!
//! This module handles all configuration aspects of the indexer: deployment
//! mode selection, ledger-source endpoints, and database connection settings.
//!
//! ## Configuration Sources
//!
//! Configuration is loaded from environment variables, optionally seeded from
//! a `dev.env` style file passed on the command line. There are deliberately
//! no further CLI flags: the process either starts with a complete environment
//! or exits with a non-zero code.
//!
//! ## Deployment Modes
//!
//! - `testing`: start streaming at the node's current latest ledger
//! - `production`: resume one past the last ledger committed to storage
//!
//! An unset or unrecognized mode is a fatal startup condition, never retried.

/// Environment-driven indexer configuration and deployment mode definitions
pub mod indexer_config;

pub use indexer_config::{DeploymentMode, IndexerConfig};
