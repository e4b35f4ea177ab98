// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

use crate::config::DeploymentMode;
use crate::db::sink::RecordSink;
use crate::ledger::backend::LedgerBackend;
use anyhow::Result;
use tracing::info;

/// Resolve the ledger sequence streaming starts from.
///
/// - `testing`: the node's current latest ledger (health check).
/// - `production`: one past the highest sequence already committed to
///   storage, so a fully committed ledger is never re-fetched and an
///   uncommitted one is never skipped. An empty store falls back to the
///   node's latest ledger.
pub async fn get_starting_sequence(
    mode: DeploymentMode,
    backend: &dyn LedgerBackend,
    sink: &dyn RecordSink,
) -> Result<u32> {
    let start = match mode {
        DeploymentMode::Testing => backend.get_health().await?,
        DeploymentMode::Production => match sink.last_committed_sequence().await? {
            Some(committed) => committed + 1,
            None => backend.get_health().await?,
        },
    };
    info!("🚀 Starting ledger stream at sequence {} ({} mode)", start, mode);
    Ok(start)
}
