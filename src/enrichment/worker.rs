// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Bounded enrichment worker pool.
//!
//! Jobs flow through a bounded mpsc channel into a fixed number of workers.
//! A full queue makes `schedule_*` wait, which backpressures the dispatcher
//! instead of letting lookup work grow without limit. Worker failures are
//! logged and dropped; enrichment is best-effort by contract.

use crate::db::sink::RecordSink;
use crate::enrichment::client::EnrichmentClient;
use crate::enrichment::{pool_details, token_details, TokenDecimalsCache};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, PartialEq, Eq)]
pub enum EnrichmentJob {
    Token { address: String },
    Pool { address: String },
}

/// Cheap cloneable handle the dispatcher uses to enqueue lookups.
#[derive(Clone)]
pub struct EnrichmentHandle {
    tx: Option<mpsc::Sender<EnrichmentJob>>,
}

impl EnrichmentHandle {
    /// Handle that drops every job; used where enrichment is not wired up.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Handle over a caller-owned channel, so tests can observe what gets
    /// scheduled without spinning up workers.
    pub fn with_sender(tx: mpsc::Sender<EnrichmentJob>) -> Self {
        Self { tx: Some(tx) }
    }

    pub async fn schedule_token(&self, address: String) {
        self.schedule(EnrichmentJob::Token { address }).await;
    }

    pub async fn schedule_pool(&self, address: String) {
        self.schedule(EnrichmentJob::Pool { address }).await;
    }

    /// Enqueue a job. Waits when the queue is full; never fails the caller.
    async fn schedule(&self, job: EnrichmentJob) {
        let Some(tx) = &self.tx else { return };
        if tx.send(job).await.is_err() {
            warn!("⚠️ Enrichment pool is gone, job dropped");
        }
    }
}

/// Spawn `workers` tasks sharing one bounded queue of `queue_size` jobs.
pub fn spawn_enrichment_pool(
    workers: usize,
    queue_size: usize,
    client: Arc<EnrichmentClient>,
    sink: Arc<dyn RecordSink>,
    cache: TokenDecimalsCache,
) -> (EnrichmentHandle, Vec<JoinHandle<()>>) {
    let (tx, rx) = mpsc::channel(queue_size);
    let rx = Arc::new(Mutex::new(rx));

    let handles = (0..workers)
        .map(|worker_id| {
            let rx = Arc::clone(&rx);
            let client = Arc::clone(&client);
            let sink = Arc::clone(&sink);
            let cache = cache.clone();
            tokio::spawn(async move {
                loop {
                    // Lock only to receive so workers drain the queue in
                    // parallel.
                    let job = rx.lock().await.recv().await;
                    let Some(job) = job else { break };
                    run_job(&client, sink.as_ref(), &cache, job).await;
                }
                info!("🛑 Enrichment worker {} stopped", worker_id);
            })
        })
        .collect();

    info!("🔌 Enrichment pool started: {} workers, queue {}", workers, queue_size);
    (EnrichmentHandle { tx: Some(tx) }, handles)
}

async fn run_job(
    client: &EnrichmentClient,
    sink: &dyn RecordSink,
    cache: &TokenDecimalsCache,
    job: EnrichmentJob,
) {
    let outcome = match &job {
        EnrichmentJob::Token { address } => {
            token_details::add_token_data(client, sink, cache, address).await
        }
        EnrichmentJob::Pool { address } => pool_details::add_pool_data(sink, address).await,
    };
    if let Err(e) = outcome {
        warn!("⚠️ Enrichment job {:?} failed: {:#}", job, e);
    }
}
