// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Database connection management: a bb8-backed async Postgres pool with TLS
//! support and an embedded migration runner.

use anyhow::{Context, Result};
use diesel::{ConnectionError, ConnectionResult};
use diesel_async::{
    async_connection_wrapper::AsyncConnectionWrapper,
    pooled_connection::{
        bb8::{Pool, PooledConnection},
        AsyncDieselConnectionManager, ManagerConfig,
    },
    AsyncPgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use tracing::{error, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Maximum number of bind parameters Postgres accepts per statement; batch
/// inserts are chunked to stay below it.
pub const MAX_DIESEL_PARAM_SIZE: usize = u16::MAX as usize;

pub type ArcDbPool = Arc<Pool<AsyncPgConnection>>;
pub type DbPoolConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Establish a single Postgres connection, negotiating TLS when the server
/// requires it.
fn establish_connection(database_url: &str) -> BoxFuture<ConnectionResult<AsyncPgConnection>> {
    let url = database_url.to_string();
    async move {
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        let connector = postgres_native_tls::MakeTlsConnector::new(connector);

        let (client, connection) = tokio_postgres::connect(&url, connector)
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Postgres connection terminated: {}", e);
            }
        });

        AsyncPgConnection::try_from(client).await
    }
    .boxed()
}

/// Create the shared connection pool used by the sink and enrichment writers.
pub async fn new_db_pool(database_url: &str, pool_size: u32) -> Result<ArcDbPool> {
    let mut config = ManagerConfig::default();
    config.custom_setup = Box::new(|url| establish_connection(url));
    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(database_url, config);

    let pool = Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .await
        .context("Failed to create database connection pool")?;

    info!("🔌 Database connection pool created with size: {}", pool_size);
    Ok(Arc::new(pool))
}

/// Run all pending embedded migrations.
///
/// Runs on a blocking thread because the migration harness drives the
/// connection synchronously.
pub async fn run_migrations(postgres_connection_string: String) -> Result<()> {
    use diesel::Connection;

    tokio::task::spawn_blocking(move || {
        let mut conn =
            AsyncConnectionWrapper::<AsyncPgConnection>::establish(&postgres_connection_string)
                .context("Failed to open migration connection")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
        info!("🔄 Applied {} pending database migrations", applied.len());
        Ok::<(), anyhow::Error>(())
    })
    .await
    .context("Migration task panicked")??;

    Ok(())
}

/// Split `num_items` rows into insert chunks that respect the Postgres bind
/// parameter limit for a row of `column_count` columns.
pub fn get_chunks(num_items: usize, column_count: usize) -> Vec<(usize, usize)> {
    let max_rows = (MAX_DIESEL_PARAM_SIZE / column_count).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < num_items {
        let end = (start + max_rows).min(num_items);
        chunks.push((start, end));
        start = end;
    }
    chunks
}
