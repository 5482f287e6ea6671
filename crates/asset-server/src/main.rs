//! Asset server - REST access to scanned documents and images
//!
//! Serves binary assets from the relational Asset Store, keeping a
//! disk-backed copy of each asset for an hour to avoid repeated BLOB fetches.

mod config;
mod content_type;
mod error;
mod retrieval;
mod server;
mod store;
mod types;
mod upload;

use crate::config::Config;
use crate::error::Result;
use crate::server::{start_server, ServerState, SharedState};
use crate::store::PgAssetStore;
use asset_cache::DiskCache;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("asset_server=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting asset server...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache TTL: {} seconds", config.cache_ttl_secs);
    info!("Environment: {}", config.app_env);

    // Lazy pool: the server comes up while the database is down and answers 503
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&config.database_url)?;

    let cache = DiskCache::new(config.cache_dir.clone());
    if let Err(e) = cache.init().await {
        // Writes will fail and be counted; reads degrade to misses
        warn!(error = %e, "Cache directory unavailable, continuing without a warm cache");
    }

    let state: SharedState = Arc::new(ServerState::new(
        Arc::new(PgAssetStore::new(pool)),
        Arc::new(cache),
        config.cache_ttl_secs,
        config.is_development(),
    ));

    start_server(state, config.port, config.max_body_bytes).await?;

    Ok(())
}
