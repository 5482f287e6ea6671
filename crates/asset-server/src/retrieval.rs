//! Cache-or-fetch retrieval of assets
//!
//! A request is served from the [`CacheStore`] when the entry is younger than
//! the TTL; otherwise the row is fetched from the [`AssetStore`], validated,
//! written back to the cache, and served. Concurrent misses for the same id
//! each fetch and overwrite the entry; they all write the same content.

use crate::error::AppError;
use crate::store::{AssetStore, StoredAsset};
use crate::types::RetrievalStats;
use asset_cache::{CacheStore, CachedAsset};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TTL_SECS: u64 = 60 * 60;

// Upper bound accepted by chrono::Duration::seconds
const MAX_TTL_SECS: u64 = (i64::MAX / 1000) as u64;

/// Validate a path segment as an asset id
pub fn parse_asset_id(raw: &str) -> Result<i64, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidInput(
            "Invalid asset ID: must be a positive integer".to_string(),
        ));
    }
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidInput("Invalid asset ID: out of range".to_string()))
}

/// An asset ready to render
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub asset: CachedAsset,
    pub from_cache: bool,
}

pub struct AssetRetriever {
    store: Arc<dyn AssetStore>,
    cache: Arc<dyn CacheStore>,
    ttl_secs: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    store_fetches: AtomicU64,
}

impl AssetRetriever {
    pub fn new(store: Arc<dyn AssetStore>, cache: Arc<dyn CacheStore>, ttl_secs: u64) -> Self {
        Self {
            store,
            cache,
            ttl_secs: ttl_secs.min(MAX_TTL_SECS),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            store_fetches: AtomicU64::new(0),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs as i64)
    }

    /// Retrieve by raw path segment, rejecting malformed ids before any I/O
    pub async fn retrieve(&self, raw_id: &str) -> Result<Retrieved, AppError> {
        let id = parse_asset_id(raw_id)?;
        self.retrieve_id(id).await
    }

    pub async fn retrieve_id(&self, id: i64) -> Result<Retrieved, AppError> {
        match self.cache.get(id).await {
            Some(asset) if asset.is_fresh(Utc::now(), self.ttl()) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(asset_id = id, "Cache hit");
                return Ok(Retrieved {
                    asset,
                    from_cache: true,
                });
            }
            Some(asset) => {
                self.stale.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(asset_id = id, written_at = %asset.written_at, "Cache entry expired");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(asset_id = id, "Cache miss");
            }
        }

        self.store_fetches.fetch_add(1, Ordering::Relaxed);
        let row = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        let asset = into_cached(id, row)?;
        self.cache.put(&asset).await;

        Ok(Retrieved {
            asset,
            from_cache: false,
        })
    }

    pub fn stats(&self) -> RetrievalStats {
        RetrievalStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            store_fetches: self.store_fetches.load(Ordering::Relaxed),
            io: self.cache.io_stats(),
        }
    }
}

/// A row is usable only with non-empty content and filename
fn into_cached(id: i64, row: StoredAsset) -> Result<CachedAsset, AppError> {
    let content = row.content.filter(|c| !c.is_empty());
    let filename = row.filename.filter(|f| !f.trim().is_empty());

    match (content, filename) {
        (Some(content), Some(filename)) => {
            Ok(CachedAsset::new(id, filename, content, row.metadata))
        }
        _ => Err(AppError::InvalidData(format!(
            "File content or filename missing for asset {}",
            id
        ))),
    }
}
