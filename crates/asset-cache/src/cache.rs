//! File-based asset caching

use crate::error::Result;
use crate::types::{CacheIoStats, CachedAsset};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

/// Sequence for temp file names, unique per write within the process
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Key-value persistence for cached assets, addressed by asset id
///
/// Both operations are infallible from the caller's point of view: a broken
/// cache degrades to a miss on read and to a no-op on write.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Return the stored record for `id`, or `None` if absent or unreadable
    async fn get(&self, id: i64) -> Option<CachedAsset>;

    /// Store `asset` under `asset.id`, replacing any previous record
    async fn put(&self, asset: &CachedAsset);

    /// Failures swallowed so far
    fn io_stats(&self) -> CacheIoStats;
}

/// A cache storing one JSON document per asset in a directory
pub struct DiskCache {
    /// Directory where cache entries are stored
    cache_dir: PathBuf,
    read_errors: AtomicU64,
    write_errors: AtomicU64,
}

impl DiskCache {
    /// Create a new disk cache rooted at `cache_dir`
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            read_errors: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Initialize the cache by ensuring the cache directory exists
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        info!(cache_dir = ?self.cache_dir, "Cache initialized");
        Ok(())
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// File name for an asset id
    pub fn file_name(id: i64) -> String {
        format!("image_{}.cache", id)
    }

    /// Full path of the entry for an asset id
    pub fn entry_path(&self, id: i64) -> PathBuf {
        self.cache_dir.join(Self::file_name(id))
    }

    /// Private temp path for one write of `id`'s entry
    fn tmp_path(&self, id: i64) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.cache_dir
            .join(format!("{}.{}.{}.tmp", Self::file_name(id), std::process::id(), seq))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<CachedAsset>> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    async fn write_entry(&self, asset: &CachedAsset) -> Result<()> {
        let path = self.entry_path(asset.id);
        let tmp = self.tmp_path(asset.id);
        let raw = serde_json::to_vec(asset)?;

        fs::create_dir_all(&self.cache_dir).await?;
        if let Err(e) = fs::write(&tmp, &raw).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn get(&self, id: i64) -> Option<CachedAsset> {
        let path = self.entry_path(id);
        match self.read_entry(&path).await {
            Ok(Some(asset)) if asset.id == id => {
                debug!(asset_id = id, "Cache entry found");
                Some(asset)
            }
            Ok(Some(asset)) => {
                self.read_errors.fetch_add(1, Ordering::Relaxed);
                warn!(asset_id = id, stored_id = asset.id, path = ?path, "Cache entry has mismatched id, ignoring");
                None
            }
            Ok(None) => None,
            Err(e) => {
                self.read_errors.fetch_add(1, Ordering::Relaxed);
                warn!(asset_id = id, path = ?path, error = %e, "Failed to read cache entry, ignoring");
                None
            }
        }
    }

    async fn put(&self, asset: &CachedAsset) {
        match self.write_entry(asset).await {
            Ok(()) => debug!(asset_id = asset.id, size = asset.content.len(), "Cached asset"),
            Err(e) => {
                self.write_errors.fetch_add(1, Ordering::Relaxed);
                warn!(asset_id = asset.id, error = %e, "Failed to write cache entry");
            }
        }
    }

    fn io_stats(&self) -> CacheIoStats {
        CacheIoStats {
            read_errors: self.read_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}
