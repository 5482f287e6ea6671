//! In-memory cache store

use crate::cache::CacheStore;
use crate::types::{CacheIoStats, CachedAsset};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A [`CacheStore`] that keeps records in a map
///
/// Does not survive restarts. Useful in tests and when no writable
/// directory is available.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<i64, CachedAsset>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, id: i64) -> Option<CachedAsset> {
        self.entries.read().await.get(&id).cloned()
    }

    async fn put(&self, asset: &CachedAsset) {
        self.entries.write().await.insert(asset.id, asset.clone());
    }

    fn io_stats(&self) -> CacheIoStats {
        CacheIoStats::default()
    }
}
