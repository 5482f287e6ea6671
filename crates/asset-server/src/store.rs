//! Asset Store access
//!
//! The retrieval path only needs a point lookup by primary key, so the store
//! is modelled as a small capability trait with a PostgreSQL implementation.

use asset_cache::AssetMetadata;
use asset_db::{AssetRow, InsertAssetParams, PgPool};
use async_trait::async_trait;
use std::fmt;

/// A row as it comes out of the store, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredAsset {
    pub content: Option<Vec<u8>>,
    pub filename: Option<String>,
    pub metadata: AssetMetadata,
}

impl From<AssetRow> for StoredAsset {
    fn from(row: AssetRow) -> Self {
        let metadata = row.metadata();
        Self {
            content: row.content,
            filename: row.filename,
            metadata,
        }
    }
}

/// A new asset to be inserted
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub content: Vec<u8>,
    pub filename: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached; retrying later may succeed
    Unavailable(String),
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Query failed: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StoreError::Unavailable(e.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Point lookup by primary key; `Ok(None)` when no row matches
    async fn fetch(&self, id: i64) -> Result<Option<StoredAsset>, StoreError>;

    /// Insert a new asset, returning its primary key
    async fn insert(&self, asset: NewAsset) -> Result<i64, StoreError>;
}

/// PostgreSQL-backed Asset Store
pub struct PgAssetStore {
    pool: PgPool,
}

impl PgAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn fetch(&self, id: i64) -> Result<Option<StoredAsset>, StoreError> {
        let row = asset_db::assets::get_by_id(&self.pool, id).await?;
        Ok(row.map(StoredAsset::from))
    }

    async fn insert(&self, asset: NewAsset) -> Result<i64, StoreError> {
        let params = InsertAssetParams {
            content: asset.content,
            filename: asset.filename,
            klassifikation_1: asset.description,
            klassifikation_2: asset.category,
        };
        let inserted = asset_db::assets::insert(&self.pool, &params).await?;
        Ok(inserted.id)
    }
}
