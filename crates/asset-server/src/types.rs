//! Core types for the asset server

use asset_cache::{AssetMetadata, CacheIoStats, CachedAsset};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::content_type::content_type_for;

/// Retrieval counters reported by the health endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalStats {
    pub hits: u64,
    pub misses: u64,
    pub stale: u64,
    pub store_fetches: u64,
    #[serde(flatten)]
    pub io: CacheIoStats,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: RetrievalStats,
}

/// JSON rendering of an asset and its metadata
#[derive(Debug, Serialize)]
pub struct AssetEnvelope {
    pub file: FileBody,
    pub metadata: AssetMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBody {
    /// Base64-encoded payload
    pub content: String,
    pub filename: String,
    pub content_type: String,
}

impl From<&CachedAsset> for AssetEnvelope {
    fn from(asset: &CachedAsset) -> Self {
        Self {
            file: FileBody {
                content: STANDARD.encode(&asset.content),
                filename: asset.filename.clone(),
                content_type: content_type_for(&asset.filename).to_string(),
            },
            metadata: asset.metadata.clone(),
        }
    }
}

/// Body of `POST /assets`
#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub files: Vec<UploadFile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadFile {
    pub name: Option<String>,
    /// Base64 payload, optionally prefixed with a `data:<mime>;base64,` header
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: UploadedAsset,
}

#[derive(Debug, Serialize)]
pub struct UploadedAsset {
    pub id: i64,
    pub filename: String,
    pub size: usize,
}
