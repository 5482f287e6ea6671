//! Cache types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Auxiliary classification fields carried alongside an asset's content
pub type AssetMetadata = BTreeMap<String, serde_json::Value>;

/// A cached copy of one Asset Store row
///
/// Records are never patched: a stale entry is replaced by writing a new
/// `CachedAsset` for the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAsset {
    pub id: i64,
    pub filename: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    #[serde(default)]
    pub metadata: AssetMetadata,
    pub written_at: DateTime<Utc>,
}

impl CachedAsset {
    /// Build a record stamped with the current time
    pub fn new(id: i64, filename: String, content: Vec<u8>, metadata: AssetMetadata) -> Self {
        Self {
            id,
            filename,
            content,
            metadata,
            written_at: Utc::now(),
        }
    }

    /// Whether the entry may still be served at `now` given a freshness window
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.written_at < ttl
    }
}

/// Counters for cache I/O failures that were logged and swallowed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIoStats {
    pub read_errors: u64,
    pub write_errors: u64,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
