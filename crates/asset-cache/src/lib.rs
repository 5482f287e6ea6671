//! Disk-backed asset cache
//!
//! Holds copies of binary assets fetched from the database, one file per
//! primary key, so repeated requests avoid large BLOB round-trips. Freshness
//! is judged by the caller from [`CachedAsset::written_at`]; the cache itself
//! returns whatever it holds.

mod cache;
mod error;
mod memory;
mod types;

pub use cache::{CacheStore, DiskCache};
pub use error::{CacheError, Result};
pub use memory::MemoryCache;
pub use types::{AssetMetadata, CacheIoStats, CachedAsset};
