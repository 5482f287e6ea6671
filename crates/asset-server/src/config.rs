use crate::retrieval::DEFAULT_TTL_SECS;
use std::env;
use std::path::PathBuf;

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub cache_dir: PathBuf,
    pub cache_ttl_secs: u64,
    /// `development` exposes diagnostic detail in error bodies
    pub app_env: String,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5001,
            database_url: "postgres://localhost/company".to_string(),
            db_max_connections: 10,
            cache_dir: PathBuf::from("./temp_cache"),
            cache_ttl_secs: DEFAULT_TTL_SECS,
            app_env: "production".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from an arbitrary variable source, falling back to
    /// defaults for missing or unparseable values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.db_max_connections);

        let cache_dir = lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let cache_ttl_secs = lookup("CACHE_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cache_ttl_secs);

        let app_env = lookup("APP_ENV")
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.app_env);

        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_body_bytes);

        Self {
            port,
            database_url,
            db_max_connections,
            cache_dir,
            cache_ttl_secs,
            app_env,
            max_body_bytes,
        }
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
