//! Key-value cache for search results and saved aliases
//!
//! The [`Cache`] trait is the whole contract the search proxy depends on:
//! `get`, `set` and `clear` over string keys. Structured values (objects,
//! arrays) are stored as their JSON text; plain strings are stored as-is
//! unless their text would itself parse as JSON (`"123"`, `"true"`), in which
//! case they are stored as a quoted JSON string. On read, text that parses as
//! JSON comes back structured.

mod manager;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use manager::FileCache;
pub use memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::CacheConfig;

/// Value type stored in a [`Cache`]
pub type CacheValue = Value;

/// Errors raised by a cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// A string-keyed store for JSON values
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the value stored under `key`, or `None` on a miss
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &CacheValue) -> Result<(), CacheError>;

    /// Removes every entry
    async fn clear(&self) -> Result<(), CacheError>;
}

/// Encodes a value for storage: strings raw, everything else as JSON text
///
/// A string that reads as JSON is quoted so it decodes back to a string.
pub fn encode_value(value: &CacheValue) -> String {
    match value {
        Value::String(s) if serde_json::from_str::<Value>(s).is_err() => s.clone(),
        other => other.to_string(),
    }
}

/// Inverse of [`encode_value`]: JSON text is decoded, anything else is a string
pub fn decode_value(raw: String) -> CacheValue {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Available cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// JSON files under the user cache directory
    #[default]
    File,
    /// Process-local map, gone on exit
    Memory,
    /// Redis server (requires the `redis` feature)
    Redis,
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::File => write!(f, "file"),
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

impl FromStr for CacheBackend {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(CacheBackend::File),
            "memory" | "in_memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(CacheError::Backend(format!(
                "Unknown cache backend: {}. Valid backends: file, memory, redis",
                s
            ))),
        }
    }
}

/// Opens the configured cache, or `None` when caching is disabled
pub async fn open(config: &CacheConfig) -> Result<Option<Arc<dyn Cache>>, CacheError> {
    if !config.enabled {
        return Ok(None);
    }

    let cache: Arc<dyn Cache> = match config.backend {
        CacheBackend::File => {
            let cache = match config.dir {
                Some(ref dir) => FileCache::with_dir(dir.clone()),
                None => FileCache::new().ok_or_else(|| {
                    CacheError::Backend("could not determine a cache directory".to_string())
                })?,
            };
            Arc::new(cache.with_ttl_hours(config.ttl_hours))
        }
        CacheBackend::Memory => Arc::new(InMemoryCache::new()),
        CacheBackend::Redis => open_redis(config).await?,
    };

    tracing::debug!(backend = %config.backend, "cache opened");
    Ok(Some(cache))
}

#[cfg(feature = "redis")]
async fn open_redis(config: &CacheConfig) -> Result<Arc<dyn Cache>, CacheError> {
    let url = config
        .redis_url
        .as_deref()
        .ok_or_else(|| CacheError::Backend("cache.redis_url must be set".to_string()))?;
    Ok(Arc::new(RedisCache::connect(url).await?))
}

#[cfg(not(feature = "redis"))]
async fn open_redis(_config: &CacheConfig) -> Result<Arc<dyn Cache>, CacheError> {
    Err(CacheError::Backend(
        "redis backend requires building with the `redis` feature".to_string(),
    ))
}
