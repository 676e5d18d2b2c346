//! Redis cache implementation

use std::fmt;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use super::{decode_value, encode_value, Cache, CacheError, CacheValue};

/// Cache stored in a Redis database
#[derive(Clone)]
pub struct RedisCache {
    connection: MultiplexedConnection,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"<MultiplexedConnection>")
            .finish()
    }
}

fn backend_error(context: &str, e: redis::RedisError) -> CacheError {
    CacheError::Backend(format!("{}: {}", context, e))
}

impl RedisCache {
    /// Connects to `url` (e.g. `redis://:password@127.0.0.1:6379`) and pings it
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client =
            Client::open(url).map_err(|e| backend_error("Failed to create Redis client", e))?;
        let mut connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| backend_error("Failed to connect to Redis", e))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| backend_error("Redis did not answer PING", e))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        tracing::debug!(key, "reading cache");
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| backend_error(&format!("Failed to get key '{}'", key), e))?;
        Ok(raw.map(decode_value))
    }

    async fn set(&self, key: &str, value: &CacheValue) -> Result<(), CacheError> {
        tracing::debug!(key, "writing cache");
        let mut conn = self.connection.clone();
        let _: () = conn
            .set(key, encode_value(value))
            .await
            .map_err(|e| backend_error(&format!("Failed to set key '{}'", key), e))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        tracing::warn!("flushing redis database");
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(|e| backend_error("Failed to flush database", e))?;
        Ok(())
    }
}
