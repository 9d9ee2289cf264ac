//! Redis-backed cache, the process-external store shared across workers.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{info, warn};

use super::store::{CacheError, ReadCache};

pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect with a bounded timeout so an unreachable backend fails fast at
    /// startup instead of hanging the boot sequence.
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(|err| CacheError::Connection(err.to_string()))?;

        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Connection("connection timed out".to_string()))?
            .map_err(|err| CacheError::Connection(err.to_string()))?;

        info!(url, "connected to read-path cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ReadCache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "cache GET failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|err| CacheError::Operation(err.to_string()))
    }
}
