//! Key-value store contract and the Redis-backed production implementation.

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::errors::AppError;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Returns true if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Keys matching a glob-style pattern, e.g. `resume:*`.
    async fn list(&self, pattern: &str) -> Result<Vec<String>, AppError>;
}

pub struct RedisKvStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisKvStore {
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url).map_err(redis_err)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_err)?;
        Ok(Self { conn })
    }

    pub async fn check_ready(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(redis_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(redis_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let removed: usize = conn.del(key).await.map_err(redis_err)?;
        Ok(removed > 0)
    }

    async fn list(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        let mut conn = self.conn.clone();
        redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)
    }
}

fn redis_err(e: redis::RedisError) -> AppError {
    AppError::Storage(format!("redis: {e}"))
}
