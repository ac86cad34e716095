//! Redis-backed [`RemoteConnection`] (behind the `redis` feature).

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::OnceCell;
use tracing::debug;

use super::RemoteConnection;
use crate::error::{BackendError, StorageError, StorageResult};

/// Remote connection speaking the Redis protocol.
///
/// Built from a locator, the client connects on first use and keeps one
/// multiplexed connection for every store of the database. Reconnection and
/// timeouts are left to the `redis` crate.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use kvarea_storage::{RedisConnection, RemoteDatabase};
///
/// let conn = RedisConnection::open("redis://127.0.0.1:6379/0")?;
/// let db = RemoteDatabase::with_connection(Arc::new(conn));
/// ```
pub struct RedisConnection {
    client: Option<redis::Client>,
    conn: OnceCell<MultiplexedConnection>,
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection")
            .field("connected", &self.conn.initialized())
            .finish_non_exhaustive()
    }
}

impl RedisConnection {
    /// Prepare a client for `locator` without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the locator is not a valid Redis URL.
    pub fn open(locator: &str) -> StorageResult<Self> {
        let client = redis::Client::open(locator)
            .map_err(|e| StorageError::Config(format!("invalid redis locator: {e}")))?;
        Ok(Self {
            client: Some(client),
            conn: OnceCell::new(),
        })
    }

    /// Wrap an already-established connection.
    #[must_use]
    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self {
            client: None,
            conn: OnceCell::new_with(Some(conn)),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, BackendError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let client = self
                    .client
                    .as_ref()
                    .ok_or_else(|| BackendError::new("redis connection was never established"))?;
                debug!("connecting to redis");
                client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(BackendError::from)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl RemoteConnection for RedisConnection {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let mut conn = self.connection().await?;
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut conn = self.connection().await?;
        Ok(conn.set::<_, _, ()>(key, value).await?)
    }

    async fn del(&self, key: &str) -> Result<(), BackendError> {
        let mut conn = self.connection().await?;
        Ok(conn.del::<_, ()>(key).await?)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), BackendError> {
        let mut conn = self.connection().await?;
        Ok(conn.sadd::<_, _, ()>(key, member).await?)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), BackendError> {
        let mut conn = self.connection().await?;
        Ok(conn.srem::<_, _, ()>(key, member).await?)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, BackendError> {
        let mut conn = self.connection().await?;
        Ok(conn.smembers::<_, Vec<String>>(key).await?)
    }
}
