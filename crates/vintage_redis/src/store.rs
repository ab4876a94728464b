// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Redis connection handling and command mapping.

use std::time::Duration;

use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use vintage_kv::{Error, KeyValueStore, Result};

/// Connection configuration for [`RedisStore`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vintage_redis::RedisConfig;
///
/// let config = RedisConfig::new("redis://cache.internal:6379")
///     .connect_timeout(Duration::from_secs(3))
///     .response_timeout(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct RedisConfig {
    url: String,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl RedisConfig {
    /// Creates a configuration for the given connection URL with default
    /// timeouts (5s connect, 2s per command).
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(2),
        }
    }

    /// Sets the timeout for establishing connections.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the timeout for individual command responses.
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Returns the connection URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A Redis-backed key-value store.
///
/// Wraps a [`ConnectionManager`], which multiplexes commands over one
/// connection and reconnects automatically after network failures. Cloning
/// the store clones the handle, not the connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to Redis and returns a store handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the initial connection
    /// cannot be established within the configured timeout.
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(Error::from_message)?;
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.response_timeout);
        let conn = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(Error::from_message)?;
        Ok(Self { conn })
    }

    /// Wraps an existing connection manager.
    ///
    /// Useful when the surrounding application already owns a Redis handle
    /// and wants the cache layer to share it.
    #[must_use]
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(Error::from_message)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl {
            // PX rather than EX: jittered TTLs are not whole seconds.
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex(key, value, millis).await.map_err(Error::from_message)
            }
            None => conn.set(key, value).await.map_err(Error::from_message),
        }
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        conn.incr(key, delta).await.map_err(Error::from_message)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(Error::from_message)
    }
}
