//! Redis-backed store
//!
//! WATCH state lives on a Redis connection, so every session owns a dedicated
//! (non-multiplexed) connection for its whole lifetime. Idle connections are
//! kept in a small free list and reused by later sessions.
//!
//! A conditional commit is `MULTI / SET / EXEC`; Redis answers EXEC with nil
//! when a watched key was touched, which is surfaced as
//! `StoreError::WatchConflict`.

use super::{AccountStore, StoreSession};
use crate::types::StoreError;
use ::redis::aio::Connection;
use ::redis::{AsyncCommands, Client, Value};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Connection settings for the Redis store
#[derive(Debug, Clone, PartialEq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    /// Upper bound on idle connections kept for reuse
    pub max_idle: usize,
}

impl RedisConfig {
    /// Connection URL understood by the redis client
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            max_idle: 10,
        }
    }
}

struct Pool {
    client: Client,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
}

impl Pool {
    fn checkin(&self, connection: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(connection);
            }
        }
    }

    fn checkout(&self) -> Option<Connection> {
        self.idle.lock().ok().and_then(|mut idle| idle.pop())
    }
}

/// Store backed by a Redis server
#[derive(Clone)]
pub struct RedisStore {
    pool: Arc<Pool>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("max_idle", &self.pool.max_idle)
            .finish()
    }
}

impl RedisStore {
    /// Connect to Redis and verify the server answers
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the server cannot be reached and
    /// `StoreError::Protocol` if the configuration is rejected by the client.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let url = config.url();
        let client = Client::open(url.as_str())?;
        let store = RedisStore {
            pool: Arc::new(Pool {
                client,
                idle: Mutex::new(Vec::new()),
                max_idle: config.max_idle,
            }),
        };

        // Fail fast on a bad address instead of on the first request
        let mut session = store.session().await?;
        ::redis::cmd("PING")
            .query_async::<_, String>(session.connection()?)
            .await?;
        info!(url = %url, "Connected to Redis");

        Ok(store)
    }
}

#[async_trait]
impl AccountStore for RedisStore {
    type Session = RedisSession;

    async fn session(&self) -> Result<Self::Session, StoreError> {
        let connection = match self.pool.checkout() {
            Some(connection) => connection,
            None => {
                debug!("Opening new Redis connection");
                self.pool.client.get_async_connection().await?
            }
        };

        Ok(RedisSession {
            pool: Arc::clone(&self.pool),
            connection: Some(connection),
            watching: false,
        })
    }
}

/// Session holding one dedicated Redis connection
pub struct RedisSession {
    pool: Arc<Pool>,
    connection: Option<Connection>,
    /// Whether the connection may still carry WATCH state
    watching: bool,
}

impl RedisSession {
    fn connection(&mut self) -> Result<&mut Connection, StoreError> {
        self.connection.as_mut().ok_or_else(|| StoreError::Connection {
            message: "session connection already released".to_string(),
        })
    }

    /// Drop the connection after a transport error so it is never reused
    fn poison<T>(&mut self, result: Result<T, ::redis::RedisError>) -> Result<T, StoreError> {
        result.map_err(|error| {
            if error.is_io_error() || error.is_connection_dropped() {
                self.connection = None;
            }
            StoreError::from(error)
        })
    }
}

impl Drop for RedisSession {
    fn drop(&mut self) {
        // A connection that may still hold a WATCH is discarded rather than
        // handed to another session
        if let Some(connection) = self.connection.take() {
            if !self.watching {
                self.pool.checkin(connection);
            }
        }
    }
}

#[async_trait]
impl StoreSession for RedisSession {
    async fn watch(&mut self, key: &str) -> Result<(), StoreError> {
        self.watching = true;
        let result = ::redis::cmd("WATCH")
            .arg(key)
            .query_async::<_, ()>(self.connection()?)
            .await;
        self.poison(result)
    }

    async fn unwatch(&mut self) -> Result<(), StoreError> {
        let result = ::redis::cmd("UNWATCH")
            .query_async::<_, ()>(self.connection()?)
            .await;
        self.poison(result)?;
        self.watching = false;
        Ok(())
    }

    async fn exists(&mut self, key: &str) -> Result<bool, StoreError> {
        let result = self.connection()?.exists::<_, bool>(key).await;
        self.poison(result)
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self.connection()?.get::<_, Option<String>>(key).await;
        self.poison(result)
    }

    async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let result = self.connection()?.set::<_, _, ()>(key, value).await;
        self.poison(result)
    }

    async fn commit(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let result = ::redis::pipe()
            .atomic()
            .set(key, value)
            .query_async::<_, Option<Vec<Value>>>(self.connection()?)
            .await;
        let reply = self.poison(result)?;

        // EXEC always clears the connection's watches
        self.watching = false;

        match reply {
            Some(_) => Ok(()),
            None => Err(StoreError::WatchConflict {
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::defaults(RedisConfig::default(), "redis://localhost:6379/0")]
    #[case::custom(
        RedisConfig { host: "cache.internal".to_string(), port: 6380, db: 2, max_idle: 4 },
        "redis://cache.internal:6380/2"
    )]
    fn test_url(#[case] config: RedisConfig, #[case] expected: &str) {
        assert_eq!(config.url(), expected);
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_server_fails() {
        let config = RedisConfig {
            host: "127.0.0.1".to_string(),
            // Reserved port, nothing listens there
            port: 1,
            ..RedisConfig::default()
        };

        let result = RedisStore::connect(&config).await;
        assert!(matches!(result, Err(StoreError::Connection { .. })));
    }

    // The tests below need a live server:
    // BANK_TEST_REDIS_HOST=localhost cargo test -- --ignored
    fn live_config() -> Option<RedisConfig> {
        let host = std::env::var("BANK_TEST_REDIS_HOST").ok()?;
        Some(RedisConfig {
            host,
            ..RedisConfig::default()
        })
    }

    fn idle_connections(store: &RedisStore) -> usize {
        store.pool.idle.lock().unwrap().len()
    }

    #[tokio::test]
    #[ignore = "needs a Redis server named by BANK_TEST_REDIS_HOST"]
    async fn test_foreign_write_after_watch_is_conflict() {
        let Some(config) = live_config() else { return };
        let store = RedisStore::connect(&config).await.unwrap();
        let key = "bank-rpc-test:watch-conflict";

        let mut session = store.session().await.unwrap();
        session.set(key, "0".to_string()).await.unwrap();
        session.watch(key).await.unwrap();

        let mut other = store.session().await.unwrap();
        other.set(key, "1".to_string()).await.unwrap();

        let result = session.commit(key, "2".to_string()).await;

        assert_eq!(
            result,
            Err(StoreError::WatchConflict {
                key: key.to_string()
            })
        );
        assert_eq!(other.get(key).await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    #[ignore = "needs a Redis server named by BANK_TEST_REDIS_HOST"]
    async fn test_unconflicted_commit_writes_value() {
        let Some(config) = live_config() else { return };
        let store = RedisStore::connect(&config).await.unwrap();
        let key = "bank-rpc-test:commit";

        let mut session = store.session().await.unwrap();
        session.watch(key).await.unwrap();
        session.commit(key, "7".to_string()).await.unwrap();

        assert_eq!(session.get(key).await.unwrap(), Some("7".to_string()));
    }

    #[tokio::test]
    #[ignore = "needs a Redis server named by BANK_TEST_REDIS_HOST"]
    async fn test_watching_connection_is_not_pooled() {
        let Some(config) = live_config() else { return };
        let store = RedisStore::connect(&config).await.unwrap();
        let key = "bank-rpc-test:pool";

        // The connection used for the startup PING
        assert_eq!(idle_connections(&store), 1);

        let mut watching = store.session().await.unwrap();
        watching.watch(key).await.unwrap();
        drop(watching);
        assert_eq!(idle_connections(&store), 0);

        let mut released = store.session().await.unwrap();
        released.watch(key).await.unwrap();
        released.unwatch().await.unwrap();
        drop(released);
        assert_eq!(idle_connections(&store), 1);
    }
}
