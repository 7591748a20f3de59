//! Store collaborator interface
//!
//! The engine is written against these traits, never against a concrete
//! client. A store hands out sessions; each session is an exclusive channel
//! to the store (one connection for Redis), so one operation's
//! watch/read/commit sequence can never interleave with another operation's
//! watch on the same channel.
//!
//! # Conflict detection
//!
//! ```text
//! watch(key) ──► get(key) ──► commit(key, value)
//!                                  │
//!                                  ├── Ok(())                       no foreign write since watch
//!                                  └── Err(StoreError::WatchConflict) key was written, start over
//! ```
//!
//! - `memory` - In-process versioned store with deterministic conflict injection
//! - `redis` - Redis-backed store using WATCH / MULTI / EXEC

use crate::types::StoreError;
use async_trait::async_trait;

pub mod memory;
pub mod redis;

pub use self::redis::RedisStore;
pub use memory::MemoryStore;

/// A shared key-value store that hands out exclusive sessions
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Session type produced by this store
    type Session: StoreSession;

    /// Open a session for one logical operation
    async fn session(&self) -> Result<Self::Session, StoreError>;
}

/// An exclusive channel to the store
///
/// Dropping a session releases any outstanding watch.
#[async_trait]
pub trait StoreSession: Send {
    /// Establish a conflict fence on `key`
    async fn watch(&mut self, key: &str) -> Result<(), StoreError>;

    /// Release every watch held by this session
    async fn unwatch(&mut self) -> Result<(), StoreError>;

    /// Whether `key` currently holds a value
    async fn exists(&mut self, key: &str) -> Result<bool, StoreError>;

    /// Read the current value of `key`
    async fn get(&mut self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally write `value` under `key`
    async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Write `value` under `key` only if no other writer touched `key` since
    /// it was watched
    ///
    /// Consumes the watch either way.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WatchConflict` if the watched key was modified.
    async fn commit(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}
