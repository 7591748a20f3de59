//! In-process store with versioned keys
//!
//! `MemoryStore` keeps every key in a `DashMap` together with a version
//! counter that is bumped on every write. A watch remembers the version seen
//! at watch time; a commit succeeds only if the version is unchanged. The
//! check and the write happen under the entry lock, so two racing commits on
//! the same key can never both succeed.
//!
//! The store can also be told to interleave foreign writes into upcoming
//! commits, which lets tests reproduce a lost-update race deterministically.

use super::{AccountStore, StoreSession};
use crate::types::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A key's value plus the number of writes it has seen
///
/// Absent keys keep their version so that delete-then-recreate would still
/// be detected as a conflict.
#[derive(Debug, Clone, Default)]
struct Slot {
    value: Option<String>,
    version: u64,
}

#[derive(Debug, Default)]
struct Inner {
    slots: DashMap<String, Slot>,
    /// Writes to apply, one per commit, right before the commit checks its watch
    interleaved: DashMap<String, VecDeque<String>>,
    commit_attempts: DashMap<String, u64>,
    sessions_opened: AtomicU64,
}

/// Thread-safe in-memory store
///
/// Cloning is cheap and every clone shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue foreign writes against `key`
    ///
    /// Each queued value is written to `key` by an outside party just before
    /// the next commit on `key` checks its watch, so that commit fails with
    /// `StoreError::WatchConflict`.
    pub fn interleave_writes<I>(&self, key: &str, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.inner
            .interleaved
            .entry(key.to_string())
            .or_default()
            .extend(values);
    }

    /// Read a value outside of any session
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner
            .slots
            .get(key)
            .and_then(|slot| slot.value.clone())
    }

    /// Number of conditional commits attempted on `key`
    pub fn commit_attempts(&self, key: &str) -> u64 {
        self.inner
            .commit_attempts
            .get(key)
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Number of sessions handed out so far
    pub fn sessions_opened(&self) -> u64 {
        self.inner.sessions_opened.load(Ordering::Relaxed)
    }

    fn version(&self, key: &str) -> u64 {
        self.inner
            .slots
            .get(key)
            .map(|slot| slot.version)
            .unwrap_or(0)
    }

    fn write(&self, key: &str, value: String) {
        let mut slot = self.inner.slots.entry(key.to_string()).or_default();
        slot.value = Some(value);
        slot.version += 1;
    }

    fn next_interleaved(&self, key: &str) -> Option<String> {
        self.inner
            .interleaved
            .get_mut(key)
            .and_then(|mut queue| queue.pop_front())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    type Session = MemorySession;

    async fn session(&self) -> Result<Self::Session, StoreError> {
        self.inner.sessions_opened.fetch_add(1, Ordering::Relaxed);
        Ok(MemorySession {
            store: self.clone(),
            watched: HashMap::new(),
        })
    }
}

/// Session over a `MemoryStore`
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
    /// Versions observed at watch time
    watched: HashMap<String, u64>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn watch(&mut self, key: &str) -> Result<(), StoreError> {
        let version = self.store.version(key);
        self.watched.insert(key.to_string(), version);
        Ok(())
    }

    async fn unwatch(&mut self) -> Result<(), StoreError> {
        self.watched.clear();
        Ok(())
    }

    async fn exists(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.store.peek(key).is_some())
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.store.peek(key))
    }

    async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.store.write(key, value);
        Ok(())
    }

    async fn commit(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        *self
            .store
            .inner
            .commit_attempts
            .entry(key.to_string())
            .or_insert(0) += 1;

        if let Some(foreign) = self.store.next_interleaved(key) {
            self.store.write(key, foreign);
        }

        // An unwatched key has no fence to violate
        let expected = self.watched.remove(key);
        self.watched.clear();

        let mut slot = self.store.inner.slots.entry(key.to_string()).or_default();
        if let Some(expected) = expected {
            if slot.version != expected {
                return Err(StoreError::WatchConflict {
                    key: key.to_string(),
                });
            }
        }
        slot.value = Some(value);
        slot.version += 1;
        Ok(())
    }
}
