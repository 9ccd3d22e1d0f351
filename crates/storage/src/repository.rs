use async_trait::async_trait;
use prep_core::model::{Email, Question, UserRecord, UserStats};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::kv_repo::KvRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key-value medium that identity and stats records are persisted in.
///
/// Values are opaque to the store; callers serialize them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Insert `key` only if it does not exist yet. Returns whether it was inserted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or written.
    async fn put_if_absent(&self, key: &str, value: &str) -> Result<bool, StorageError> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.put(key, value).await?;
        Ok(true)
    }
}

/// Account records plus the pointer to the signed-in user.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn lookup_user(&self, email: &Email) -> Result<Option<UserRecord>, StorageError>;

    /// Store a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn create_user(&self, record: &UserRecord) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the pointer cannot be written.
    async fn set_active_session(&self, email: &Email) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the pointer cannot be removed.
    async fn clear_session(&self) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn active_session(&self) -> Result<Option<Email>, StorageError>;
}

/// Per-user cumulative counters and history, overwritten wholesale on save.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn load(&self, email: &Email) -> Result<Option<UserStats>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the stats cannot be encoded or written.
    async fn save(&self, email: &Email, stats: &UserStats) -> Result<(), StorageError>;
}

/// Read-only question catalog.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read or contains invalid questions.
    async fn fetch_all(&self) -> Result<Vec<Question>, StorageError>;
}

/// Simple in-memory key-value store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn key_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, value: &str) -> Result<bool, StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(key) {
            return Ok(false);
        }
        guard.insert(key.to_owned(), value.to_owned());
        Ok(true)
    }
}

/// Aggregates identity and stats repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub identity: Arc<dyn IdentityRepository>,
    pub stats: Arc<dyn StatsRepository>,
}

impl Storage {
    /// Build a `Storage` over any key-value backend.
    #[must_use]
    pub fn over_kv(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = KvRepository::new(store);
        let identity: Arc<dyn IdentityRepository> = Arc::new(repo.clone());
        let stats: Arc<dyn StatsRepository> = Arc::new(repo);
        Self { identity, stats }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::over_kv(Arc::new(InMemoryKv::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_kv_round_trips_and_deletes() {
        let kv = InMemoryKv::new();
        kv.put("a", "1").await.unwrap();
        kv.put("a", "2").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("2"));

        kv.delete("a").await.unwrap();
        kv.delete("a").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), None);
        assert_eq!(kv.key_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn put_if_absent_keeps_first_value() {
        let kv = InMemoryKv::new();
        assert!(kv.put_if_absent("k", "first").await.unwrap());
        assert!(!kv.put_if_absent("k", "second").await.unwrap());
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("first"));
    }
}
