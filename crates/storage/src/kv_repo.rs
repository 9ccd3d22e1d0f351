//! Identity and stats repositories encoded as JSON values in a key-value store.
//!
//! Key layout:
//! - `user:<email>`   -> `UserRecord`
//! - `session:active` -> signed-in email
//! - `stats:<email>`  -> `UserStats`

use std::sync::Arc;

use async_trait::async_trait;
use prep_core::model::{Email, UserRecord, UserStats};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::repository::{IdentityRepository, KeyValueStore, StatsRepository, StorageError};

const ACTIVE_SESSION_KEY: &str = "session:active";

fn user_key(email: &Email) -> String {
    format!("user:{email}")
}

fn stats_key(email: &Email) -> String {
    format!("stats:{email}")
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
}

#[derive(Clone)]
pub struct KvRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl IdentityRepository for KvRepository {
    async fn lookup_user(&self, email: &Email) -> Result<Option<UserRecord>, StorageError> {
        self.read(&user_key(email)).await
    }

    async fn create_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        let payload = encode(record)?;
        if !self
            .store
            .put_if_absent(&user_key(&record.email), &payload)
            .await?
        {
            return Err(StorageError::Conflict);
        }
        debug!(email = %record.email, "user created");
        Ok(())
    }

    async fn set_active_session(&self, email: &Email) -> Result<(), StorageError> {
        self.store.put(ACTIVE_SESSION_KEY, email.as_str()).await
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        self.store.delete(ACTIVE_SESSION_KEY).await
    }

    async fn active_session(&self) -> Result<Option<Email>, StorageError> {
        self.store
            .get(ACTIVE_SESSION_KEY)
            .await?
            .map(|raw| Email::parse(&raw).map_err(ser))
            .transpose()
    }
}

#[async_trait]
impl StatsRepository for KvRepository {
    async fn load(&self, email: &Email) -> Result<Option<UserStats>, StorageError> {
        self.read(&stats_key(email)).await
    }

    async fn save(&self, email: &Email, stats: &UserStats) -> Result<(), StorageError> {
        let payload = encode(stats)?;
        self.store.put(&stats_key(email), &payload).await
    }
}
