use async_trait::async_trait;
use quiz_core::model::{PersistedSnapshot, StudentCredential};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key holding the in-progress test snapshot.
pub const SNAPSHOT_KEY: &str = "ccc_test_data_v2";

/// Key holding the signed-in student's credential.
pub const CREDENTIAL_KEY: &str = "ccc_user";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable string key-value store, the local equivalent of browser storage.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed access to the persisted test snapshot.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Load the snapshot under `key`.
    ///
    /// `default_time_left` fills in a missing or unreadable countdown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` when the stored text is not a
    /// snapshot object, or a backend error.
    async fn load_snapshot(
        &self,
        key: &str,
        default_time_left: u32,
    ) -> Result<Option<PersistedSnapshot>, StorageError>;

    /// Write `snapshot` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    async fn save_snapshot(&self, key: &str, snapshot: &PersistedSnapshot)
    -> Result<(), StorageError>;
}

/// Typed access to the stored student credential.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for unreadable credentials, or a
    /// backend error.
    async fn load_credential(&self, key: &str) -> Result<Option<StudentCredential>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    async fn save_credential(
        &self,
        key: &str,
        credential: &StudentCredential,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend write fails.
    async fn clear_credential(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<T> SnapshotRepository for T
where
    T: LocalStore + ?Sized,
{
    async fn load_snapshot(
        &self,
        key: &str,
        default_time_left: u32,
    ) -> Result<Option<PersistedSnapshot>, StorageError> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };
        PersistedSnapshot::decode(&raw, default_time_left)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn save_snapshot(
        &self,
        key: &str,
        snapshot: &PersistedSnapshot,
    ) -> Result<(), StorageError> {
        let raw = snapshot
            .encode()
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.set_raw(key, &raw).await
    }
}

#[async_trait]
impl<T> CredentialRepository for T
where
    T: LocalStore + ?Sized,
{
    async fn load_credential(&self, key: &str) -> Result<Option<StudentCredential>, StorageError> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn save_credential(
        &self,
        key: &str,
        credential: &StudentCredential,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(credential)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.set_raw(key, &raw).await
    }

    async fn clear_credential(&self, key: &str) -> Result<(), StorageError> {
        self.remove(key).await
    }
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for InMemoryRepository {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .values
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the typed repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryRepository::new())
    }

    /// Wrap a single `LocalStore` for both snapshot and credential access.
    #[must_use]
    pub fn from_store<S>(store: S) -> Self
    where
        S: LocalStore + Clone + 'static,
    {
        let snapshots: Arc<dyn SnapshotRepository> = Arc::new(store.clone());
        let credentials: Arc<dyn CredentialRepository> = Arc::new(store);
        Self {
            snapshots,
            credentials,
        }
    }
}
