#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CREDENTIAL_KEY, CredentialRepository, InMemoryRepository, LocalStore, SNAPSHOT_KEY,
    SnapshotRepository, Storage, StorageError,
};
