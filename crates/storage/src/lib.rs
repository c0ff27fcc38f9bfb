//! Storage Layer
//!
//! Persists per-channel feature records through the [`FeatureSink`] trait,
//! either in memory or in a SQLite `features` table.

mod record;
mod repository;
mod sqlite;

pub use record::FeatureRecord;
pub use repository::{Repository, DEFAULT_MAX_RECORDS};
pub use sqlite::SqliteFeatureStore;

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Lock error: {0}")]
    LockError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}

/// Destination for computed feature records
#[async_trait]
pub trait FeatureSink: Send + Sync {
    /// Store a batch; one result per record, in batch order
    async fn store(&self, batch: Vec<FeatureRecord>) -> Vec<Result<(), StorageError>>;
}
