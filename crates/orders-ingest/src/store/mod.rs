//! Order document store abstraction
//!
//! The pipeline talks to storage only through [`OrderStore`]. Production runs
//! use [`PgOrderStore`] (one JSONB document per row); tests and `--dry-run`
//! use [`MemoryOrderStore`], which can inject insert and index faults.

mod memory;
mod postgres;

pub use memory::{InsertFault, MemoryOrderStore};
pub use postgres::{index_name, PgOrderStore};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// A single document that the store refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// Position of the document in the submitted slice
    pub index: usize,
    pub message: String,
}

/// Result of one unordered bulk insert call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertReport {
    pub inserted: usize,
    pub failures: Vec<DocumentFailure>,
}

impl BulkInsertReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// First failure message, for diagnostics
    pub fn first_error(&self) -> Option<&str> {
        self.failures.first().map(|f| f.message.as_str())
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Round-trip to confirm the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Make sure the orders table exists
    async fn prepare_schema(&self) -> Result<(), StoreError>;

    /// Create a lookup index on one document field if it does not exist yet
    async fn create_index(&self, field: &str) -> Result<(), StoreError>;

    /// Insert every document it can, reporting the ones it could not
    ///
    /// `Err` means the call as a whole failed and nothing can be assumed
    /// about which documents landed.
    async fn insert_unordered(&self, documents: &[Value]) -> Result<BulkInsertReport, StoreError>;

    /// Release the underlying connection(s)
    async fn close(&self);
}
