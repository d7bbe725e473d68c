//! Error types for the ingestion pipeline
//!
//! Only run-level failures live here. Per-row and per-field problems are
//! reported through [`crate::diagnostics`] and never abort a run.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection failed: {0}")]
    ConnectionFailure(#[source] StoreError),

    #[error("Schema preparation failed: {0}")]
    SchemaFailed(#[source] StoreError),

    #[error("Ingestion interrupted")]
    Interrupted,

    #[error("Configuration error: {0}")]
    Config(#[from] orders_common::OrdersError),
}

impl IngestError {
    /// Process exit code for this failure
    ///
    /// 130 mirrors the shell convention for SIGINT.
    pub fn exit_code(&self) -> u8 {
        match self {
            IngestError::Interrupted => 130,
            _ => 1,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, IngestError::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(IngestError::Interrupted.exit_code(), 130);
        assert_eq!(IngestError::SourceNotFound(PathBuf::from("x.csv")).exit_code(), 1);
        assert_eq!(
            IngestError::ConnectionFailure(StoreError::Unavailable("down".into())).exit_code(),
            1
        );
    }

    #[test]
    fn test_source_not_found_message() {
        let err = IngestError::SourceNotFound(PathBuf::from("data/orders.csv"));
        assert_eq!(err.to_string(), "CSV file not found: data/orders.csv");
    }
}
