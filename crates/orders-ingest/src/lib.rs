//! Orders Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Checkpointed, batched loader that moves order rows from a CSV export into
//! the order document store.
//!
//! # Pipeline
//!
//! ```text
//! checkpoint ─► reader ─► validator ─► transformer ─► batch ─► writer ─► store
//!     ▲                                                          │
//!     └──────────────────── offset after each flush ◄────────────┘
//! ```
//!
//! - **reader**: lazy CSV rows, resumable at a data-line offset
//! - **validator**: required fields present and non-empty, values trimmed
//! - **transformer**: date and numeric conversions, empty strings to null
//! - **writer**: unordered bulk insert with bounded linear backoff
//! - **checkpoint**: JSON file holding the resume offset
//! - **pipeline**: the driver tying the above together
//!
//! Per-row and per-field problems never stop a run; they are counted and
//! reported through the injected [`diagnostics::Diagnostics`] sink.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use orders_ingest::{
//!     config::IngestConfig, diagnostics::TracingDiagnostics, pipeline::Pipeline,
//!     store::PgOrderStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let store = PgOrderStore::connect_lazy(&config.database)?;
//!     let pipeline = Pipeline::new(config, Arc::new(TracingDiagnostics));
//!     let stats = pipeline.run(&store).await?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod store;
pub mod transformer;
pub mod validator;
pub mod writer;

// Re-export commonly used types
pub use error::{IngestError, IngestResult};
pub use models::{FieldValue, RawRecord, TransformedRecord, ValidatedRecord};
pub use pipeline::{Pipeline, RunStatistics};
