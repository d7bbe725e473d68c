//! Orders Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the orders workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used by the ingest pipeline and
//! the analytics server:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Environment**: Typed lookups of configuration variables
//! - **Logging**: Centralized `tracing` subscriber setup
//! - **Types**: Order field names and the persisted document layout
//!
//! # Example
//!
//! ```no_run
//! use orders_common::{env, Result};
//!
//! fn batch_size() -> Result<usize> {
//!     env::parse_or("INGEST_BATCH_SIZE", 1000)
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{OrdersError, Result};
