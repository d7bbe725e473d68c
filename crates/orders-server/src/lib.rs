//! Orders Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Read-only HTTP API over the ingested order documents.
//!
//! # Overview
//!
//! - **Analytics**: four grouping queries over the `orders` table
//! - **Health**: liveness endpoint
//! - **Middleware**: CORS and request tracing
//! - **Configuration**: environment-based, loaded once at startup
//!
//! # Routes
//!
//! | Route | Body |
//! |---|---|
//! | `GET /api/analytics/top-products` | `{data:[{product_id, total_sales}], status}` |
//! | `GET /api/analytics/monthly-revenue` | `{data:[{year, month, revenue}], status}` |
//! | `GET /api/analytics/category-avg-sales` | `{data:[{category, subcategory, avg_sales}], status}` |
//! | `GET /api/analytics/yearly-growth` | `{data:[{year, total_sales, growth_percent}], status}` |
//! | `GET /api/health` | `{status:"healthy"}` |
//!
//! # Example
//!
//! ```no_run
//! use orders_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     api::serve(&config, pool).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;

// Re-export commonly used types
pub use error::AppError;
