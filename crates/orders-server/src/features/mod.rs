//! Feature modules implementing the orders API
//!
//! Each feature is a vertical slice with its own queries and routes.
//!
//! # Features
//!
//! - **analytics**: grouping queries over ingested order documents
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `queries/` - Read operations, one file per query
//! - `repository.rs` - Trait the routes depend on, with a PostgreSQL implementation
//! - `routes.rs` - HTTP route definitions

pub mod analytics;

use axum::Router;
use std::sync::Arc;

use analytics::AnalyticsRepository;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub analytics: Arc<dyn AnalyticsRepository>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/analytics` - Order analytics
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest(
        "/analytics",
        analytics::analytics_routes().with_state(state.analytics),
    )
}
