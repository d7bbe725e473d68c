pub mod response;

use crate::config::Config;
use crate::features::{self, analytics::PgAnalyticsRepository, FeatureState};
use crate::middleware;
use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;

/// Build application state backed by PostgreSQL
pub fn pg_state(pool: PgPool) -> FeatureState {
    FeatureState {
        analytics: Arc::new(PgAnalyticsRepository::new(pool)),
    }
}

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .nest("/api", features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Serve until the process is stopped
pub async fn serve(config: &Config, pool: PgPool) -> anyhow::Result<()> {
    serve_with_shutdown(config, pool, std::future::pending()).await
}

/// Serve until `shutdown` completes, then drain in-flight requests
///
/// Draining is bounded by the configured shutdown timeout.
pub async fn serve_with_shutdown<F>(config: &Config, pool: PgPool, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(pg_state(pool), config);

    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let signal = async move {
        shutdown.await;
        let _ = stopping_tx.send(true);
    };
    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    let deadline = async move {
        if stopping_rx.wait_for(|stopping| *stopping).await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(signal).into_future() => result?,
        _ = deadline => {
            tracing::warn!("Connections still open after {} seconds, forcing shutdown", grace.as_secs());
        }
    }

    Ok(())
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
