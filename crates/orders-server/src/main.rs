//! Orders Server - Main entry point

use anyhow::Result;
use orders_common::logging::{init_logging, LogConfig, LogLevel};
use tokio::signal;
use tracing::info;

use orders_server::{api, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let level = if config.server.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(level)
        .log_file_prefix("orders-server")
        .filter_directives(format!("orders_server={},tower_http={},sqlx=warn", level, level))
        .build()
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    info!("Starting Orders Server");
    info!(
        "Configuration loaded - server will bind to {}",
        config.bind_address()
    );

    let pool = db::create_pool(&config.database).await?;
    db::health_check(&pool).await?;
    info!("Database connection pool established");

    db::run_migrations(&pool).await?;

    api::serve_with_shutdown(
        &config,
        pool.clone(),
        shutdown_signal(config.server.shutdown_timeout_secs),
    )
    .await?;

    pool.close().await;
    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
}
