//! Orders Ingest - CSV to order store loader

use anyhow::{Context, Result};
use clap::Parser;
use orders_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use orders_ingest::{
    checkpoint::CheckpointStore,
    config::IngestConfig,
    diagnostics::{SharedDiagnostics, TracingDiagnostics},
    store::{MemoryOrderStore, PgOrderStore},
    IngestError, Pipeline, RunStatistics,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "orders-ingest")]
#[command(author, version, about = "Load order rows from a CSV export into the order store")]
struct Cli {
    /// CSV file to ingest
    #[arg(short, long, env = "INGEST_CSV_FILE")]
    file: Option<PathBuf>,

    /// Checkpoint file used to resume
    #[arg(short, long, env = "INGEST_CHECKPOINT_FILE")]
    checkpoint: Option<PathBuf>,

    /// Records per bulk insert
    #[arg(short, long, env = "INGEST_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Retries per batch after the first attempt
    #[arg(long, env = "INGEST_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Base retry delay in milliseconds
    #[arg(long, env = "INGEST_RETRY_DELAY_MS")]
    retry_delay_ms: Option<u64>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Delete the checkpoint and start from the first line
    #[arg(long)]
    reset_checkpoint: bool,

    /// Run against an in-memory store without touching the database or checkpoint
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut IngestConfig) {
        if let Some(file) = &self.file {
            config.source.csv_file = file.clone();
        }
        if let Some(checkpoint) = &self.checkpoint {
            config.source.checkpoint_file = checkpoint.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.batch.batch_size = batch_size;
        }
        if let Some(max_retries) = self.max_retries {
            config.batch.max_retries = max_retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.batch.retry_delay_ms = delay;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(stats) => {
            println!("{}", stats);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<IngestError>()
                .map(IngestError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<RunStatistics> {
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Both)
        .log_file_prefix("orders-ingest")
        .filter_directives(format!("orders_ingest={},sqlx=warn", level))
        .build()
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    let mut config = IngestConfig::load().context("Failed to load ingest configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    info!(
        file = %config.source.csv_file.display(),
        checkpoint = %config.source.checkpoint_file.display(),
        batch_size = config.batch.batch_size,
        max_retries = config.batch.max_retries,
        retry_delay_ms = config.batch.retry_delay_ms,
        dry_run = cli.dry_run,
        "Starting ingestion"
    );

    let diagnostics: SharedDiagnostics = Arc::new(TracingDiagnostics);

    if cli.reset_checkpoint {
        CheckpointStore::new(&config.source.checkpoint_file, diagnostics.clone())
            .reset()
            .context("Failed to reset checkpoint")?;
    }

    let stats = if cli.dry_run {
        let store = MemoryOrderStore::new();
        let pipeline = Pipeline::new(config, diagnostics).without_checkpoint_writes();
        pipeline.run_until(&store, shutdown_signal()).await?
    } else {
        let store = PgOrderStore::connect_lazy(&config.database)
            .map_err(IngestError::ConnectionFailure)?;
        let pipeline = Pipeline::new(config, diagnostics);
        pipeline.run_until(&store, shutdown_signal()).await?
    };

    Ok(stats)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
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
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received terminate signal"),
    }
}
