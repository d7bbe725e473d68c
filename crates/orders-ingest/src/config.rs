//! Ingestion configuration loaded from environment variables

use orders_common::{env, OrdersError, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::writer::RetryPolicy;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/orders";
const DEFAULT_CSV_FILE: &str = "data/orders.csv";
const DEFAULT_CHECKPOINT_FILE: &str = "data/checkpoint.json";
const DEFAULT_BATCH_SIZE: usize = 1000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_CONNECTIONS: u32 = 2;

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub source: SourceConfig,
    pub batch: BatchConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub csv_file: PathBuf,
    pub checkpoint_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch_size: usize,
    /// Resends per batch after the first attempt
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub connect_timeout_secs: u64,
    pub max_connections: u32,
}

impl IngestConfig {
    /// Load configuration from the environment, reading `.env` first if present
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            source: SourceConfig {
                csv_file: env::string_or("INGEST_CSV_FILE", DEFAULT_CSV_FILE).into(),
                checkpoint_file: env::string_or("INGEST_CHECKPOINT_FILE", DEFAULT_CHECKPOINT_FILE)
                    .into(),
            },
            batch: BatchConfig {
                batch_size: env::parse_or("INGEST_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
                max_retries: env::parse_or("INGEST_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
                retry_delay_ms: env::parse_or("INGEST_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)?,
            },
            database: DatabaseConfig {
                url: env::string_or("DATABASE_URL", DEFAULT_DATABASE_URL),
                connect_timeout_secs: env::parse_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_CONNECT_TIMEOUT_SECS,
                )?,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.batch_size == 0 {
            return Err(OrdersError::config("batch size must be at least 1"));
        }
        if self.database.url.trim().is_empty() {
            return Err(OrdersError::config("DATABASE_URL cannot be empty"));
        }
        if self.source.csv_file.as_os_str().is_empty() {
            return Err(OrdersError::config("CSV file path cannot be empty"));
        }
        if self.source.checkpoint_file.as_os_str().is_empty() {
            return Err(OrdersError::config("checkpoint file path cannot be empty"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.batch.max_retries,
            Duration::from_millis(self.batch.retry_delay_ms),
        )
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                csv_file: DEFAULT_CSV_FILE.into(),
                checkpoint_file: DEFAULT_CHECKPOINT_FILE.into(),
            },
            batch: BatchConfig {
                batch_size: DEFAULT_BATCH_SIZE,
                max_retries: DEFAULT_MAX_RETRIES,
                retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.batch.batch_size, 1000);
        assert_eq!(config.batch.max_retries, 3);
        assert_eq!(config.batch.retry_delay_ms, 1000);
        assert_eq!(config.source.csv_file, PathBuf::from("data/orders.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut config = IngestConfig::default();
        config.batch.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_database_url_is_rejected() {
        let mut config = IngestConfig::default();
        config.database.url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let mut config = IngestConfig::default();
        config.batch.retry_delay_ms = 250;
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
    }
}
