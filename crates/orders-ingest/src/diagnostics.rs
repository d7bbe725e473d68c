//! Diagnostics sink for non-fatal pipeline events
//!
//! Components never log recoverable problems directly. They emit a
//! [`DiagnosticEvent`] into an injected [`Diagnostics`] implementation so that
//! production runs log through `tracing` while tests can capture and assert on
//! the exact events.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// Row dropped by validation
    RecordRejected { order_id: String, reason: String },
    /// Field value could not be converted and was stored as null
    ConversionFailed {
        order_id: String,
        field: String,
        raw_value: String,
        error: String,
    },
    /// Lookup index could not be created
    IndexFailed { field: String, error: String },
    /// Batch attempt failed and will be retried
    BatchRetry {
        attempt: u32,
        max_retries: u32,
        delay: Duration,
        failed: usize,
        error: Option<String>,
    },
    /// Batch retries exhausted; remaining rows are skipped
    BatchExhausted {
        inserted: usize,
        skipped: usize,
        attempts: u32,
    },
    /// Checkpoint file could not be written
    CheckpointWriteFailed { offset: u64, error: String },
    /// Checkpoint file exists but could not be read; starting from zero
    CheckpointUnreadable { error: String },
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::RecordRejected { order_id, reason } => {
                write!(f, "Order {}: {}", order_id, reason)
            }
            DiagnosticEvent::ConversionFailed {
                order_id,
                field,
                raw_value,
                error,
            } => write!(
                f,
                "Order {}: failed to convert {} '{}': {}",
                order_id, field, raw_value, error
            ),
            DiagnosticEvent::IndexFailed { field, error } => {
                write!(f, "Failed to create index on {}: {}", field, error)
            }
            DiagnosticEvent::BatchRetry {
                attempt,
                max_retries,
                delay,
                failed,
                error,
            } => {
                write!(
                    f,
                    "Batch attempt {} failed for {} documents, retry {}/{} in {:?}",
                    attempt, failed, attempt, max_retries, delay
                )?;
                if let Some(error) = error {
                    write!(f, ": {}", error)?;
                }
                Ok(())
            }
            DiagnosticEvent::BatchExhausted {
                inserted,
                skipped,
                attempts,
            } => write!(
                f,
                "Batch gave up after {} attempts: {} inserted, {} skipped",
                attempts, inserted, skipped
            ),
            DiagnosticEvent::CheckpointWriteFailed { offset, error } => {
                write!(f, "Failed to save checkpoint at {}: {}", offset, error)
            }
            DiagnosticEvent::CheckpointUnreadable { error } => {
                write!(f, "Checkpoint unreadable, starting from the beginning: {}", error)
            }
        }
    }
}

pub trait Diagnostics: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

pub type SharedDiagnostics = Arc<dyn Diagnostics>;

/// Forwards every event to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        match &event {
            DiagnosticEvent::RecordRejected { order_id, reason } => {
                warn!(order_id = %order_id, reason = %reason, "Record rejected");
            }
            DiagnosticEvent::ConversionFailed {
                order_id,
                field,
                raw_value,
                error,
            } => {
                warn!(
                    order_id = %order_id,
                    field = %field,
                    raw_value = %raw_value,
                    error = %error,
                    "Field conversion failed, storing null"
                );
            }
            DiagnosticEvent::IndexFailed { field, error } => {
                warn!(field = %field, error = %error, "Index creation failed");
            }
            DiagnosticEvent::BatchRetry {
                attempt,
                max_retries,
                delay,
                failed,
                error,
            } => {
                warn!(
                    attempt = attempt,
                    max_retries = max_retries,
                    delay_ms = delay.as_millis() as u64,
                    failed = failed,
                    error = error.as_deref().unwrap_or("partial failure"),
                    "Batch write failed, retrying"
                );
            }
            DiagnosticEvent::BatchExhausted {
                inserted,
                skipped,
                attempts,
            } => {
                error!(
                    inserted = inserted,
                    skipped = skipped,
                    attempts = attempts,
                    "Batch retries exhausted"
                );
            }
            DiagnosticEvent::CheckpointWriteFailed { offset, error } => {
                error!(offset = offset, error = %error, "Failed to save checkpoint");
            }
            DiagnosticEvent::CheckpointUnreadable { error } => {
                warn!(error = %error, "Checkpoint unreadable, starting from the beginning");
            }
        }
    }
}

/// Records events in memory
#[derive(Debug, Default)]
pub struct CapturedDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CapturedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count_where(&self, predicate: impl Fn(&DiagnosticEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Diagnostics for CapturedDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
