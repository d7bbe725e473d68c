//! Batched writes with bounded retry
//!
//! A batch is sent as one unordered bulk insert. If any document fails, the
//! whole batch is sent again after `base_delay * attempt` until the retry
//! budget runs out, at which point the best attempt is reported instead of
//! failing the run. Resending the full batch can duplicate documents that
//! landed on an earlier attempt; the store decides whether it accepts them.

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticEvent, SharedDiagnostics};
use crate::models::TransformedRecord;
use crate::store::OrderStore;

/// Retry budget and linear backoff for batch writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_retries` counts resends after the first attempt
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait before the attempt following `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether another attempt is allowed after `attempt` failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }
}

/// Terminal outcome of writing one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub skipped: usize,
    pub attempts: u32,
}

pub struct BatchWriter<'a, S: OrderStore + ?Sized> {
    store: &'a S,
    policy: RetryPolicy,
    diagnostics: SharedDiagnostics,
}

impl<'a, S: OrderStore + ?Sized> BatchWriter<'a, S> {
    pub fn new(store: &'a S, policy: RetryPolicy, diagnostics: SharedDiagnostics) -> Self {
        Self {
            store,
            policy,
            diagnostics,
        }
    }

    pub async fn write(&self, batch: &[TransformedRecord]) -> BatchOutcome {
        if batch.is_empty() {
            return BatchOutcome::default();
        }

        let documents: Vec<Value> = batch.iter().map(TransformedRecord::to_document).collect();
        let total = documents.len();
        let mut best = 0usize;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let (inserted, error) = match self.store.insert_unordered(&documents).await {
                Ok(report) if report.is_complete() => {
                    debug!(inserted = report.inserted, attempt = attempt, "Batch written");
                    return BatchOutcome {
                        inserted: report.inserted,
                        skipped: total.saturating_sub(report.inserted),
                        attempts: attempt,
                    };
                }
                Ok(report) => (report.inserted, report.first_error().map(str::to_string)),
                Err(e) => (0, Some(e.to_string())),
            };
            best = best.max(inserted);

            if !self.policy.should_retry(attempt) {
                let outcome = BatchOutcome {
                    inserted: best,
                    skipped: total.saturating_sub(best),
                    attempts: attempt,
                };
                self.diagnostics.emit(DiagnosticEvent::BatchExhausted {
                    inserted: outcome.inserted,
                    skipped: outcome.skipped,
                    attempts: attempt,
                });
                return outcome;
            }

            let delay = self.policy.delay_for(attempt);
            self.diagnostics.emit(DiagnosticEvent::BatchRetry {
                attempt,
                max_retries: self.policy.max_retries(),
                delay,
                failed: total.saturating_sub(inserted),
                error,
            });
            tokio::time::sleep(delay).await;
        }
    }
}

/// Create the lookup indexes, logging and skipping any that fail
///
/// Returns how many were ensured.
pub async fn ensure_indexes<S, F>(store: &S, fields: F, diagnostics: &SharedDiagnostics) -> usize
where
    S: OrderStore + ?Sized,
    F: IntoIterator,
    F::Item: AsRef<str>,
{
    let mut ensured = 0;
    for field in fields {
        let field = field.as_ref();
        match store.create_index(field).await {
            Ok(()) => ensured += 1,
            Err(e) => diagnostics.emit(DiagnosticEvent::IndexFailed {
                field: field.to_string(),
                error: e.to_string(),
            }),
        }
    }
    info!(ensured = ensured, "Indexes ensured");
    ensured
}
