//! Pipeline driver
//!
//! Runs one ingestion pass:
//!
//! ```text
//! Idle → ReadingCheckpoint → Connecting → Indexing → Streaming
//!      → (Validating → Transforming → Accumulating)* → Flushing → CheckpointWriting
//!      → Streaming … → Summarizing → Done
//! ```
//!
//! Any fatal error or an interrupt moves the run to `Aborted`. Batches flushed
//! before that point keep their checkpoints, the in-progress batch is dropped,
//! and the store is closed on every exit path.

use orders_common::types::INDEXED_FIELDS;
use std::fmt;
use std::future::Future;
use tracing::{error, info, trace, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::IngestConfig;
use crate::diagnostics::SharedDiagnostics;
use crate::error::{IngestError, IngestResult};
use crate::models::TransformedRecord;
use crate::reader::RecordReader;
use crate::store::OrderStore;
use crate::transformer::Transformer;
use crate::validator::{Validation, Validator};
use crate::writer::{ensure_indexes, BatchWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ReadingCheckpoint,
    Connecting,
    Indexing,
    Streaming,
    Validating,
    Transforming,
    Accumulating,
    Flushing,
    CheckpointWriting,
    Summarizing,
    Done,
    Aborted,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }

    fn is_per_record(self) -> bool {
        matches!(
            self,
            PipelineState::Streaming
                | PipelineState::Validating
                | PipelineState::Transforming
                | PipelineState::Accumulating
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::ReadingCheckpoint => "reading_checkpoint",
            PipelineState::Connecting => "connecting",
            PipelineState::Indexing => "indexing",
            PipelineState::Streaming => "streaming",
            PipelineState::Validating => "validating",
            PipelineState::Transforming => "transforming",
            PipelineState::Accumulating => "accumulating",
            PipelineState::Flushing => "flushing",
            PipelineState::CheckpointWriting => "checkpoint_writing",
            PipelineState::Summarizing => "summarizing",
            PipelineState::Done => "done",
            PipelineState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Counters for one process invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Data lines read in this run
    pub total: u64,
    pub valid: u64,
    pub invalid: u64,
    pub inserted: u64,
    /// Valid records the store did not accept
    pub skipped: u64,
    pub batches: u64,
    /// Resume offset the run started from
    pub start_offset: u64,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(40);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Ingestion Summary")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Resumed from line:  {}", self.start_offset)?;
        writeln!(f, "Total records:      {}", self.total)?;
        writeln!(f, "Valid records:      {}", self.valid)?;
        writeln!(f, "Invalid records:    {}", self.invalid)?;
        writeln!(f, "Inserted:           {}", self.inserted)?;
        writeln!(f, "Skipped:            {}", self.skipped)?;
        writeln!(f, "Batches:            {}", self.batches)?;
        write!(f, "{}", rule)
    }
}

/// Logs every state change; per-record states only at trace level
#[derive(Debug)]
struct StateTracker {
    state: PipelineState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }

    fn enter(&mut self, next: PipelineState) {
        if self.state == next {
            return;
        }
        if next.is_per_record() && self.state.is_per_record() {
            trace!(from = %self.state, to = %next, "Pipeline state");
        } else {
            info!(from = %self.state, to = %next, "Pipeline state");
        }
        self.state = next;
    }
}

pub struct Pipeline {
    config: IngestConfig,
    diagnostics: SharedDiagnostics,
    persist_checkpoint: bool,
}

impl Pipeline {
    pub fn new(config: IngestConfig, diagnostics: SharedDiagnostics) -> Self {
        Self {
            config,
            diagnostics,
            persist_checkpoint: true,
        }
    }

    /// Read the checkpoint but never write it
    pub fn without_checkpoint_writes(mut self) -> Self {
        self.persist_checkpoint = false;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub async fn run<S>(&self, store: &S) -> IngestResult<RunStatistics>
    where
        S: OrderStore + ?Sized,
    {
        self.run_until(store, std::future::pending::<()>()).await
    }

    /// Run until the input is exhausted or `shutdown` completes
    ///
    /// Completion of `shutdown` aborts the run with [`IngestError::Interrupted`].
    pub async fn run_until<S, F>(&self, store: &S, shutdown: F) -> IngestResult<RunStatistics>
    where
        S: OrderStore + ?Sized,
        F: Future<Output = ()>,
    {
        let mut tracker = StateTracker::new();

        let result = tokio::select! {
            biased;
            _ = shutdown => {
                warn!("Interrupt received, abandoning in-progress batch");
                Err(IngestError::Interrupted)
            }
            result = self.execute(store, &mut tracker) => result,
        };

        store.close().await;

        match result {
            Ok(stats) => {
                tracker.enter(PipelineState::Done);
                Ok(stats)
            }
            Err(e) => {
                tracker.enter(PipelineState::Aborted);
                error!(error = %e, "Ingestion aborted");
                Err(e)
            }
        }
    }

    async fn execute<S>(&self, store: &S, tracker: &mut StateTracker) -> IngestResult<RunStatistics>
    where
        S: OrderStore + ?Sized,
    {
        tracker.enter(PipelineState::ReadingCheckpoint);
        let checkpoint =
            CheckpointStore::new(&self.config.source.checkpoint_file, self.diagnostics.clone());
        let start = checkpoint.read();
        info!(
            checkpoint = %checkpoint.path().display(),
            offset = start,
            "Resuming from checkpoint"
        );

        tracker.enter(PipelineState::Connecting);
        store.ping().await.map_err(IngestError::ConnectionFailure)?;
        store
            .prepare_schema()
            .await
            .map_err(IngestError::SchemaFailed)?;

        tracker.enter(PipelineState::Indexing);
        ensure_indexes(store, INDEXED_FIELDS, &self.diagnostics).await;

        tracker.enter(PipelineState::Streaming);
        let records = RecordReader::new(&self.config.source.csv_file).open(start)?;
        let mut position = records.position();

        let validator = Validator::for_orders(self.diagnostics.clone());
        let transformer = Transformer::new(self.diagnostics.clone());
        let writer = BatchWriter::new(store, self.config.retry_policy(), self.diagnostics.clone());

        let batch_size = self.config.batch.batch_size;
        let mut batch: Vec<TransformedRecord> = Vec::with_capacity(batch_size);
        let mut committed = start;
        let mut stats = RunStatistics {
            start_offset: start,
            ..RunStatistics::default()
        };

        info!(
            file = %self.config.source.csv_file.display(),
            batch_size = batch_size,
            "Streaming records"
        );

        for record in records {
            let record = record?;
            position += 1;
            stats.total += 1;

            tracker.enter(PipelineState::Validating);
            match validator.validate(&record) {
                Validation::Valid(valid) => {
                    stats.valid += 1;
                    tracker.enter(PipelineState::Transforming);
                    let transformed = transformer.transform(&valid);
                    tracker.enter(PipelineState::Accumulating);
                    batch.push(transformed);
                }
                Validation::Rejected { .. } => stats.invalid += 1,
            }

            if batch.len() >= batch_size {
                self.flush(&writer, &checkpoint, &mut batch, position, &mut stats, tracker)
                    .await;
                committed = position;
                // Give a pending shutdown a chance to win between batches
                tokio::task::yield_now().await;
            }
            tracker.enter(PipelineState::Streaming);
        }

        if !batch.is_empty() {
            self.flush(&writer, &checkpoint, &mut batch, position, &mut stats, tracker)
                .await;
        } else if position > committed {
            // Trailing rejected rows still move the offset forward
            tracker.enter(PipelineState::CheckpointWriting);
            self.save_checkpoint(&checkpoint, position);
        }

        tracker.enter(PipelineState::Summarizing);
        info!(
            total = stats.total,
            valid = stats.valid,
            invalid = stats.invalid,
            inserted = stats.inserted,
            skipped = stats.skipped,
            batches = stats.batches,
            "Ingestion complete"
        );
        Ok(stats)
    }

    async fn flush<S>(
        &self,
        writer: &BatchWriter<'_, S>,
        checkpoint: &CheckpointStore,
        batch: &mut Vec<TransformedRecord>,
        position: u64,
        stats: &mut RunStatistics,
        tracker: &mut StateTracker,
    ) where
        S: OrderStore + ?Sized,
    {
        tracker.enter(PipelineState::Flushing);
        let outcome = writer.write(batch).await;
        batch.clear();

        stats.batches += 1;
        stats.inserted += outcome.inserted as u64;
        stats.skipped += outcome.skipped as u64;

        // Advances even when the batch exhausted its retries
        tracker.enter(PipelineState::CheckpointWriting);
        self.save_checkpoint(checkpoint, position);

        info!(
            batch = stats.batches,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            attempts = outcome.attempts,
            offset = position,
            "Batch flushed"
        );
    }

    fn save_checkpoint(&self, checkpoint: &CheckpointStore, position: u64) {
        if self.persist_checkpoint {
            checkpoint.write(position);
        }
    }
}
