//! Durable resume offset
//!
//! Stored as `{"last_processed_line": n}` where `n` is the number of data
//! lines already consumed. Writes go to a sibling temp file that is synced
//! and renamed over the real one, so a crash mid-write leaves the previous
//! checkpoint intact. The stored offset never decreases.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticEvent, SharedDiagnostics};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CheckpointFile {
    #[serde(default)]
    last_processed_line: u64,
}

pub struct CheckpointStore {
    path: PathBuf,
    diagnostics: SharedDiagnostics,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>, diagnostics: SharedDiagnostics) -> Self {
        Self {
            path: path.into(),
            diagnostics,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last persisted offset, or 0 when absent or unreadable
    pub fn read(&self) -> u64 {
        self.load().unwrap_or_else(|error| {
            self.diagnostics.emit(DiagnosticEvent::CheckpointUnreadable { error });
            0
        })
    }

    fn load(&self) -> Result<u64, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.to_string()),
        };

        serde_json::from_str::<CheckpointFile>(&contents)
            .map(|file| file.last_processed_line)
            .map_err(|e| e.to_string())
    }

    /// Persist `offset` unless a larger one is already stored
    ///
    /// Returns whether the file now holds `offset`. Failures are reported as
    /// diagnostics and never abort the run.
    pub fn write(&self, offset: u64) -> bool {
        // An unreadable file is overwritten; only read() reports it
        let current = self.load().unwrap_or(0);
        if offset < current {
            debug!(offset = offset, current = current, "Ignoring checkpoint regression");
            return false;
        }

        match self.persist(offset) {
            Ok(()) => {
                debug!(offset = offset, "Checkpoint saved");
                true
            }
            Err(e) => {
                self.diagnostics.emit(DiagnosticEvent::CheckpointWriteFailed {
                    offset,
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Remove the checkpoint so the next run starts from the first line
    pub fn reset(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Checkpoint reset");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn persist(&self, offset: u64) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string_pretty(&CheckpointFile {
            last_processed_line: offset,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::diagnostics::CapturedDiagnostics;
    use proptest::prelude::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> (CheckpointStore, Arc<CapturedDiagnostics>) {
        let sink = Arc::new(CapturedDiagnostics::new());
        let store = CheckpointStore::new(dir.path().join("state/checkpoint.json"), sink.clone());
        (store, sink)
    }

    #[test]
    fn test_missing_checkpoint_reads_zero() {
        let dir = TempDir::new().unwrap();
        let (checkpoint, sink) = store(&dir);
        assert_eq!(checkpoint.read(), 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_write_creates_directory_and_format() {
        let dir = TempDir::new().unwrap();
        let (checkpoint, _) = store(&dir);

        assert!(checkpoint.write(1500));
        assert_eq!(checkpoint.read(), 1500);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(checkpoint.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"last_processed_line": 1500}));
    }

    #[test]
    fn test_corrupt_checkpoint_starts_over() {
        let dir = TempDir::new().unwrap();
        let (checkpoint, sink) = store(&dir);
        fs::create_dir_all(checkpoint.path().parent().unwrap()).unwrap();
        fs::write(checkpoint.path(), "{not json").unwrap();

        assert_eq!(checkpoint.read(), 0);
        assert!(matches!(
            sink.events()[0],
            DiagnosticEvent::CheckpointUnreadable { .. }
        ));
    }

    #[test]
    fn test_missing_key_defaults_to_zero() {
        let dir = TempDir::new().unwrap();
        let (checkpoint, _) = store(&dir);
        fs::create_dir_all(checkpoint.path().parent().unwrap()).unwrap();
        fs::write(checkpoint.path(), "{}").unwrap();
        assert_eq!(checkpoint.read(), 0);
    }

    #[test]
    fn test_unwritable_location_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let sink = Arc::new(CapturedDiagnostics::new());
        let checkpoint = CheckpointStore::new(blocker.join("checkpoint.json"), sink.clone());

        assert!(!checkpoint.write(10));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            DiagnosticEvent::CheckpointWriteFailed { offset: 10, .. }
        ));
    }

    #[test]
    fn test_write_over_corrupt_file_is_silent() {
        let dir = TempDir::new().unwrap();
        let (checkpoint, sink) = store(&dir);
        fs::create_dir_all(checkpoint.path().parent().unwrap()).unwrap();
        fs::write(checkpoint.path(), "not json").unwrap();

        assert!(checkpoint.write(4));
        assert!(sink.events().is_empty());
        assert_eq!(checkpoint.read(), 4);
    }

    #[test]
    fn test_reset_removes_file() {
        let dir = TempDir::new().unwrap();
        let (checkpoint, _) = store(&dir);
        checkpoint.write(7);
        checkpoint.reset().unwrap();
        assert_eq!(checkpoint.read(), 0);
        checkpoint.reset().unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_read_returns_max_written(offsets in proptest::collection::vec(0u64..10_000, 0..12)) {
            let dir = TempDir::new().unwrap();
            let (checkpoint, _) = store(&dir);
            for offset in &offsets {
                checkpoint.write(*offset);
            }
            prop_assert_eq!(checkpoint.read(), offsets.iter().copied().max().unwrap_or(0));
        }
    }
}
