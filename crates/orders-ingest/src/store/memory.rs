//! In-memory order store with fault injection

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::{BulkInsertReport, DocumentFailure, OrderStore, StoreError};

/// Fault applied to one `insert_unordered` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertFault {
    /// Reject the documents at these positions, insert the rest
    Reject(Vec<usize>),
    /// Fail the whole call
    Unavailable(String),
}

#[derive(Debug, Default)]
struct State {
    documents: Vec<Value>,
    indexes: BTreeSet<String>,
    insert_faults: VecDeque<InsertFault>,
    insert_calls: u32,
    closed: bool,
}

/// Order store backed by a `Vec`
///
/// Faults queued with [`MemoryOrderStore::with_insert_faults`] are consumed
/// one per insert call; once the queue is empty inserts succeed.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    state: Mutex<State>,
    unique_key: Option<String>,
    failing_index: Option<String>,
    ping_failure: Option<String>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_faults(self, faults: impl IntoIterator<Item = InsertFault>) -> Self {
        self.lock().insert_faults.extend(faults);
        self
    }

    /// Reject documents whose `field` value is already stored
    pub fn with_unique_key(mut self, field: impl Into<String>) -> Self {
        self.unique_key = Some(field.into());
        self
    }

    pub fn with_failing_index(mut self, field: impl Into<String>) -> Self {
        self.failing_index = Some(field.into());
        self
    }

    pub fn with_ping_failure(mut self, message: impl Into<String>) -> Self {
        self.ping_failure = Some(message.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn documents(&self) -> Vec<Value> {
        self.lock().documents.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().documents.is_empty()
    }

    pub fn indexes(&self) -> Vec<String> {
        self.lock().indexes.iter().cloned().collect()
    }

    pub fn insert_calls(&self) -> u32 {
        self.lock().insert_calls
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn is_duplicate(&self, state: &State, document: &Value) -> bool {
        let Some(key) = &self.unique_key else {
            return false;
        };
        match document.get(key) {
            Some(value) if !value.is_null() => {
                state.documents.iter().any(|d| d.get(key) == Some(value))
            }
            _ => false,
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn ping(&self) -> Result<(), StoreError> {
        match &self.ping_failure {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    async fn prepare_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_index(&self, field: &str) -> Result<(), StoreError> {
        if self.failing_index.as_deref() == Some(field) {
            return Err(StoreError::Unavailable(format!("cannot index {}", field)));
        }
        self.lock().indexes.insert(field.to_string());
        Ok(())
    }

    async fn insert_unordered(&self, documents: &[Value]) -> Result<BulkInsertReport, StoreError> {
        let mut state = self.lock();
        state.insert_calls += 1;

        let rejected = match state.insert_faults.pop_front() {
            Some(InsertFault::Unavailable(message)) => {
                return Err(StoreError::Unavailable(message))
            }
            Some(InsertFault::Reject(positions)) => positions,
            None => Vec::new(),
        };

        let mut report = BulkInsertReport::default();
        for (index, document) in documents.iter().enumerate() {
            if rejected.contains(&index) {
                report.failures.push(DocumentFailure {
                    index,
                    message: "simulated rejection".to_string(),
                });
            } else if self.is_duplicate(&state, document) {
                report.failures.push(DocumentFailure {
                    index,
                    message: "duplicate key".to_string(),
                });
            } else {
                state.documents.push(document.clone());
                report.inserted += 1;
            }
        }
        Ok(report)
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}
