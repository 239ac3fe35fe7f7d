//! In-memory document store adapter.
//!
//! Backs tests and local composition with the same semantics the managed
//! service offers the platform: upsert puts, idempotent deletes,
//! set-semantics list mutation, and ordered change notifications. A
//! `test-support` fault queue lets behavioural tests fail a chosen call
//! exactly once without a custom mock.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};
use serde_json::Value;

use crate::domain::ports::{
    DocumentChange, DocumentStore, DocumentWatch, RemoteStoreError, WatchHandle,
};
use crate::domain::store::{CollectionPath, DocPath, Document};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const WATCH_BUFFER: usize = 16;

#[derive(Debug, Clone)]
struct StoreEvent {
    path: String,
    change: DocumentChange,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    document: Document,
    inserted: u64,
}

/// Operation a [`StoreFault`] intercepts.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultOp {
    Get,
    Put,
    Delete,
    Append,
    Remove,
}

/// One-shot injected failure for behavioural tests.
///
/// The first store call matching the operation and path consumes the fault
/// and fails with its error; every other call proceeds normally.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone)]
pub struct StoreFault {
    op: FaultOp,
    path: String,
    error: RemoteStoreError,
}

#[cfg(any(test, feature = "test-support"))]
impl StoreFault {
    /// Fail the next `get` of `path`.
    pub fn get(path: &DocPath, error: RemoteStoreError) -> Self {
        Self {
            op: FaultOp::Get,
            path: path.to_string(),
            error,
        }
    }

    /// Fail the next `put` of `path`.
    pub fn put(path: &DocPath, error: RemoteStoreError) -> Self {
        Self {
            op: FaultOp::Put,
            path: path.to_string(),
            error,
        }
    }

    /// Fail the next `delete` of `path`.
    pub fn delete(path: &DocPath, error: RemoteStoreError) -> Self {
        Self {
            op: FaultOp::Delete,
            path: path.to_string(),
            error,
        }
    }

    /// Fail the next list append on `path`.
    pub fn append(path: &DocPath, error: RemoteStoreError) -> Self {
        Self {
            op: FaultOp::Append,
            path: path.to_string(),
            error,
        }
    }

    /// Fail the next list removal on `path`.
    pub fn remove(path: &DocPath, error: RemoteStoreError) -> Self {
        Self {
            op: FaultOp::Remove,
            path: path.to_string(),
            error,
        }
    }
}

#[derive(Default)]
struct State {
    documents: BTreeMap<String, StoredDocument>,
    next_seq: u64,
    #[cfg(any(test, feature = "test-support"))]
    faults: Vec<StoreFault>,
}

impl State {
    #[cfg(any(test, feature = "test-support"))]
    fn take_fault(&mut self, op: FaultOp, path: &str) -> Option<RemoteStoreError> {
        let position = self
            .faults
            .iter()
            .position(|fault| fault.op == op && fault.path == path)?;
        Some(self.faults.remove(position).error)
    }

}

/// In-memory [`DocumentStore`] with ordered change notifications.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<State>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            events,
        }
    }

    /// Queue a one-shot failure for the next matching call.
    #[cfg(any(test, feature = "test-support"))]
    pub async fn inject(&self, fault: StoreFault) {
        self.state.lock().await.faults.push(fault);
    }

    /// Publish while the state lock is held so subscribers observe changes
    /// in application order.
    fn publish(&self, path: &str, change: DocumentChange) {
        let _ = self.events.send(StoreEvent {
            path: path.to_owned(),
            change,
        });
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, RemoteStoreError> {
        let key = path.to_string();
        let mut state = self.state.lock().await;
        #[cfg(any(test, feature = "test-support"))]
        if let Some(error) = state.take_fault(FaultOp::Get, &key) {
            return Err(error);
        }
        Ok(state.documents.get(&key).map(|stored| stored.document.clone()))
    }

    async fn put(&self, path: &DocPath, document: &Document) -> Result<(), RemoteStoreError> {
        let key = path.to_string();
        let mut state = self.state.lock().await;
        #[cfg(any(test, feature = "test-support"))]
        if let Some(error) = state.take_fault(FaultOp::Put, &key) {
            return Err(error);
        }
        // Replacement keeps the original slot so listings stay stable.
        let existing_slot = state.documents.get(&key).map(|stored| stored.inserted);
        let inserted = match existing_slot {
            Some(slot) => slot,
            None => {
                let seq = state.next_seq;
                state.next_seq = state.next_seq.saturating_add(1);
                seq
            }
        };
        state.documents.insert(
            key.clone(),
            StoredDocument {
                document: document.clone(),
                inserted,
            },
        );
        self.publish(&key, DocumentChange::Updated(document.clone()));
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), RemoteStoreError> {
        let key = path.to_string();
        let mut state = self.state.lock().await;
        #[cfg(any(test, feature = "test-support"))]
        if let Some(error) = state.take_fault(FaultOp::Delete, &key) {
            return Err(error);
        }
        if state.documents.remove(&key).is_some() {
            self.publish(&key, DocumentChange::Deleted);
        }
        Ok(())
    }

    async fn append_to_list(
        &self,
        path: &DocPath,
        field: &str,
        value: &str,
    ) -> Result<(), RemoteStoreError> {
        let key = path.to_string();
        let mut state = self.state.lock().await;
        #[cfg(any(test, feature = "test-support"))]
        if let Some(error) = state.take_fault(FaultOp::Append, &key) {
            return Err(error);
        }
        let Some(stored) = state.documents.get_mut(&key) else {
            return Err(RemoteStoreError::operation(format!(
                "document missing at {key}"
            )));
        };
        let mut payload: Value = stored.document.as_value().clone();
        let entries = payload
            .as_object_mut()
            .and_then(|object| {
                object
                    .entry(field.to_owned())
                    .or_insert_with(|| Value::Array(Vec::new()))
                    .as_array_mut()
            })
            .ok_or_else(|| {
                RemoteStoreError::operation(format!("field {field} at {key} is not a list"))
            })?;
        if entries.iter().any(|entry| entry.as_str() == Some(value)) {
            return Ok(());
        }
        entries.push(Value::String(value.to_owned()));
        let updated = Document::new(payload)
            .map_err(|error| RemoteStoreError::codec(error.to_string()))?;
        stored.document = updated.clone();
        self.publish(&key, DocumentChange::Updated(updated));
        Ok(())
    }

    async fn remove_from_list(
        &self,
        path: &DocPath,
        field: &str,
        value: &str,
    ) -> Result<(), RemoteStoreError> {
        let key = path.to_string();
        let mut state = self.state.lock().await;
        #[cfg(any(test, feature = "test-support"))]
        if let Some(error) = state.take_fault(FaultOp::Remove, &key) {
            return Err(error);
        }
        let Some(stored) = state.documents.get_mut(&key) else {
            return Err(RemoteStoreError::operation(format!(
                "document missing at {key}"
            )));
        };
        let mut payload: Value = stored.document.as_value().clone();
        let Some(entries) = payload
            .as_object_mut()
            .and_then(|object| object.get_mut(field))
            .and_then(Value::as_array_mut)
        else {
            // Absent field is an empty list; removal is a no-op.
            return Ok(());
        };
        let before = entries.len();
        entries.retain(|entry| entry.as_str() != Some(value));
        if entries.len() == before {
            return Ok(());
        }
        let updated = Document::new(payload)
            .map_err(|error| RemoteStoreError::codec(error.to_string()))?;
        stored.document = updated.clone();
        self.publish(&key, DocumentChange::Updated(updated));
        Ok(())
    }

    async fn list(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<(DocPath, Document)>, RemoteStoreError> {
        let prefix = format!("{collection}/");
        let state = self.state.lock().await;
        let mut matches: Vec<(&String, &StoredDocument)> = state
            .documents
            .iter()
            .filter(|(key, _)| {
                key.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .collect();
        matches.sort_by_key(|(_, stored)| stored.inserted);
        matches
            .into_iter()
            .map(|(key, stored)| {
                DocPath::parse(key)
                    .map(|path| (path, stored.document.clone()))
                    .map_err(|error| RemoteStoreError::codec(error.to_string()))
            })
            .collect()
    }

    async fn watch(&self, path: &DocPath) -> Result<DocumentWatch, RemoteStoreError> {
        let key = path.to_string();
        // Snapshot and subscription happen under one lock so no change can
        // slip between them.
        let state = self.state.lock().await;
        let snapshot = state.documents.get(&key).map(|stored| stored.document.clone());
        let mut events = self.events.subscribe();
        drop(state);

        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.path == key => {
                        if tx.send(event.change).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(DocumentWatch {
            snapshot,
            updates: rx,
            handle: WatchHandle::for_task(task.abort_handle()),
        })
    }
}
