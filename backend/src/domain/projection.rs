//! Reactive projections over document watches.
//!
//! A projection wraps a store subscription into the observe contract the
//! adapters consume: the current snapshot first, then one update per remote
//! mutation, in store-application order. Establishment failure is terminal;
//! cancellation is explicit and idempotent.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::error::Error;
use crate::domain::ports::{DocumentChange, DocumentStore, WatchHandle};
use crate::domain::remote_state::RemoteState;
use crate::domain::store::{DocPath, Document};

/// Observable view of a single document path.
#[derive(Debug)]
pub struct ProjectionSubscription {
    current: RemoteState<Option<Document>>,
    updates: mpsc::Receiver<DocumentChange>,
    handle: WatchHandle,
}

impl ProjectionSubscription {
    /// Latest observed state; starts at the subscription-time snapshot.
    pub fn current(&self) -> &RemoteState<Option<Document>> {
        &self.current
    }

    /// Await the next remote mutation.
    ///
    /// Returns `None` once the subscription is cancelled or the store closes
    /// the stream.
    pub async fn next(&mut self) -> Option<RemoteState<Option<Document>>> {
        let change = self.updates.recv().await?;
        let state = match change {
            DocumentChange::Updated(document) => RemoteState::Ready(Some(document)),
            DocumentChange::Deleted => RemoteState::Ready(None),
        };
        self.current = state.clone();
        Some(state)
    }

    /// Release the remote listener. Safe to call repeatedly.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Clone the cancellation handle, e.g. to release the listener after the
    /// subscription moved into a forwarding task.
    pub fn watch_handle(&self) -> WatchHandle {
        self.handle.clone()
    }
}

/// Factory building projections over one document store.
#[derive(Clone)]
pub struct Projection {
    store: Arc<dyn DocumentStore>,
}

impl Projection {
    /// Create a projection factory over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Subscribe to a document path.
    ///
    /// # Errors
    ///
    /// Establishment failure returns a terminal [`Error`]; no subscription
    /// exists afterwards.
    pub async fn subscribe(&self, path: &DocPath) -> Result<ProjectionSubscription, Error> {
        let watch = self
            .store
            .watch(path)
            .await
            .map_err(|error| Error::service_unavailable(error.to_string()))?;
        Ok(ProjectionSubscription {
            current: RemoteState::Ready(watch.snapshot),
            updates: watch.updates,
            handle: watch.handle,
        })
    }
}
