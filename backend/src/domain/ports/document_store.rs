//! Port abstraction for the remote document store.
//!
//! The platform delegates all persistence to a managed hierarchical document
//! service. This port models the slice of that service the backend consumes:
//! per-document CRUD, set-semantics mutation of denormalised id lists,
//! collection listing, and change-notification subscriptions. The production
//! adapter for the managed service lives outside this repository; the
//! in-memory adapter in `outbound::store` backs tests and local composition.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::domain::store::{CollectionPath, DocPath, Document};

use super::define_port_error;

define_port_error! {
    /// Failures raised by document store adapters.
    ///
    /// The taxonomy is deliberately coarse: callers never branch on the
    /// concrete remote cause, but the retry policy needs to know whether a
    /// failure is plausibly transient.
    pub enum RemoteStoreError {
        /// The service could not be reached or timed out; safe to retry
        /// idempotent writes.
        Unavailable { message: String } => "remote store unavailable: {message}",
        /// The remote operation failed (permission, missing document, or any
        /// other terminal cause).
        Operation { message: String } => "remote operation failed: {message}",
        /// A payload failed to encode or decode.
        Codec { message: String } => "remote store codec failure: {message}",
    }
}

impl RemoteStoreError {
    /// Whether retrying the same idempotent call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Change notification delivered to a watch subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    /// The document was created or replaced.
    Updated(Document),
    /// The document was deleted.
    Deleted,
}

/// Cancellation handle for an active watch.
///
/// Cancellation is idempotent: calling [`WatchHandle::cancel`] more than once
/// is a no-op, and dropping the update receiver releases the subscription as
/// well.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    abort: Option<AbortHandle>,
}

impl WatchHandle {
    /// Wrap the forwarding task driving a subscription.
    pub fn for_task(abort: AbortHandle) -> Self {
        Self { abort: Some(abort) }
    }

    /// Handle with nothing to release, for fixtures.
    pub fn detached() -> Self {
        Self { abort: None }
    }

    /// Release the remote listener.
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }
}

/// Active subscription to a single document path.
#[derive(Debug)]
pub struct DocumentWatch {
    /// Document state at subscription time.
    pub snapshot: Option<Document>,
    /// Subsequent changes, in the order the store applied them.
    pub updates: mpsc::Receiver<DocumentChange>,
    /// Handle releasing the subscription.
    pub handle: WatchHandle,
}

/// Port for the remote document store.
///
/// Writes are idempotent by contract: `put` is an upsert, `delete` of a
/// missing document succeeds, and the list mutations have set semantics.
/// That contract is what lets the saga runner retry a failed step and re-run
/// whole sequences without creating duplicates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` when absent.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, RemoteStoreError>;

    /// Create or replace a document.
    async fn put(&self, path: &DocPath, document: &Document) -> Result<(), RemoteStoreError>;

    /// Delete a document; succeeds when already absent.
    async fn delete(&self, path: &DocPath) -> Result<(), RemoteStoreError>;

    /// Add `value` to a list field unless already present.
    ///
    /// Fails with [`RemoteStoreError::Operation`] when the document is
    /// missing.
    async fn append_to_list(
        &self,
        path: &DocPath,
        field: &str,
        value: &str,
    ) -> Result<(), RemoteStoreError>;

    /// Remove `value` from a list field; succeeds when already absent.
    ///
    /// Fails with [`RemoteStoreError::Operation`] when the document is
    /// missing.
    async fn remove_from_list(
        &self,
        path: &DocPath,
        field: &str,
        value: &str,
    ) -> Result<(), RemoteStoreError>;

    /// List a collection's documents in insertion order.
    async fn list(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<(DocPath, Document)>, RemoteStoreError>;

    /// Subscribe to a document path.
    ///
    /// Emits the current snapshot, then one change per subsequent mutation of
    /// that path, in store-application order.
    async fn watch(&self, path: &DocPath) -> Result<DocumentWatch, RemoteStoreError>;
}
