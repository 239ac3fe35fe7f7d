//! Shared HTTP adapter state.
//!
//! Handlers receive every dependency through this bundle, built once by the
//! composition root. Ports stay behind `Arc<dyn …>` so handler tests swap in
//! mocks; services are plain values constructed from those same ports.

use std::sync::Arc;

use crate::domain::ports::{DocumentStore, PushRelay, WriteSequencer};
use crate::domain::{
    DocPath, EventAnnouncer, Error, Projection, Reconciler, RegistrationService, Role, User,
    UserId,
};
use crate::outbound::store::MemoryDocumentStore;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Document store port.
    pub store: Arc<dyn DocumentStore>,
    /// Write sequencer port.
    pub sequencer: Arc<dyn WriteSequencer>,
    /// Registration service gating ticket and team writes.
    pub registration: RegistrationService,
    /// Drift scanner and healer.
    pub reconciler: Reconciler,
    /// Push announcement service.
    pub announcer: EventAnnouncer,
    /// Projection factory for subscription adapters.
    pub projection: Projection,
}

impl HttpState {
    /// Wire the state from its ports.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sequencer: Arc<dyn WriteSequencer>,
        relay: Arc<dyn PushRelay>,
    ) -> Self {
        Self {
            registration: RegistrationService::new(store.clone(), sequencer.clone()),
            reconciler: Reconciler::new(store.clone()),
            announcer: EventAnnouncer::new(relay),
            projection: Projection::new(store.clone()),
            store,
            sequencer,
        }
    }

    /// State over a fresh in-memory store, for local composition and tests.
    pub fn in_memory() -> Self {
        use crate::domain::SagaRunner;
        use crate::domain::ports::NoOpPushRelay;

        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let sequencer: Arc<dyn WriteSequencer> = Arc::new(SagaRunner::new(store.clone()));
        Self::new(store, sequencer, Arc::new(NoOpPushRelay))
    }

    /// Load the acting user's document.
    ///
    /// # Errors
    ///
    /// `401` when the account disappeared; store failures map through.
    pub async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        let document = self
            .store
            .get(&DocPath::user(user_id))
            .await
            .map_err(|error| Error::service_unavailable(error.to_string()))?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))?;
        document
            .to_entity()
            .map_err(|error| Error::internal(format!("stored user is malformed: {error}")))
    }

    /// Load the acting user and require the platform admin role.
    ///
    /// # Errors
    ///
    /// `403` for non-admins on top of [`HttpState::load_user`] failures.
    pub async fn require_admin(&self, user_id: &UserId) -> Result<User, Error> {
        let user = self.load_user(user_id).await?;
        if user.role() == Role::Admin {
            Ok(user)
        } else {
            Err(Error::forbidden("administrator role required"))
        }
    }
}
