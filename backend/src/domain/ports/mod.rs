//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod push_relay;
mod write_sequencer;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    DocumentChange, DocumentStore, DocumentWatch, RemoteStoreError, WatchHandle,
};
#[cfg(test)]
pub use push_relay::MockPushRelay;
pub use push_relay::{NoOpPushRelay, PushRelay, PushRelayError};
#[cfg(test)]
pub use write_sequencer::MockWriteSequencer;
pub use write_sequencer::WriteSequencer;
