//! Port abstraction for the multi-collection write sequencer.

use async_trait::async_trait;

use crate::domain::saga::{SagaCommand, SagaReport};

/// Port executing one multi-write command to its terminal outcome.
///
/// Implementations never surface failures as `Err`: a failed run is a value,
/// reported through [`SagaReport`] with the failing step, its cause, and any
/// committed-but-unreversed steps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WriteSequencer: Send + Sync {
    /// Run the command's steps strictly in order and report the outcome.
    async fn execute(&self, command: SagaCommand) -> SagaReport;
}
