//! Sequential saga execution with bounded retry and best-effort compensation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::domain::ports::{DocumentStore, RemoteStoreError, WriteSequencer};
use crate::domain::store::{DocPath, Document};

use super::plan::{PlannedStep, StoreWrite, plan};
use super::{SagaCommand, SagaOutcome, SagaReport, SagaStatus, StepRecord, StepStatus};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded exponential backoff for transient store failures.
///
/// Only idempotent calls are ever retried, which every store write is by
/// contract, so the policy applies uniformly. Delays carry jitter so
/// simultaneous retries spread out.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Build a policy; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Policy that never retries, for tests and offline tooling.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    fn delay_for(&self, attempt: u32, rng: &mut SmallRng) -> Duration {
        let base = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let cap = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let exponent = attempt.saturating_sub(1).min(16);
        let scaled = base.saturating_mul(1_u64 << exponent).min(cap);
        // Half fixed, half jittered, so the delay stays within [scaled/2, scaled].
        let half = scaled >> 1_u32;
        let jitter = if half == 0 { 0 } else { rng.gen_range(0..=half) };
        Duration::from_millis(half.saturating_add(jitter))
    }
}

/// Reversal action derived from the state observed before a write applied.
#[derive(Debug, Clone)]
enum Undo {
    /// Nothing to reverse (the write was a no-op on observed state).
    None,
    /// Restore the prior version of a replaced or deleted document.
    Restore { path: DocPath, document: Document },
    /// Delete a document the step created.
    Delete { path: DocPath },
    /// Remove a list entry the step added.
    Unlink {
        path: DocPath,
        field: &'static str,
        value: String,
    },
    /// Re-add a list entry the step removed.
    Relink {
        path: DocPath,
        field: &'static str,
        value: String,
    },
}

/// Executes saga commands against the document store.
///
/// Steps run strictly sequentially: a step only starts once its predecessor
/// succeeded. Each remote call is bounded by a timeout and retried under the
/// [`RetryPolicy`] while the failure looks transient. On the first step
/// failure the runner reverses the already-applied steps in reverse order,
/// best-effort, and reports whatever could not be reversed.
#[derive(Clone)]
pub struct SagaRunner {
    store: Arc<dyn DocumentStore>,
    call_timeout: Duration,
    retry: RetryPolicy,
}

impl SagaRunner {
    /// Create a runner with default timeout and retry policy.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run one command to its terminal outcome.
    pub async fn run(&self, command: SagaCommand) -> SagaReport {
        let kind = command.kind();
        let steps = match plan(&command) {
            Ok(steps) => steps,
            Err(cause) => {
                warn!(command = ?kind, error = %cause, "saga plan failed to lower");
                return SagaReport::new(
                    kind,
                    Vec::new(),
                    SagaOutcome::Failed {
                        step: 1,
                        cause,
                        unreversed: Vec::new(),
                    },
                );
            }
        };

        let mut records: Vec<StepRecord> = steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepRecord {
                step: index.saturating_add(1),
                name: step.name,
                status: StepStatus::Skipped,
            })
            .collect();
        let mut undos: Vec<(usize, Undo)> = Vec::new();

        debug!(command = ?kind, steps = steps.len(), "{}", SagaStatus::Pending);
        for (index, step) in steps.iter().enumerate() {
            let number = index.saturating_add(1);
            debug!(command = ?kind, name = step.name, "{}", SagaStatus::StepExecuting(number));

            match self.apply_step(step).await {
                Ok(undo) => {
                    if let Some(record) = records.get_mut(index) {
                        record.status = StepStatus::Applied;
                    }
                    undos.push((number, undo));
                }
                Err(cause) => {
                    if let Some(record) = records.get_mut(index) {
                        record.status = StepStatus::Failed;
                    }
                    warn!(
                        command = ?kind,
                        name = step.name,
                        error = %cause,
                        "{}",
                        SagaStatus::Failed(number)
                    );
                    let unreversed = self.compensate(&mut records, &undos).await;
                    return SagaReport::new(
                        kind,
                        records,
                        SagaOutcome::Failed {
                            step: number,
                            cause,
                            unreversed,
                        },
                    );
                }
            }
        }

        debug!(command = ?kind, "{}", SagaStatus::Completed);
        SagaReport::new(kind, records, SagaOutcome::Completed)
    }

    async fn apply_step(&self, step: &PlannedStep) -> Result<Undo, RemoteStoreError> {
        let undo = self.capture_undo(&step.write).await?;
        self.apply_write(&step.write).await?;
        Ok(undo)
    }

    /// Observe the state a write is about to clobber and derive its reversal.
    async fn capture_undo(&self, write: &StoreWrite) -> Result<Undo, RemoteStoreError> {
        match write {
            StoreWrite::Put { path, .. } => {
                let prior = self.retry_call(|| self.store.get(path)).await?;
                Ok(prior.map_or_else(
                    || Undo::Delete { path: path.clone() },
                    |document| Undo::Restore {
                        path: path.clone(),
                        document,
                    },
                ))
            }
            StoreWrite::Delete { path } => {
                let prior = self.retry_call(|| self.store.get(path)).await?;
                Ok(prior.map_or(Undo::None, |document| Undo::Restore {
                    path: path.clone(),
                    document,
                }))
            }
            StoreWrite::AppendToList { path, field, value } => {
                let prior = self.retry_call(|| self.store.get(path)).await?;
                let already_present = prior
                    .as_ref()
                    .is_some_and(|document| document.list_field(field).iter().any(|v| v == value));
                if already_present {
                    Ok(Undo::None)
                } else {
                    Ok(Undo::Unlink {
                        path: path.clone(),
                        field: *field,
                        value: value.clone(),
                    })
                }
            }
            StoreWrite::RemoveFromList { path, field, value } => {
                let prior = self.retry_call(|| self.store.get(path)).await?;
                let present = prior
                    .as_ref()
                    .is_some_and(|document| document.list_field(field).iter().any(|v| v == value));
                if present {
                    Ok(Undo::Relink {
                        path: path.clone(),
                        field: *field,
                        value: value.clone(),
                    })
                } else {
                    Ok(Undo::None)
                }
            }
        }
    }

    async fn apply_write(&self, write: &StoreWrite) -> Result<(), RemoteStoreError> {
        match write {
            StoreWrite::Put { path, document } => {
                self.retry_call(|| self.store.put(path, document)).await
            }
            StoreWrite::Delete { path } => self.retry_call(|| self.store.delete(path)).await,
            StoreWrite::AppendToList { path, field, value } => {
                self.retry_call(|| self.store.append_to_list(path, field, value))
                    .await
            }
            StoreWrite::RemoveFromList { path, field, value } => {
                self.retry_call(|| self.store.remove_from_list(path, field, value))
                    .await
            }
        }
    }

    /// Reverse applied steps, newest first. Returns the step numbers whose
    /// reversal failed, oldest first.
    async fn compensate(
        &self,
        records: &mut [StepRecord],
        undos: &[(usize, Undo)],
    ) -> Vec<usize> {
        let mut unreversed = Vec::new();
        for (number, undo) in undos.iter().rev() {
            let result = match undo {
                Undo::None => Ok(()),
                Undo::Restore { path, document } => {
                    self.retry_call(|| self.store.put(path, document)).await
                }
                Undo::Delete { path } => self.retry_call(|| self.store.delete(path)).await,
                Undo::Unlink { path, field, value } => {
                    self.retry_call(|| self.store.remove_from_list(path, field, value))
                        .await
                }
                Undo::Relink { path, field, value } => {
                    self.retry_call(|| self.store.append_to_list(path, field, value))
                        .await
                }
            };
            let status = match result {
                Ok(()) => StepStatus::Compensated,
                Err(error) => {
                    warn!(
                        step = number,
                        error = %error,
                        "compensation failed; leaving drift for reconciliation"
                    );
                    unreversed.push(*number);
                    StepStatus::CompensationFailed
                }
            };
            if let Some(record) = records.iter_mut().find(|record| record.step == *number) {
                record.status = status;
            }
        }
        unreversed.sort_unstable();
        unreversed
    }

    /// Bound one remote call by the timeout and retry it while transient.
    async fn retry_call<T, F, Fut>(&self, operation: F) -> Result<T, RemoteStoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RemoteStoreError>>,
    {
        let mut rng = SmallRng::from_entropy();
        let mut attempt: u32 = 1;
        loop {
            let outcome = match tokio::time::timeout(self.call_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(RemoteStoreError::unavailable(format!(
                    "call exceeded {}ms",
                    self.call_timeout.as_millis()
                ))),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt, &mut rng);
                    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                    debug!(attempt, delay_ms, error = %error, "transient store failure; backing off");
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl WriteSequencer for SagaRunner {
    async fn execute(&self, command: SagaCommand) -> SagaReport {
        self.run(command).await
    }
}
