//! Multi-collection write sequencing.
//!
//! Every user-visible action that touches more than one collection is
//! expressed as a [`SagaCommand`], lowered to an ordered plan of store
//! writes, and executed strictly sequentially by the [`SagaRunner`]. The
//! store offers no transaction spanning top-level collections, so the runner
//! supplies the next best thing: idempotent steps that are safe to retry,
//! best-effort compensation in reverse order when a later step fails, and a
//! report naming whatever could not be reversed so the reconciler can repair
//! it afterwards.
//!
//! A run progresses through the states
//! `Pending → StepExecuting(i) → … → Completed | Failed(i)`.

mod plan;
mod runner;

pub use runner::{RetryPolicy, SagaRunner};

use serde::Serialize;

use crate::domain::catalogue::{Club, Membership};
use crate::domain::error::Error;
use crate::domain::events::{Event, Ticket};
use crate::domain::ids::{CategoryId, ClubId, UserId};
use crate::domain::ports::RemoteStoreError;

/// Typed multi-write command, one variant per user-visible action.
#[derive(Debug, Clone, PartialEq)]
pub enum SagaCommand {
    /// Write the club document, then link it into its category.
    CreateClub {
        /// Club to create; carries its own category reference.
        club: Club,
    },
    /// Write the event document, then link it into its club.
    CreateEvent {
        /// Event to create; carries category and club references.
        event: Event,
    },
    /// Delete the club document, then unlink it from its category.
    DeleteClub {
        /// Category holding the club.
        category_id: CategoryId,
        /// Club to delete.
        club_id: ClubId,
    },
    /// Write the membership record, then add the club to the user's list.
    JoinClub {
        /// Category holding the club.
        category_id: CategoryId,
        /// Club being joined.
        club_id: ClubId,
        /// Membership record to store; carries the joining user.
        membership: Membership,
    },
    /// Delete the membership record, then remove the club from the user's
    /// list.
    LeaveClub {
        /// Category holding the club.
        category_id: CategoryId,
        /// Club being left.
        club_id: ClubId,
        /// Leaving user.
        user_id: UserId,
    },
    /// Write the ticket under the user, then under the event, then link it
    /// into the event's and the user's lists. Four writes.
    IssueTicket {
        /// Ticket to issue; carries every id its paths need.
        ticket: Ticket,
    },
}

/// Discriminant of a [`SagaCommand`], for reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SagaCommandKind {
    /// See [`SagaCommand::CreateClub`].
    CreateClub,
    /// See [`SagaCommand::CreateEvent`].
    CreateEvent,
    /// See [`SagaCommand::DeleteClub`].
    DeleteClub,
    /// See [`SagaCommand::JoinClub`].
    JoinClub,
    /// See [`SagaCommand::LeaveClub`].
    LeaveClub,
    /// See [`SagaCommand::IssueTicket`].
    IssueTicket,
}

impl SagaCommand {
    /// Discriminant of this command.
    pub fn kind(&self) -> SagaCommandKind {
        match self {
            Self::CreateClub { .. } => SagaCommandKind::CreateClub,
            Self::CreateEvent { .. } => SagaCommandKind::CreateEvent,
            Self::DeleteClub { .. } => SagaCommandKind::DeleteClub,
            Self::JoinClub { .. } => SagaCommandKind::JoinClub,
            Self::LeaveClub { .. } => SagaCommandKind::LeaveClub,
            Self::IssueTicket { .. } => SagaCommandKind::IssueTicket,
        }
    }
}

/// Progress of a single run, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStatus {
    /// No step has started yet.
    Pending,
    /// The 1-based step is in flight.
    StepExecuting(usize),
    /// Every step applied.
    Completed,
    /// The 1-based step failed; earlier steps were compensated best-effort.
    Failed(usize),
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::StepExecuting(step) => write!(f, "executing step {step}"),
            Self::Completed => write!(f, "completed"),
            Self::Failed(step) => write!(f, "failed at step {step}"),
        }
    }
}

/// Terminal fate of one planned step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    /// The write was applied and kept.
    Applied,
    /// The write failed; the run aborted here.
    Failed,
    /// The step never ran because an earlier one failed.
    Skipped,
    /// The write was applied, then reversed during compensation.
    Compensated,
    /// The write was applied but its reversal failed; the reconciler owns
    /// the repair.
    CompensationFailed,
}

/// Per-step entry of a [`SagaReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// 1-based position in the plan.
    pub step: usize,
    /// Human-readable step name.
    pub name: &'static str,
    /// Terminal fate of the step.
    pub status: StepStatus,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SagaOutcome {
    /// Every step applied.
    Completed,
    /// A step failed.
    Failed {
        /// 1-based index of the failing step.
        step: usize,
        /// First failure observed, verbatim from the store port.
        cause: RemoteStoreError,
        /// Steps that committed but could not be reversed, oldest first.
        /// Non-empty values are drift the reconciler must repair.
        unreversed: Vec<usize>,
    },
}

/// Full account of one saga run.
#[derive(Debug, Clone, PartialEq)]
pub struct SagaReport {
    kind: SagaCommandKind,
    steps: Vec<StepRecord>,
    outcome: SagaOutcome,
}

impl SagaReport {
    pub(crate) fn new(kind: SagaCommandKind, steps: Vec<StepRecord>, outcome: SagaOutcome) -> Self {
        Self {
            kind,
            steps,
            outcome,
        }
    }

    /// Command this run executed.
    pub fn kind(&self) -> SagaCommandKind {
        self.kind
    }

    /// Per-step records, in plan order.
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Terminal outcome.
    pub fn outcome(&self) -> &SagaOutcome {
        &self.outcome
    }

    /// Whether every step applied.
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, SagaOutcome::Completed)
    }

    /// Convert the report into a domain result for handlers.
    ///
    /// Transient failures surface as `service_unavailable` so clients retry;
    /// everything else maps to an internal error. Either way the failing
    /// step, the command, and any unreversed steps travel in the details.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`Error`] when the outcome is
    /// [`SagaOutcome::Failed`].
    pub fn into_result(self) -> Result<Self, Error> {
        match &self.outcome {
            SagaOutcome::Completed => Ok(self),
            SagaOutcome::Failed {
                step,
                cause,
                unreversed,
            } => {
                let details = serde_json::json!({
                    "command": self.kind,
                    "step": step,
                    "unreversed": unreversed,
                });
                let error = if cause.is_transient() {
                    Error::service_unavailable(cause.to_string())
                } else {
                    Error::internal(cause.to_string())
                };
                Err(error.with_details(details))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::error::ErrorCode;

    fn failed_report(cause: RemoteStoreError) -> SagaReport {
        SagaReport::new(
            SagaCommandKind::IssueTicket,
            vec![StepRecord {
                step: 1,
                name: "put ticket under user",
                status: StepStatus::Failed,
            }],
            SagaOutcome::Failed {
                step: 1,
                cause,
                unreversed: Vec::new(),
            },
        )
    }

    #[test]
    fn transient_failures_map_to_service_unavailable() {
        let err = failed_report(RemoteStoreError::unavailable("timeout"))
            .into_result()
            .expect_err("failed outcome must error");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[test]
    fn terminal_failures_map_to_internal_errors_with_step_details() {
        let err = failed_report(RemoteStoreError::operation("permission denied"))
            .into_result()
            .expect_err("failed outcome must error");
        assert_eq!(err.code(), ErrorCode::InternalError);
        let details = err.details().expect("details carry the step");
        assert_eq!(details["step"], 1);
        assert_eq!(details["command"], "issueTicket");
    }

    #[test]
    fn status_displays_read_naturally() {
        assert_eq!(SagaStatus::StepExecuting(3).to_string(), "executing step 3");
        assert_eq!(SagaStatus::Failed(2).to_string(), "failed at step 2");
    }
}
