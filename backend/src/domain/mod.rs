//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the strongly typed entities of the platform, the ports
//! through which adapters reach the managed document store and push relay,
//! and the services that sequence multi-collection writes, project remote
//! state, and repair drift. Types are immutable; invariants and
//! serialisation contracts (serde) live in each type's Rustdoc.

pub mod auth;
pub mod bug_report;
pub mod catalogue;
pub mod chat;
pub mod error;
pub mod events;
pub mod ids;
pub mod label;
pub mod notifications;
pub mod ports;
pub mod projection;
pub mod reconcile;
pub mod registration;
pub mod remote_state;
pub mod saga;
pub mod store;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::bug_report::BugReport;
pub use self::catalogue::{Category, Club, ClubRole, Membership, Visibility};
pub use self::chat::{Chat, ChatKind, ChatMessage, ChatParticipant, ChatRole};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::events::{Event, EventMode, Team, TeamSizeBounds, Ticket, TicketCode, TicketStatus};
pub use self::ids::{
    BugReportId, CategoryId, ChatId, ClubId, EventId, IdValidationError, TeamId, TicketId, UserId,
};
pub use self::label::Label;
pub use self::notifications::{EventAnnouncer, PushMessage, PushNotification};
pub use self::projection::{Projection, ProjectionSubscription};
pub use self::reconcile::{DriftEntry, DriftKind, DriftReport, Reconciler};
pub use self::registration::{RegistrationService, TeamSignup};
pub use self::remote_state::RemoteState;
pub use self::saga::{
    RetryPolicy, SagaCommand, SagaCommandKind, SagaOutcome, SagaReport, SagaRunner, SagaStatus,
    StepRecord, StepStatus,
};
pub use self::store::{CollectionPath, DocPath, Document, DocumentError, PathError};
pub use self::user::{DisplayName, EmailAddress, Role, User, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
