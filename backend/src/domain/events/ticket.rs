//! Ticket aggregate and its display identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{CategoryId, ClubId, EventId, TeamId, TicketId, UserId};

/// Lifecycle state of an issued ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Issued but awaiting organiser confirmation.
    Pending,
    /// Confirmed for entry.
    Confirmed,
    /// Withdrawn or revoked.
    Cancelled,
}

/// Display identity rendered as a QR image by clients.
///
/// The code is a plain concatenation of ticket, event, and category ids; it
/// carries no redundancy of its own because the QR symbology already does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    fn derive(ticket: &TicketId, event: &EventId, category: &CategoryId) -> Self {
        Self(format!("{ticket}-{event}-{category}"))
    }
}

impl AsRef<str> for TicketCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Ticket linking one user to one event.
///
/// The ticket carries every id needed to address its documents so a failed
/// issuance can be retried from the same input without re-deriving paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: TicketId,
    #[schema(value_type = String)]
    user_id: UserId,
    #[schema(value_type = String)]
    event_id: EventId,
    #[schema(value_type = String)]
    club_id: ClubId,
    #[schema(value_type = String)]
    category_id: CategoryId,
    status: TicketStatus,
    valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    team_id: Option<TeamId>,
    issued_at: DateTime<Utc>,
}

impl Ticket {
    /// Issue a new pending, valid ticket stamped now.
    pub fn issue(
        id: TicketId,
        user_id: UserId,
        event_id: EventId,
        club_id: ClubId,
        category_id: CategoryId,
    ) -> Self {
        Self {
            id,
            user_id,
            event_id,
            club_id,
            category_id,
            status: TicketStatus::Pending,
            valid: true,
            team_id: None,
            issued_at: Utc::now(),
        }
    }

    /// Associate the ticket with a team registration.
    #[must_use]
    pub fn for_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Stable ticket identifier.
    pub fn id(&self) -> &TicketId {
        &self.id
    }

    /// Holder of the ticket.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Event the ticket admits to.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Club hosting the event.
    pub fn club_id(&self) -> &ClubId {
        &self.club_id
    }

    /// Category of the hosting club.
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    /// Lifecycle state.
    pub fn status(&self) -> TicketStatus {
        self.status
    }

    /// Whether the ticket is currently honoured at the door.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Team this ticket was issued under, if any.
    pub fn team_id(&self) -> Option<&TeamId> {
        self.team_id.as_ref()
    }

    /// Issuance timestamp.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Display identity rendered as a QR image by clients.
    pub fn code(&self) -> TicketCode {
        TicketCode::derive(&self.id, &self.event_id, &self.category_id)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn ticket() -> Ticket {
        Ticket::issue(
            TicketId::random(),
            UserId::random(),
            EventId::random(),
            ClubId::random(),
            CategoryId::random(),
        )
    }

    #[test]
    fn issued_tickets_start_pending_and_valid() {
        let ticket = ticket();
        assert_eq!(ticket.status(), TicketStatus::Pending);
        assert!(ticket.is_valid());
        assert!(ticket.team_id().is_none());
    }

    #[test]
    fn codes_concatenate_ticket_event_and_category_ids() {
        let ticket = ticket();
        assert_eq!(
            ticket.code().to_string(),
            format!(
                "{}-{}-{}",
                ticket.id(),
                ticket.event_id(),
                ticket.category_id()
            )
        );
    }

    #[test]
    fn statuses_serialise_upper_case() {
        let value = serde_json::to_value(ticket()).expect("ticket should serialise");
        assert_eq!(value["status"], "PENDING");
        assert!(value.get("teamId").is_none());
    }
}
