//! Event aggregate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{CategoryId, ClubId, EventId, TeamId, TicketId, UserId};
use crate::domain::label::Label;

/// Validation errors raised by event constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    /// Team bounds were supplied with a zero minimum or inverted range.
    InvalidTeamBounds,
    /// A team-capable mode was requested without team size bounds.
    MissingTeamBounds,
    /// Team bounds were supplied for a single-entry event.
    UnexpectedTeamBounds,
}

impl fmt::Display for EventValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTeamBounds => {
                write!(f, "team size bounds must satisfy 1 <= min <= max")
            }
            Self::MissingTeamBounds => {
                write!(f, "group events must declare team size bounds")
            }
            Self::UnexpectedTeamBounds => {
                write!(f, "single-entry events must not declare team size bounds")
            }
        }
    }
}

impl std::error::Error for EventValidationError {}

/// How participants may register for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventMode {
    /// Individual sign-up only.
    Single,
    /// Team sign-up only.
    Group,
    /// Individual and team sign-up are both open.
    Both,
}

impl EventMode {
    /// Whether individual registration is open.
    pub fn allows_single(self) -> bool {
        matches!(self, Self::Single | Self::Both)
    }

    /// Whether team registration is open.
    pub fn allows_teams(self) -> bool {
        matches!(self, Self::Group | Self::Both)
    }
}

/// Inclusive team size range for team-capable events.
///
/// ## Invariants
/// - `1 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "TeamSizeBoundsDto", into = "TeamSizeBoundsDto")]
pub struct TeamSizeBounds {
    min: u32,
    max: u32,
}

impl TeamSizeBounds {
    /// Validate and construct a bounds pair.
    ///
    /// # Errors
    ///
    /// Returns [`EventValidationError::InvalidTeamBounds`] when `min` is zero
    /// or greater than `max`.
    pub fn new(min: u32, max: u32) -> Result<Self, EventValidationError> {
        if min == 0 || min > max {
            return Err(EventValidationError::InvalidTeamBounds);
        }
        Ok(Self { min, max })
    }

    /// Smallest accepted team size.
    pub fn min(self) -> u32 {
        self.min
    }

    /// Largest accepted team size.
    pub fn max(self) -> u32 {
        self.max
    }

    /// Whether a team of `size` members satisfies the bounds.
    pub fn admits(self, size: usize) -> bool {
        usize::try_from(self.min).is_ok_and(|min| size >= min)
            && usize::try_from(self.max).is_ok_and(|max| size <= max)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct TeamSizeBoundsDto {
    min: u32,
    max: u32,
}

impl From<TeamSizeBounds> for TeamSizeBoundsDto {
    fn from(value: TeamSizeBounds) -> Self {
        Self {
            min: value.min,
            max: value.max,
        }
    }
}

impl TryFrom<TeamSizeBoundsDto> for TeamSizeBounds {
    type Error = EventValidationError;

    fn try_from(value: TeamSizeBoundsDto) -> Result<Self, Self::Error> {
        Self::new(value.min, value.max)
    }
}

/// Event hosted by a club.
///
/// Carries denormalised `ticketIds` and `teamIds` lists mirrored from the
/// authoritative `Tickets` and `Teams` sub-collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: EventId,
    #[schema(value_type = String)]
    category_id: CategoryId,
    #[schema(value_type = String)]
    club_id: ClubId,
    #[schema(value_type = String, example = "Autumn Rapid Open")]
    name: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    starts_at: DateTime<Utc>,
    mode: EventMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    team_size: Option<TeamSizeBounds>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    organiser_ids: Vec<UserId>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    ticket_ids: Vec<TicketId>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    team_ids: Vec<TeamId>,
}

impl Event {
    /// Validate and construct an event.
    ///
    /// # Errors
    ///
    /// Returns an [`EventValidationError`] when the mode and team bounds
    /// disagree: team-capable modes require bounds, single-entry events must
    /// not carry them.
    pub fn try_new(
        id: EventId,
        category_id: CategoryId,
        club_id: ClubId,
        name: Label,
        starts_at: DateTime<Utc>,
        mode: EventMode,
        team_size: Option<TeamSizeBounds>,
    ) -> Result<Self, EventValidationError> {
        match (mode.allows_teams(), team_size) {
            (true, None) => return Err(EventValidationError::MissingTeamBounds),
            (false, Some(_)) => return Err(EventValidationError::UnexpectedTeamBounds),
            _ => {}
        }
        Ok(Self {
            id,
            category_id,
            club_id,
            name,
            description: None,
            starts_at,
            mode,
            team_size,
            organiser_ids: Vec::new(),
            ticket_ids: Vec::new(),
            team_ids: Vec::new(),
        })
    }

    /// Attach a free-form description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record the organisers of the event.
    #[must_use]
    pub fn with_organisers(mut self, organisers: Vec<UserId>) -> Self {
        self.organiser_ids = organisers;
        self
    }

    /// Stable event identifier.
    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Category the hosting club belongs to.
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    /// Club hosting the event.
    pub fn club_id(&self) -> &ClubId {
        &self.club_id
    }

    /// Event name.
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Scheduled start time.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// Registration mode.
    pub fn mode(&self) -> EventMode {
        self.mode
    }

    /// Team size bounds; present exactly when the mode allows teams.
    pub fn team_size(&self) -> Option<TeamSizeBounds> {
        self.team_size
    }

    /// Organiser user ids.
    pub fn organiser_ids(&self) -> &[UserId] {
        &self.organiser_ids
    }

    /// Denormalised ticket id list.
    pub fn ticket_ids(&self) -> &[TicketId] {
        &self.ticket_ids
    }

    /// Denormalised team id list.
    pub fn team_ids(&self) -> &[TeamId] {
        &self.team_ids
    }
}
