//! Generated dataset types.
//!
//! These types are independent of backend domain types to avoid circular
//! dependencies; the backend converts them at the point of use.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration mode for a generated event.
///
/// Mirrors the backend's `EventMode` enum without creating a dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventModeSeed {
    /// Individual sign-up only.
    #[default]
    Single,
    /// Team sign-up only.
    Group,
    /// Individual and team sign-up are both open.
    Both,
}

/// A generated event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSeed {
    /// Unique identifier for the event.
    pub id: Uuid,
    /// Event name.
    pub name: String,
    /// Registration mode.
    pub mode: EventModeSeed,
    /// Inclusive team size bounds for team-capable modes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_size: Option<(u32, u32)>,
}

/// A generated club record with its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSeed {
    /// Unique identifier for the club.
    pub id: Uuid,
    /// Club name.
    pub name: String,
    /// Short description shown in the catalogue.
    pub description: String,
    /// Events hosted by the club.
    pub events: Vec<EventSeed>,
}

/// A generated category record with its clubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySeed {
    /// Unique identifier for the category.
    pub id: Uuid,
    /// Category name.
    pub name: String,
    /// Clubs grouped under the category.
    pub clubs: Vec<ClubSeed>,
}

/// A generated example user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleUserSeed {
    /// Unique identifier for the user.
    pub id: Uuid,
    /// Human-readable display name satisfying backend constraints.
    pub display_name: String,
    /// Deterministic, unique email address.
    pub email: String,
}

/// Complete generated dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleDataSet {
    /// Category tree, clubs and events included.
    pub categories: Vec<CategorySeed>,
    /// User accounts.
    pub users: Vec<ExampleUserSeed>,
}
