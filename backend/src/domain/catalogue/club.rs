//! Club aggregate and membership records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{CategoryId, ClubId, EventId, UserId};
use crate::domain::label::Label;

/// Whether a club is browsable by non-members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone may discover and join the club.
    Public,
    /// The club is hidden from the public catalogue.
    Private,
}

/// Role a member holds inside one club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClubRole {
    /// Club creator; exactly one per club.
    Owner,
    /// May manage events and members.
    Admin,
    /// May moderate chats and event sign-ups.
    Moderator,
    /// Regular member.
    Member,
}

/// Per-user membership record stored in a club's `Members` sub-collection.
///
/// The sub-collection is authoritative; the club's `memberIds` list is a
/// denormalised mirror of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[schema(value_type = String)]
    user_id: UserId,
    role: ClubRole,
    joined_at: DateTime<Utc>,
}

impl Membership {
    /// Record a user joining with the given role, stamped now.
    pub fn new(user_id: UserId, role: ClubRole) -> Self {
        Self {
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    /// Member this record belongs to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Role held inside the club.
    pub fn role(&self) -> ClubRole {
        self.role
    }

    /// When the member joined.
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }
}

/// Club belonging to exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: ClubId,
    #[schema(value_type = String)]
    category_id: CategoryId,
    #[schema(value_type = String, example = "Chess Society")]
    name: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    visibility: Visibility,
    /// Denormalised mirror of the `Members` sub-collection.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    member_ids: Vec<UserId>,
    /// Denormalised mirror of the `Events` sub-collection.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    event_ids: Vec<EventId>,
}

impl Club {
    /// Build a new club with empty reference lists.
    pub fn new(id: ClubId, category_id: CategoryId, name: Label, visibility: Visibility) -> Self {
        Self {
            id,
            category_id,
            name,
            description: None,
            visibility,
            member_ids: Vec::new(),
            event_ids: Vec::new(),
        }
    }

    /// Attach a free-form description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Stable club identifier.
    pub fn id(&self) -> &ClubId {
        &self.id
    }

    /// Category this club belongs to.
    pub fn category_id(&self) -> &CategoryId {
        &self.category_id
    }

    /// Club name shown in the catalogue.
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Optional free-form description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Catalogue visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Denormalised member id list.
    pub fn member_ids(&self) -> &[UserId] {
        &self.member_ids
    }

    /// Denormalised event id list.
    pub fn event_ids(&self) -> &[EventId] {
        &self.event_ids
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn club() -> Club {
        Club::new(
            ClubId::random(),
            CategoryId::random(),
            Label::new("Chess Society").expect("valid label"),
            Visibility::Public,
        )
    }

    #[test]
    fn clubs_serialise_roles_and_visibility_with_expected_casing() {
        let membership = Membership::new(UserId::random(), ClubRole::Moderator);
        let value = serde_json::to_value(&membership).expect("membership should serialise");
        assert_eq!(value["role"], "MODERATOR");

        let value = serde_json::to_value(club()).expect("club should serialise");
        assert_eq!(value["visibility"], "public");
        assert!(value.get("memberIds").is_some());
    }

    #[test]
    fn absent_descriptions_are_omitted_from_the_wire_form() {
        let value = serde_json::to_value(club()).expect("club should serialise");
        assert!(value.get("description").is_none());

        let described = club().with_description("casual and competitive play");
        let value = serde_json::to_value(described).expect("club should serialise");
        assert_eq!(value["description"], "casual and competitive play");
    }
}
