//! Team aggregate for group event sign-up.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::events::event::TeamSizeBounds;
use crate::domain::ids::{EventId, TeamId, UserId};
use crate::domain::label::Label;

/// Validation errors raised by [`Team::try_new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamValidationError {
    /// The member list contained the same user twice.
    DuplicateMember,
    /// The leader did not appear in the member list.
    LeaderNotMember,
}

impl fmt::Display for TeamValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateMember => write!(f, "team members must be distinct"),
            Self::LeaderNotMember => write!(f, "team leader must be one of the members"),
        }
    }
}

impl std::error::Error for TeamValidationError {}

/// Team registered for a group-capable event.
///
/// ## Invariants
/// - Members are distinct and include the leader.
/// - Whether the size fits the owning event's bounds is checked by the
///   registration service, which is the only writer of team documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: TeamId,
    #[schema(value_type = String)]
    event_id: EventId,
    #[schema(value_type = String, example = "Knight Riders")]
    name: Label,
    #[schema(value_type = String)]
    leader_id: UserId,
    #[schema(value_type = Vec<String>)]
    member_ids: Vec<UserId>,
}

impl Team {
    /// Validate and construct a team.
    ///
    /// # Errors
    ///
    /// Returns a [`TeamValidationError`] when members repeat or the leader is
    /// not among them.
    pub fn try_new(
        id: TeamId,
        event_id: EventId,
        name: Label,
        leader_id: UserId,
        member_ids: Vec<UserId>,
    ) -> Result<Self, TeamValidationError> {
        let distinct: HashSet<&UserId> = member_ids.iter().collect();
        if distinct.len() != member_ids.len() {
            return Err(TeamValidationError::DuplicateMember);
        }
        if !distinct.contains(&leader_id) {
            return Err(TeamValidationError::LeaderNotMember);
        }
        Ok(Self {
            id,
            event_id,
            name,
            leader_id,
            member_ids,
        })
    }

    /// Stable team identifier.
    pub fn id(&self) -> &TeamId {
        &self.id
    }

    /// Event the team registered for.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Team name shown on the roster.
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Leader responsible for the registration.
    pub fn leader_id(&self) -> &UserId {
        &self.leader_id
    }

    /// Distinct member list, leader included.
    pub fn member_ids(&self) -> &[UserId] {
        &self.member_ids
    }

    /// Number of members.
    pub fn size(&self) -> usize {
        self.member_ids.len()
    }

    /// Whether the team size satisfies the given bounds.
    pub fn fits(&self, bounds: TeamSizeBounds) -> bool {
        bounds.admits(self.size())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn team_of(members: Vec<UserId>, leader: UserId) -> Result<Team, TeamValidationError> {
        Team::try_new(
            TeamId::random(),
            EventId::random(),
            Label::new("Knight Riders").expect("valid label"),
            leader,
            members,
        )
    }

    #[test]
    fn leaders_must_be_members() {
        let leader = UserId::random();
        assert_eq!(
            team_of(vec![UserId::random()], leader.clone()).map(|_| ()),
            Err(TeamValidationError::LeaderNotMember)
        );
        assert!(team_of(vec![leader.clone(), UserId::random()], leader).is_ok());
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let leader = UserId::random();
        assert_eq!(
            team_of(vec![leader.clone(), leader.clone()], leader).map(|_| ()),
            Err(TeamValidationError::DuplicateMember)
        );
    }

    #[test]
    fn size_checks_delegate_to_event_bounds() {
        let leader = UserId::random();
        let team = team_of(vec![leader.clone(), UserId::random()], leader)
            .expect("two distinct members");
        let bounds = TeamSizeBounds::new(2, 4).expect("valid bounds");
        assert!(team.fits(bounds));
        let tight = TeamSizeBounds::new(3, 4).expect("valid bounds");
        assert!(!team.fits(tight));
    }
}
