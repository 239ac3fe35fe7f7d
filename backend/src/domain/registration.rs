//! Event registration service.
//!
//! Registration is where the event's mode and team-size bounds are enforced.
//! The store cannot check either, so this service is the single gate in
//! front of ticket issuance and team creation: nothing reaches the write
//! sequencer without passing it.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::domain::error::Error;
use crate::domain::events::{Event, Team, TeamValidationError, Ticket};
use crate::domain::ids::{CategoryId, ClubId, EventId, TeamId, TicketId, UserId};
use crate::domain::label::Label;
use crate::domain::ports::{DocumentStore, WriteSequencer};
use crate::domain::saga::SagaCommand;
use crate::domain::store::fields::EVENT_TEAM_IDS;
use crate::domain::store::{DocPath, Document};

/// Inputs for a team registration.
///
/// The caller supplies the team id so a failed registration can be retried
/// with the same identity and converge instead of duplicating.
#[derive(Debug, Clone)]
pub struct TeamSignup {
    /// Client-generated team identity.
    pub team_id: TeamId,
    /// Team name shown on the roster.
    pub name: Label,
    /// Leader responsible for the registration.
    pub leader_id: UserId,
    /// Distinct members, leader included.
    pub member_ids: Vec<UserId>,
    /// Client-generated ticket identity per member, aligned with
    /// `member_ids`.
    pub ticket_ids: Vec<TicketId>,
}

/// Registers users and teams for events.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn DocumentStore>,
    sequencer: Arc<dyn WriteSequencer>,
}

impl RegistrationService {
    /// Create a service over the store and sequencer ports.
    pub fn new(store: Arc<dyn DocumentStore>, sequencer: Arc<dyn WriteSequencer>) -> Self {
        Self { store, sequencer }
    }

    /// Issue an individual ticket for an event.
    ///
    /// # Errors
    ///
    /// Fails when the event is missing, does not accept individual entries,
    /// or the write sequence fails.
    pub async fn register_single(
        &self,
        category_id: &CategoryId,
        club_id: &ClubId,
        event_id: &EventId,
        user_id: &UserId,
        ticket_id: TicketId,
    ) -> Result<Ticket, Error> {
        let event = self.load_event(category_id, club_id, event_id).await?;
        if !event.mode().allows_single() {
            return Err(Error::conflict("event accepts team entries only"));
        }

        let ticket = Ticket::issue(
            ticket_id,
            user_id.clone(),
            event_id.clone(),
            club_id.clone(),
            category_id.clone(),
        );
        self.sequencer
            .execute(SagaCommand::IssueTicket {
                ticket: ticket.clone(),
            })
            .await
            .into_result()?;
        Ok(ticket)
    }

    /// Register a team and issue one ticket per member.
    ///
    /// The team document and its event link are written first; member
    /// tickets follow, one issuance sequence each. A failure part-way leaves
    /// the earlier tickets standing; re-running with the same ids converges,
    /// and the reconciler repairs any list drift in the interim.
    ///
    /// # Errors
    ///
    /// Fails when the event is missing or team-incapable, the roster is
    /// invalid, the size misses the event's bounds, or a write fails.
    pub async fn register_team(
        &self,
        category_id: &CategoryId,
        club_id: &ClubId,
        event_id: &EventId,
        signup: TeamSignup,
    ) -> Result<(Team, Vec<Ticket>), Error> {
        let event = self.load_event(category_id, club_id, event_id).await?;
        if !event.mode().allows_teams() {
            return Err(Error::conflict("event accepts individual entries only"));
        }
        if signup.ticket_ids.len() != signup.member_ids.len() {
            return Err(Error::invalid_request(
                "one ticket id per team member is required",
            ));
        }

        let team = Team::try_new(
            signup.team_id,
            event_id.clone(),
            signup.name,
            signup.leader_id,
            signup.member_ids,
        )
        .map_err(map_team_validation_error)?;

        let bounds = event
            .team_size()
            .ok_or_else(|| Error::internal("team-capable event without size bounds"))?;
        if !team.fits(bounds) {
            return Err(Error::invalid_request("team size is out of bounds")
                .with_details(json!({
                    "size": team.size(),
                    "min": bounds.min(),
                    "max": bounds.max(),
                })));
        }

        self.put_team(category_id, club_id, &team).await?;

        let mut tickets = Vec::with_capacity(team.size());
        for (member_id, ticket_id) in team.member_ids().iter().zip(signup.ticket_ids) {
            let ticket = Ticket::issue(
                ticket_id,
                member_id.clone(),
                event_id.clone(),
                club_id.clone(),
                category_id.clone(),
            )
            .for_team(team.id().clone());
            let report = self
                .sequencer
                .execute(SagaCommand::IssueTicket {
                    ticket: ticket.clone(),
                })
                .await;
            if !report.is_completed() {
                warn!(
                    team_id = %team.id(),
                    member_id = %member_id,
                    issued = tickets.len(),
                    "team registration aborted part-way through ticket issuance"
                );
            }
            report.into_result()?;
            tickets.push(ticket);
        }
        Ok((team, tickets))
    }

    /// Write the team document and link it into the event's roster.
    ///
    /// These two writes sit outside the sequencer's command set; the
    /// reconciler covers `teamIds` drift if the second write is lost.
    async fn put_team(
        &self,
        category_id: &CategoryId,
        club_id: &ClubId,
        team: &Team,
    ) -> Result<(), Error> {
        let path = DocPath::team(category_id, club_id, team.event_id(), team.id());
        let document = Document::from_entity(team)
            .map_err(|error| Error::internal(format!("team failed to serialise: {error}")))?;
        self.store
            .put(&path, &document)
            .await
            .map_err(|error| Error::service_unavailable(error.to_string()))?;
        self.store
            .append_to_list(
                &DocPath::event(category_id, club_id, team.event_id()),
                EVENT_TEAM_IDS,
                team.id().as_ref(),
            )
            .await
            .map_err(|error| Error::service_unavailable(error.to_string()))?;
        Ok(())
    }

    async fn load_event(
        &self,
        category_id: &CategoryId,
        club_id: &ClubId,
        event_id: &EventId,
    ) -> Result<Event, Error> {
        let path = DocPath::event(category_id, club_id, event_id);
        let document = self
            .store
            .get(&path)
            .await
            .map_err(|error| Error::service_unavailable(error.to_string()))?
            .ok_or_else(|| Error::not_found("event not found"))?;
        document
            .to_entity()
            .map_err(|error| Error::internal(format!("stored event is malformed: {error}")))
    }
}

fn map_team_validation_error(error: TeamValidationError) -> Error {
    match error {
        TeamValidationError::DuplicateMember => {
            Error::invalid_request("team members must be distinct")
        }
        TeamValidationError::LeaderNotMember => {
            Error::invalid_request("team leader must be one of the members")
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::events::{EventMode, TeamSizeBounds};
    use crate::domain::ports::{MockDocumentStore, MockWriteSequencer};
    use crate::domain::saga::{SagaCommandKind, SagaOutcome, SagaReport};
    use chrono::Utc;

    fn stored_event(mode: EventMode, bounds: Option<TeamSizeBounds>) -> (Event, Document) {
        let event = Event::try_new(
            EventId::random(),
            CategoryId::random(),
            ClubId::random(),
            Label::new("Autumn Rapid Open").expect("valid label"),
            Utc::now(),
            mode,
            bounds,
        )
        .expect("valid event");
        let document = Document::from_entity(&event).expect("event serialises");
        (event, document)
    }

    fn completed_report() -> SagaReport {
        SagaReport::new(SagaCommandKind::IssueTicket, Vec::new(), SagaOutcome::Completed)
    }

    fn service(
        store: MockDocumentStore,
        sequencer: MockWriteSequencer,
    ) -> RegistrationService {
        RegistrationService::new(Arc::new(store), Arc::new(sequencer))
    }

    #[tokio::test]
    async fn single_registration_issues_a_ticket() {
        let (event, document) = stored_event(EventMode::Single, None);
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(document.clone())));
        let mut sequencer = MockWriteSequencer::new();
        sequencer
            .expect_execute()
            .withf(|command| matches!(command, SagaCommand::IssueTicket { .. }))
            .times(1)
            .returning(|_| completed_report());

        let ticket = service(store, sequencer)
            .register_single(
                event.category_id(),
                event.club_id(),
                event.id(),
                &UserId::random(),
                TicketId::random(),
            )
            .await
            .expect("registration succeeds");
        assert_eq!(ticket.event_id(), event.id());
    }

    #[tokio::test]
    async fn single_registration_rejects_team_only_events() {
        let bounds = TeamSizeBounds::new(2, 4).expect("valid bounds");
        let (event, document) = stored_event(EventMode::Group, Some(bounds));
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(document.clone())));
        let sequencer = MockWriteSequencer::new();

        let error = service(store, sequencer)
            .register_single(
                event.category_id(),
                event.club_id(),
                event.id(),
                &UserId::random(),
                TicketId::random(),
            )
            .await
            .expect_err("mode violation must fail");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn team_registration_enforces_size_bounds() {
        let bounds = TeamSizeBounds::new(3, 5).expect("valid bounds");
        let (event, document) = stored_event(EventMode::Group, Some(bounds));
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(document.clone())));
        let sequencer = MockWriteSequencer::new();

        let leader = UserId::random();
        let members = vec![leader.clone(), UserId::random()];
        let signup = TeamSignup {
            team_id: TeamId::random(),
            name: Label::new("Knight Riders").expect("valid label"),
            leader_id: leader,
            ticket_ids: members.iter().map(|_| TicketId::random()).collect(),
            member_ids: members,
        };

        let error = service(store, sequencer)
            .register_team(event.category_id(), event.club_id(), event.id(), signup)
            .await
            .expect_err("undersized team must fail");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("bounds travel in details");
        assert_eq!(details["min"], 3);
        assert_eq!(details["size"], 2);
    }

    #[tokio::test]
    async fn team_registration_issues_one_ticket_per_member() {
        let bounds = TeamSizeBounds::new(2, 4).expect("valid bounds");
        let (event, document) = stored_event(EventMode::Both, Some(bounds));
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(document.clone())));
        store.expect_put().times(1).returning(|_, _| Ok(()));
        store
            .expect_append_to_list()
            .withf(|_, field, _| field == "teamIds")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut sequencer = MockWriteSequencer::new();
        sequencer
            .expect_execute()
            .times(2)
            .returning(|_| completed_report());

        let leader = UserId::random();
        let members = vec![leader.clone(), UserId::random()];
        let signup = TeamSignup {
            team_id: TeamId::random(),
            name: Label::new("Knight Riders").expect("valid label"),
            leader_id: leader,
            ticket_ids: members.iter().map(|_| TicketId::random()).collect(),
            member_ids: members,
        };

        let (team, tickets) = service(store, sequencer)
            .register_team(event.category_id(), event.club_id(), event.id(), signup)
            .await
            .expect("registration succeeds");
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|ticket| ticket.team_id() == Some(team.id())));
    }
}
