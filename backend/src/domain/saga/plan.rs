//! Lowering of saga commands into ordered write plans.
//!
//! A plan is purely descriptive: each step names one store write, and the
//! runner derives the matching compensation from the state it observes just
//! before applying the write. Keeping the lowering free of I/O makes the
//! exact write order of every command a unit-testable fact.

use crate::domain::ports::RemoteStoreError;
use crate::domain::store::fields::{
    CATEGORY_CLUB_IDS, CLUB_EVENT_IDS, EVENT_TICKET_IDS, USER_CLUBS, USER_TICKETS,
};
use crate::domain::store::{DocPath, Document};

use super::SagaCommand;

/// One store write inside a plan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoreWrite {
    /// Upsert a document.
    Put { path: DocPath, document: Document },
    /// Delete a document.
    Delete { path: DocPath },
    /// Add an id to a list field (set semantics).
    AppendToList {
        path: DocPath,
        field: &'static str,
        value: String,
    },
    /// Remove an id from a list field.
    RemoveFromList {
        path: DocPath,
        field: &'static str,
        value: String,
    },
}

/// Named step of a plan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlannedStep {
    pub(crate) name: &'static str,
    pub(crate) write: StoreWrite,
}

fn put(name: &'static str, path: DocPath, document: Document) -> PlannedStep {
    PlannedStep {
        name,
        write: StoreWrite::Put { path, document },
    }
}

fn delete(name: &'static str, path: DocPath) -> PlannedStep {
    PlannedStep {
        name,
        write: StoreWrite::Delete { path },
    }
}

fn append(name: &'static str, path: DocPath, field: &'static str, value: String) -> PlannedStep {
    PlannedStep {
        name,
        write: StoreWrite::AppendToList { path, field, value },
    }
}

fn remove(name: &'static str, path: DocPath, field: &'static str, value: String) -> PlannedStep {
    PlannedStep {
        name,
        write: StoreWrite::RemoveFromList { path, field, value },
    }
}

/// Lower a command into its ordered steps.
///
/// Fails only when an entity refuses to serialise, which surfaces as a codec
/// error before any remote call is made.
pub(crate) fn plan(command: &SagaCommand) -> Result<Vec<PlannedStep>, RemoteStoreError> {
    match command {
        SagaCommand::CreateClub { club } => {
            let club_doc = Document::from_entity(club)
                .map_err(|error| RemoteStoreError::codec(error.to_string()))?;
            Ok(vec![
                put(
                    "put club document",
                    DocPath::club(club.category_id(), club.id()),
                    club_doc,
                ),
                append(
                    "link club into category",
                    DocPath::category(club.category_id()),
                    CATEGORY_CLUB_IDS,
                    club.id().to_string(),
                ),
            ])
        }
        SagaCommand::CreateEvent { event } => {
            let event_doc = Document::from_entity(event)
                .map_err(|error| RemoteStoreError::codec(error.to_string()))?;
            Ok(vec![
                put(
                    "put event document",
                    DocPath::event(event.category_id(), event.club_id(), event.id()),
                    event_doc,
                ),
                append(
                    "link event into club",
                    DocPath::club(event.category_id(), event.club_id()),
                    CLUB_EVENT_IDS,
                    event.id().to_string(),
                ),
            ])
        }
        SagaCommand::DeleteClub {
            category_id,
            club_id,
        } => Ok(vec![
            delete("delete club document", DocPath::club(category_id, club_id)),
            remove(
                "unlink club from category",
                DocPath::category(category_id),
                CATEGORY_CLUB_IDS,
                club_id.to_string(),
            ),
        ]),
        SagaCommand::JoinClub {
            category_id,
            club_id,
            membership,
        } => {
            let membership_doc = Document::from_entity(membership)
                .map_err(|error| RemoteStoreError::codec(error.to_string()))?;
            Ok(vec![
                put(
                    "put membership record",
                    DocPath::membership(category_id, club_id, membership.user_id()),
                    membership_doc,
                ),
                append(
                    "add club to user list",
                    DocPath::user(membership.user_id()),
                    USER_CLUBS,
                    club_id.to_string(),
                ),
            ])
        }
        SagaCommand::LeaveClub {
            category_id,
            club_id,
            user_id,
        } => Ok(vec![
            delete(
                "delete membership record",
                DocPath::membership(category_id, club_id, user_id),
            ),
            remove(
                "remove club from user list",
                DocPath::user(user_id),
                USER_CLUBS,
                club_id.to_string(),
            ),
        ]),
        SagaCommand::IssueTicket { ticket } => {
            let ticket_doc = Document::from_entity(ticket)
                .map_err(|error| RemoteStoreError::codec(error.to_string()))?;
            Ok(vec![
                put(
                    "put ticket under user",
                    DocPath::user_ticket(ticket.user_id(), ticket.id()),
                    ticket_doc.clone(),
                ),
                put(
                    "put ticket under event",
                    DocPath::event_ticket(
                        ticket.category_id(),
                        ticket.club_id(),
                        ticket.event_id(),
                        ticket.id(),
                    ),
                    ticket_doc,
                ),
                append(
                    "link ticket into event",
                    DocPath::event(ticket.category_id(), ticket.club_id(), ticket.event_id()),
                    EVENT_TICKET_IDS,
                    ticket.id().to_string(),
                ),
                append(
                    "link ticket into user",
                    DocPath::user(ticket.user_id()),
                    USER_TICKETS,
                    ticket.id().to_string(),
                ),
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::catalogue::{Club, ClubRole, Membership, Visibility};
    use crate::domain::events::Ticket;
    use crate::domain::ids::{CategoryId, ClubId, EventId, TicketId, UserId};
    use crate::domain::label::Label;
    use crate::domain::saga::SagaCommand;

    #[test]
    fn issue_ticket_plans_four_writes_in_documented_order() {
        let ticket = Ticket::issue(
            TicketId::random(),
            UserId::random(),
            EventId::random(),
            ClubId::random(),
            CategoryId::random(),
        );
        let steps = plan(&SagaCommand::IssueTicket {
            ticket: ticket.clone(),
        })
        .expect("plan should lower");

        let names: Vec<&str> = steps.iter().map(|step| step.name).collect();
        assert_eq!(
            names,
            vec![
                "put ticket under user",
                "put ticket under event",
                "link ticket into event",
                "link ticket into user",
            ]
        );

        match steps.first().map(|step| &step.write) {
            Some(StoreWrite::Put { path, .. }) => {
                assert_eq!(
                    path.to_string(),
                    format!("Users/{}/Tickets/{}", ticket.user_id(), ticket.id())
                );
            }
            other => panic!("first step should put under the user, got {other:?}"),
        }
    }

    #[test]
    fn join_and_leave_plans_mirror_each_other() {
        let category_id = CategoryId::random();
        let club_id = ClubId::random();
        let membership = Membership::new(UserId::random(), ClubRole::Member);
        let user_id = membership.user_id().clone();

        let join = plan(&SagaCommand::JoinClub {
            category_id: category_id.clone(),
            club_id: club_id.clone(),
            membership,
        })
        .expect("join should lower");
        let leave = plan(&SagaCommand::LeaveClub {
            category_id,
            club_id: club_id.clone(),
            user_id,
        })
        .expect("leave should lower");

        assert!(matches!(
            join.first().map(|step| &step.write),
            Some(StoreWrite::Put { .. })
        ));
        assert!(matches!(
            leave.first().map(|step| &step.write),
            Some(StoreWrite::Delete { .. })
        ));
        match (join.get(1), leave.get(1)) {
            (
                Some(PlannedStep {
                    write: StoreWrite::AppendToList { field, value, .. },
                    ..
                }),
                Some(PlannedStep {
                    write:
                        StoreWrite::RemoveFromList {
                            field: leave_field,
                            value: leave_value,
                            ..
                        },
                    ..
                }),
            ) => {
                assert_eq!(field, leave_field);
                assert_eq!(value, leave_value);
                assert_eq!(*field, USER_CLUBS);
                assert_eq!(value, &club_id.to_string());
            }
            other => panic!("second steps should mutate the user list, got {other:?}"),
        }
    }

    #[test]
    fn create_club_links_into_the_category_second() {
        let club = Club::new(
            ClubId::random(),
            CategoryId::random(),
            Label::new("Chess Society").expect("valid label"),
            Visibility::Public,
        );
        let steps =
            plan(&SagaCommand::CreateClub { club: club.clone() }).expect("plan should lower");
        assert_eq!(steps.len(), 2);
        match steps.get(1).map(|step| &step.write) {
            Some(StoreWrite::AppendToList { path, field, value }) => {
                assert_eq!(path.to_string(), format!("Categories/{}", club.category_id()));
                assert_eq!(*field, CATEGORY_CLUB_IDS);
                assert_eq!(value, &club.id().to_string());
            }
            other => panic!("second step should link the club, got {other:?}"),
        }
    }
}
