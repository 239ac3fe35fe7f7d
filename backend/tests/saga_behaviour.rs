//! Behavioural coverage for the write sequencer against the in-memory store.

use std::sync::Arc;

use backend::domain::ports::{DocumentStore, RemoteStoreError};
use backend::domain::{
    Category, CategoryId, Club, ClubId, ClubRole, DisplayName, DocPath, Document, EmailAddress,
    Event, EventId, EventMode, Label, Membership, RetryPolicy, Role, SagaCommand, SagaOutcome,
    SagaRunner, StepStatus, Ticket, TicketId, User, UserId, Visibility,
};
use backend::outbound::store::{MemoryDocumentStore, StoreFault};
use chrono::Utc;

struct Fixture {
    store: Arc<MemoryDocumentStore>,
    runner: SagaRunner,
    category_id: CategoryId,
    club_id: ClubId,
    event_id: EventId,
    user_id: UserId,
}

async fn put_entity<T: serde::Serialize>(store: &MemoryDocumentStore, path: &DocPath, entity: &T) {
    let document = Document::from_entity(entity).expect("entity serialises");
    store.put(path, &document).await.expect("seed write succeeds");
}

/// Store pre-populated with one category, club, event, and user.
async fn fixture() -> Fixture {
    let store = Arc::new(MemoryDocumentStore::new());
    let runner = SagaRunner::new(store.clone() as Arc<dyn DocumentStore>)
        .with_retry(RetryPolicy::none());

    let category = Category::new(
        CategoryId::random(),
        Label::new("Sports").expect("valid label"),
    );
    let club = Club::new(
        ClubId::random(),
        category.id().clone(),
        Label::new("Chess Society").expect("valid label"),
        Visibility::Public,
    );
    let event = Event::try_new(
        EventId::random(),
        category.id().clone(),
        club.id().clone(),
        Label::new("Autumn Rapid Open").expect("valid label"),
        Utc::now(),
        EventMode::Single,
        None,
    )
    .expect("valid event");
    let user = User::new(
        UserId::random(),
        DisplayName::new("Ada Lovelace").expect("valid name"),
        EmailAddress::new("ada@clubhub.example").expect("valid email"),
        Role::Member,
    );

    put_entity(&store, &DocPath::category(category.id()), &category).await;
    put_entity(&store, &DocPath::club(category.id(), club.id()), &club).await;
    put_entity(
        &store,
        &DocPath::event(category.id(), club.id(), event.id()),
        &event,
    )
    .await;
    put_entity(&store, &DocPath::user(user.id()), &user).await;

    Fixture {
        category_id: category.id().clone(),
        club_id: club.id().clone(),
        event_id: event.id().clone(),
        user_id: user.id().clone(),
        store,
        runner,
    }
}

fn issue_ticket_command(fixture: &Fixture, ticket_id: TicketId) -> SagaCommand {
    SagaCommand::IssueTicket {
        ticket: Ticket::issue(
            ticket_id,
            fixture.user_id.clone(),
            fixture.event_id.clone(),
            fixture.club_id.clone(),
            fixture.category_id.clone(),
        ),
    }
}

async fn list_field(store: &MemoryDocumentStore, path: &DocPath, field: &str) -> Vec<String> {
    store
        .get(path)
        .await
        .expect("get succeeds")
        .expect("document exists")
        .list_field(field)
}

#[tokio::test]
async fn issue_ticket_applies_all_four_writes() {
    let fixture = fixture().await;
    let ticket_id = TicketId::random();

    let report = fixture
        .runner
        .run(issue_ticket_command(&fixture, ticket_id.clone()))
        .await;
    assert!(report.is_completed());

    let user_ticket = DocPath::user_ticket(&fixture.user_id, &ticket_id);
    let event_ticket = DocPath::event_ticket(
        &fixture.category_id,
        &fixture.club_id,
        &fixture.event_id,
        &ticket_id,
    );
    assert!(
        fixture
            .store
            .get(&user_ticket)
            .await
            .expect("get succeeds")
            .is_some()
    );
    assert!(
        fixture
            .store
            .get(&event_ticket)
            .await
            .expect("get succeeds")
            .is_some()
    );

    let event_path = DocPath::event(&fixture.category_id, &fixture.club_id, &fixture.event_id);
    assert_eq!(
        list_field(&fixture.store, &event_path, "ticketIds").await,
        vec![ticket_id.to_string()]
    );
    assert_eq!(
        list_field(&fixture.store, &DocPath::user(&fixture.user_id), "tickets").await,
        vec![ticket_id.to_string()]
    );
}

#[tokio::test]
async fn issue_ticket_failure_at_step_three_reverses_the_first_two_writes() {
    let fixture = fixture().await;
    let ticket_id = TicketId::random();
    let event_path = DocPath::event(&fixture.category_id, &fixture.club_id, &fixture.event_id);

    fixture
        .store
        .inject(StoreFault::append(
            &event_path,
            RemoteStoreError::operation("permission denied"),
        ))
        .await;

    let report = fixture
        .runner
        .run(issue_ticket_command(&fixture, ticket_id.clone()))
        .await;
    match report.outcome() {
        SagaOutcome::Failed {
            step, unreversed, ..
        } => {
            assert_eq!(*step, 3);
            assert!(unreversed.is_empty());
        }
        other => panic!("expected failure at step three, got {other:?}"),
    }
    let statuses: Vec<StepStatus> = report.steps().iter().map(|record| record.status).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Compensated,
            StepStatus::Compensated,
            StepStatus::Failed,
            StepStatus::Skipped,
        ]
    );

    // Compensation removed both ticket documents and step four never ran.
    let user_ticket = DocPath::user_ticket(&fixture.user_id, &ticket_id);
    assert!(
        fixture
            .store
            .get(&user_ticket)
            .await
            .expect("get succeeds")
            .is_none()
    );
    assert!(
        list_field(&fixture.store, &DocPath::user(&fixture.user_id), "tickets")
            .await
            .is_empty()
    );
    assert!(
        list_field(&fixture.store, &event_path, "ticketIds")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn failed_compensation_leaves_committed_steps_and_reports_them() {
    let fixture = fixture().await;
    let ticket_id = TicketId::random();
    let event_path = DocPath::event(&fixture.category_id, &fixture.club_id, &fixture.event_id);
    let user_ticket = DocPath::user_ticket(&fixture.user_id, &ticket_id);
    let event_ticket = DocPath::event_ticket(
        &fixture.category_id,
        &fixture.club_id,
        &fixture.event_id,
        &ticket_id,
    );

    fixture
        .store
        .inject(StoreFault::append(
            &event_path,
            RemoteStoreError::operation("permission denied"),
        ))
        .await;
    // Both compensating deletes fail as well, so the first two writes stay.
    fixture
        .store
        .inject(StoreFault::delete(
            &user_ticket,
            RemoteStoreError::operation("delete rejected"),
        ))
        .await;
    fixture
        .store
        .inject(StoreFault::delete(
            &event_ticket,
            RemoteStoreError::operation("delete rejected"),
        ))
        .await;

    let report = fixture
        .runner
        .run(issue_ticket_command(&fixture, ticket_id.clone()))
        .await;
    match report.outcome() {
        SagaOutcome::Failed {
            step, unreversed, ..
        } => {
            assert_eq!(*step, 3);
            assert_eq!(unreversed, &vec![1, 2]);
        }
        other => panic!("expected failure at step three, got {other:?}"),
    }

    assert!(
        fixture
            .store
            .get(&user_ticket)
            .await
            .expect("get succeeds")
            .is_some()
    );
    assert!(
        fixture
            .store
            .get(&event_ticket)
            .await
            .expect("get succeeds")
            .is_some()
    );
    // Step four never ran.
    assert!(
        list_field(&fixture.store, &DocPath::user(&fixture.user_id), "tickets")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn rerunning_a_failed_sequence_converges_without_duplicates() {
    let fixture = fixture().await;
    let ticket_id = TicketId::random();
    let event_path = DocPath::event(&fixture.category_id, &fixture.club_id, &fixture.event_id);
    let user_ticket = DocPath::user_ticket(&fixture.user_id, &ticket_id);
    let event_ticket = DocPath::event_ticket(
        &fixture.category_id,
        &fixture.club_id,
        &fixture.event_id,
        &ticket_id,
    );

    // First run fails at step three and cannot reverse its committed writes.
    for fault in [
        StoreFault::append(
            &event_path,
            RemoteStoreError::operation("permission denied"),
        ),
        StoreFault::delete(&user_ticket, RemoteStoreError::operation("delete rejected")),
        StoreFault::delete(&event_ticket, RemoteStoreError::operation("delete rejected")),
    ] {
        fixture.store.inject(fault).await;
    }
    let first = fixture
        .runner
        .run(issue_ticket_command(&fixture, ticket_id.clone()))
        .await;
    assert!(!first.is_completed());

    // Re-running from scratch with the same ids converges on the state a
    // single successful run would have produced.
    let second = fixture
        .runner
        .run(issue_ticket_command(&fixture, ticket_id.clone()))
        .await;
    assert!(second.is_completed());

    assert_eq!(
        list_field(&fixture.store, &event_path, "ticketIds").await,
        vec![ticket_id.to_string()]
    );
    assert_eq!(
        list_field(&fixture.store, &DocPath::user(&fixture.user_id), "tickets").await,
        vec![ticket_id.to_string()]
    );
}

#[tokio::test]
async fn create_club_links_the_category() {
    let fixture = fixture().await;
    let club = Club::new(
        ClubId::random(),
        fixture.category_id.clone(),
        Label::new("Robotics Circle").expect("valid label"),
        Visibility::Public,
    );

    let report = fixture
        .runner
        .run(SagaCommand::CreateClub { club: club.clone() })
        .await;
    assert!(report.is_completed());

    let clubs = list_field(
        &fixture.store,
        &DocPath::category(&fixture.category_id),
        "clubIds",
    )
    .await;
    assert!(clubs.contains(&club.id().to_string()));
}

#[tokio::test]
async fn create_club_into_a_missing_category_rolls_back_the_club_document() {
    let store = Arc::new(MemoryDocumentStore::new());
    let runner = SagaRunner::new(store.clone() as Arc<dyn DocumentStore>)
        .with_retry(RetryPolicy::none());
    let club = Club::new(
        ClubId::random(),
        CategoryId::random(),
        Label::new("Orphan Club").expect("valid label"),
        Visibility::Public,
    );
    let club_path = DocPath::club(club.category_id(), club.id());

    let report = runner.run(SagaCommand::CreateClub { club: club.clone() }).await;
    match report.outcome() {
        SagaOutcome::Failed { step, .. } => assert_eq!(*step, 2),
        other => panic!("expected failure at step two, got {other:?}"),
    }
    // The club document from step one was compensated away.
    assert!(store.get(&club_path).await.expect("get succeeds").is_none());
}

#[tokio::test]
async fn delete_club_removes_the_document_and_the_category_link() {
    let fixture = fixture().await;
    let club_path = DocPath::club(&fixture.category_id, &fixture.club_id);
    let category_path = DocPath::category(&fixture.category_id);
    fixture
        .store
        .append_to_list(&category_path, "clubIds", fixture.club_id.as_ref())
        .await
        .expect("seed link succeeds");

    let report = fixture
        .runner
        .run(SagaCommand::DeleteClub {
            category_id: fixture.category_id.clone(),
            club_id: fixture.club_id.clone(),
        })
        .await;
    assert!(report.is_completed());
    assert!(
        fixture
            .store
            .get(&club_path)
            .await
            .expect("get succeeds")
            .is_none()
    );
    assert!(
        list_field(&fixture.store, &category_path, "clubIds")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn create_event_links_the_club() {
    let fixture = fixture().await;
    let event = Event::try_new(
        EventId::random(),
        fixture.category_id.clone(),
        fixture.club_id.clone(),
        Label::new("Winter Showcase").expect("valid label"),
        Utc::now(),
        EventMode::Single,
        None,
    )
    .expect("valid event");

    let report = fixture
        .runner
        .run(SagaCommand::CreateEvent {
            event: event.clone(),
        })
        .await;
    assert!(report.is_completed());

    let events = list_field(
        &fixture.store,
        &DocPath::club(&fixture.category_id, &fixture.club_id),
        "eventIds",
    )
    .await;
    assert!(events.contains(&event.id().to_string()));
}

#[tokio::test]
async fn join_then_leave_is_a_net_no_op() {
    let fixture = fixture().await;
    let membership_path =
        DocPath::membership(&fixture.category_id, &fixture.club_id, &fixture.user_id);

    let join = fixture
        .runner
        .run(SagaCommand::JoinClub {
            category_id: fixture.category_id.clone(),
            club_id: fixture.club_id.clone(),
            membership: Membership::new(fixture.user_id.clone(), ClubRole::Member),
        })
        .await;
    assert!(join.is_completed());
    assert!(
        fixture
            .store
            .get(&membership_path)
            .await
            .expect("get succeeds")
            .is_some()
    );
    assert_eq!(
        list_field(&fixture.store, &DocPath::user(&fixture.user_id), "clubs").await,
        vec![fixture.club_id.to_string()]
    );

    let leave = fixture
        .runner
        .run(SagaCommand::LeaveClub {
            category_id: fixture.category_id.clone(),
            club_id: fixture.club_id.clone(),
            user_id: fixture.user_id.clone(),
        })
        .await;
    assert!(leave.is_completed());
    assert!(
        fixture
            .store
            .get(&membership_path)
            .await
            .expect("get succeeds")
            .is_none()
    );
    assert!(
        list_field(&fixture.store, &DocPath::user(&fixture.user_id), "clubs")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn transient_faults_are_absorbed_by_retry() {
    let fixture = fixture().await;
    let ticket_id = TicketId::random();
    let user_ticket = DocPath::user_ticket(&fixture.user_id, &ticket_id);
    let runner = SagaRunner::new(fixture.store.clone() as Arc<dyn DocumentStore>).with_retry(
        RetryPolicy::new(3, std::time::Duration::ZERO, std::time::Duration::ZERO),
    );

    // One transient put failure; the retried attempt succeeds.
    fixture
        .store
        .inject(StoreFault::put(
            &user_ticket,
            RemoteStoreError::unavailable("connection reset"),
        ))
        .await;

    let report = runner
        .run(issue_ticket_command(&fixture, ticket_id))
        .await;
    assert!(report.is_completed());
}
