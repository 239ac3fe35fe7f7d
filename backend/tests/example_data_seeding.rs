//! Coverage for startup seeding of the deterministic demo dataset.

use backend::domain::ports::DocumentStore;
use backend::domain::{Category, Club, CollectionPath, User};
use backend::inbound::http::state::HttpState;
use backend::server::seed_example_data;

const REGISTRY: &str = r#"{
    "version": 1,
    "seeds": [{
        "name": "campus-demo",
        "seed": 42,
        "categoryCount": 2,
        "clubsPerCategory": 2,
        "eventsPerClub": 1,
        "userCount": 3
    }]
}"#;

#[tokio::test]
async fn seeding_builds_a_consistent_catalogue() {
    let state = HttpState::in_memory();
    seed_example_data(&state, REGISTRY, "campus-demo").await;

    let categories = state
        .store
        .list(&CollectionPath::categories())
        .await
        .expect("list succeeds");
    assert_eq!(categories.len(), 2);

    for (path, document) in &categories {
        let category: Category = document.to_entity().expect("category deserialises");
        assert_eq!(path.doc_id(), category.id().as_ref());

        let clubs = state
            .store
            .list(&CollectionPath::clubs(category.id()))
            .await
            .expect("list succeeds");
        assert_eq!(clubs.len(), 2);

        // The seeded category mirror matches its authoritative collection
        // because seeding goes through the write sequencer.
        let mirrored = state
            .store
            .get(path)
            .await
            .expect("get succeeds")
            .expect("category exists")
            .list_field("clubIds");
        assert_eq!(mirrored.len(), clubs.len());

        for (club_path, club_document) in &clubs {
            let club: Club = club_document.to_entity().expect("club deserialises");
            assert_eq!(club_path.doc_id(), club.id().as_ref());
            let events = state
                .store
                .list(&CollectionPath::events(category.id(), club.id()))
                .await
                .expect("list succeeds");
            assert_eq!(events.len(), 1);
        }
    }

    let users = state
        .store
        .list(&CollectionPath::users())
        .await
        .expect("list succeeds");
    assert_eq!(users.len(), 3);
    for (_, document) in users {
        let user: User = document.to_entity().expect("user deserialises");
        assert!(!user.display_name().as_ref().is_empty());
    }
}

#[tokio::test]
async fn seeding_twice_is_idempotent() {
    let state = HttpState::in_memory();
    seed_example_data(&state, REGISTRY, "campus-demo").await;
    seed_example_data(&state, REGISTRY, "campus-demo").await;

    let categories = state
        .store
        .list(&CollectionPath::categories())
        .await
        .expect("list succeeds");
    assert_eq!(categories.len(), 2);

    for (path, _) in &categories {
        let mirrored = state
            .store
            .get(path)
            .await
            .expect("get succeeds")
            .expect("category exists")
            .list_field("clubIds");
        assert_eq!(mirrored.len(), 2, "duplicate seeding grew the mirror");
    }
}

#[tokio::test]
async fn unknown_seeds_leave_the_store_untouched() {
    let state = HttpState::in_memory();
    seed_example_data(&state, REGISTRY, "missing-seed").await;

    let categories = state
        .store
        .list(&CollectionPath::categories())
        .await
        .expect("list succeeds");
    assert!(categories.is_empty());
}
