//! Behavioural coverage for reactive projections over the in-memory store.

use std::sync::Arc;

use backend::domain::ports::DocumentStore;
use backend::domain::{
    Category, CategoryId, DocPath, Document, Label, Projection, RemoteState,
};
use backend::outbound::store::MemoryDocumentStore;

async fn seeded_category(store: &MemoryDocumentStore) -> CategoryId {
    let category = Category::new(
        CategoryId::random(),
        Label::new("Sports").expect("valid label"),
    );
    let document = Document::from_entity(&category).expect("category serialises");
    store
        .put(&DocPath::category(category.id()), &document)
        .await
        .expect("seed write succeeds");
    category.id().clone()
}

fn clubs_of(state: &RemoteState<Option<Document>>) -> Vec<String> {
    state
        .value()
        .and_then(|snapshot| snapshot.as_ref())
        .map(|document| document.list_field("clubIds"))
        .unwrap_or_default()
}

#[tokio::test]
async fn snapshot_first_then_one_emission_per_mutation_in_order() {
    let store = Arc::new(MemoryDocumentStore::new());
    let category_id = seeded_category(&store).await;
    let path = DocPath::category(&category_id);
    let projection = Projection::new(store.clone() as Arc<dyn DocumentStore>);

    let mut subscription = projection.subscribe(&path).await.expect("subscribe succeeds");
    assert!(clubs_of(subscription.current()).is_empty());

    for club in ["club-one", "club-two", "club-three"] {
        store
            .append_to_list(&path, "clubIds", club)
            .await
            .expect("append succeeds");
    }
    // A duplicate append is not a mutation and must not emit.
    store
        .append_to_list(&path, "clubIds", "club-one")
        .await
        .expect("duplicate append succeeds");
    store.delete(&path).await.expect("delete succeeds");

    let mut observed = Vec::new();
    for _ in 0..3 {
        let update = subscription.next().await.expect("update arrives");
        observed.push(clubs_of(&update).len());
    }
    assert_eq!(observed, vec![1, 2, 3]);

    // The deletion arrives as a Ready(None) state, with nothing in between.
    let deletion = subscription.next().await.expect("deletion arrives");
    assert_eq!(deletion, RemoteState::Ready(None));
}

#[tokio::test]
async fn mutations_of_other_paths_do_not_emit() {
    let store = Arc::new(MemoryDocumentStore::new());
    let watched = seeded_category(&store).await;
    let other = seeded_category(&store).await;
    let projection = Projection::new(store.clone() as Arc<dyn DocumentStore>);

    let mut subscription = projection
        .subscribe(&DocPath::category(&watched))
        .await
        .expect("subscribe succeeds");

    store
        .append_to_list(&DocPath::category(&other), "clubIds", "elsewhere")
        .await
        .expect("append succeeds");
    store
        .append_to_list(&DocPath::category(&watched), "clubIds", "here")
        .await
        .expect("append succeeds");

    let update = subscription.next().await.expect("update arrives");
    assert_eq!(clubs_of(&update), vec!["here".to_owned()]);
}

#[tokio::test]
async fn cancellation_is_idempotent_and_stops_the_stream() {
    let store = Arc::new(MemoryDocumentStore::new());
    let category_id = seeded_category(&store).await;
    let path = DocPath::category(&category_id);
    let projection = Projection::new(store.clone() as Arc<dyn DocumentStore>);

    let mut subscription = projection.subscribe(&path).await.expect("subscribe succeeds");
    subscription.cancel();
    subscription.cancel();

    store
        .append_to_list(&path, "clubIds", "late")
        .await
        .expect("append succeeds");
    assert_eq!(subscription.next().await, None);
}
