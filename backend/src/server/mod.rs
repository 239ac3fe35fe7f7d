//! Server assembly: state construction, app wiring, and the run loop.

pub mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite};
use actix_web::{App, HttpServer, web};
use tracing::warn;

use crate::domain::SagaRunner;
use crate::domain::ports::{DocumentStore, NoOpPushRelay, PushRelay, WriteSequencer};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{
    admin, bug_reports, catalogue, chats, events, tickets, users,
};
use crate::inbound::ws;
use crate::outbound::push::HttpPushRelay;
use crate::outbound::store::MemoryDocumentStore;

#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Build the HTTP state from configuration.
///
/// The store adapter is the in-memory one: the managed-service adapter is
/// deployed separately and swapped in here when available.
pub fn build_state(config: &ServerConfig) -> HttpState {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let sequencer: Arc<dyn WriteSequencer> = Arc::new(SagaRunner::new(store.clone()));
    let relay: Arc<dyn PushRelay> = match &config.push_endpoint {
        Some(endpoint) => {
            match HttpPushRelay::new(endpoint.clone(), config.relay_timeout) {
                Ok(relay) => Arc::new(relay),
                Err(client_error) => {
                    warn!(error = %client_error, "push relay client failed to build; falling back to no-op");
                    Arc::new(NoOpPushRelay)
                }
            }
        }
        None => Arc::new(NoOpPushRelay),
    };
    HttpState::new(store, sequencer, relay)
}

/// Seed the store with deterministic demo data.
#[cfg(feature = "example-data")]
pub async fn seed_example_data(state: &HttpState, registry_json: &str, seed_name: &str) {
    use crate::domain::{
        Category, CategoryId, Club, ClubId, DisplayName, DocPath, Document, EmailAddress, Event,
        EventId, EventMode, Label, Role, SagaCommand, TeamSizeBounds, User, UserId, Visibility,
    };
    use chrono::{Duration as ChronoDuration, Utc};
    use example_data::{EventModeSeed, SeedRegistry, generate_example_data};
    use tracing::{error, info};

    let registry = match SeedRegistry::from_json(registry_json) {
        Ok(registry) => registry,
        Err(registry_error) => {
            error!(error = %registry_error, "example data registry rejected");
            return;
        }
    };
    let Some(definition) = registry.find_seed(seed_name) else {
        error!(seed = seed_name, "example data seed not found");
        return;
    };
    let data = match generate_example_data(definition) {
        Ok(data) => data,
        Err(generation_error) => {
            error!(error = %generation_error, "example data generation failed");
            return;
        }
    };

    for user_seed in &data.users {
        let Ok(display_name) = DisplayName::new(user_seed.display_name.clone()) else {
            continue;
        };
        let Ok(email) = EmailAddress::new(user_seed.email.clone()) else {
            continue;
        };
        let user = User::new(
            UserId::from_uuid(user_seed.id),
            display_name,
            email,
            Role::Member,
        );
        if let Ok(document) = Document::from_entity(&user) {
            let _ = state.store.put(&DocPath::user(user.id()), &document).await;
        }
    }

    for category_seed in &data.categories {
        let Ok(name) = Label::new(category_seed.name.clone()) else {
            continue;
        };
        let category = Category::new(CategoryId::from_uuid(category_seed.id), name);
        let Ok(document) = Document::from_entity(&category) else {
            continue;
        };
        if state
            .store
            .put(&DocPath::category(category.id()), &document)
            .await
            .is_err()
        {
            continue;
        }

        for club_seed in &category_seed.clubs {
            let Ok(club_name) = Label::new(club_seed.name.clone()) else {
                continue;
            };
            let club = Club::new(
                ClubId::from_uuid(club_seed.id),
                category.id().clone(),
                club_name,
                Visibility::Public,
            )
            .with_description(club_seed.description.clone());
            let report = state
                .sequencer
                .execute(SagaCommand::CreateClub { club: club.clone() })
                .await;
            if !report.is_completed() {
                continue;
            }

            for (offset, event_seed) in club_seed.events.iter().enumerate() {
                let Ok(event_name) = Label::new(event_seed.name.clone()) else {
                    continue;
                };
                let mode = match event_seed.mode {
                    EventModeSeed::Single => EventMode::Single,
                    EventModeSeed::Group => EventMode::Group,
                    EventModeSeed::Both => EventMode::Both,
                };
                let bounds = event_seed
                    .team_size
                    .and_then(|(min, max)| TeamSizeBounds::new(min, max).ok());
                let Ok(event) = Event::try_new(
                    EventId::from_uuid(event_seed.id),
                    category.id().clone(),
                    club.id().clone(),
                    event_name,
                    Utc::now() + ChronoDuration::days(i64::try_from(offset).unwrap_or(0) + 7),
                    mode,
                    bounds,
                ) else {
                    continue;
                };
                let _ = state
                    .sequencer
                    .execute(SagaCommand::CreateEvent { event })
                    .await;
            }
        }
    }

    info!(
        categories = data.categories.len(),
        users = data.users.len(),
        "seeded example data"
    );
}

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(same_site)
        .build()
}

fn build_app(
    state: web::Data<HttpState>,
    health_state: web::Data<HealthState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .wrap(session_middleware(key, cookie_secure, same_site))
        .service(users::signup)
        .service(users::login)
        .service(users::logout)
        .service(users::me)
        .service(tickets::list_my_tickets)
        .service(tickets::get_my_ticket)
        .service(catalogue::list_categories)
        .service(catalogue::create_category)
        .service(catalogue::get_category)
        .service(catalogue::list_clubs)
        .service(catalogue::create_club)
        .service(catalogue::delete_club)
        .service(catalogue::join_club)
        .service(catalogue::leave_club)
        .service(events::list_events)
        .service(events::create_event)
        .service(events::register_single)
        .service(events::register_team)
        .service(chats::list_chats)
        .service(bug_reports::file_bug_report)
        .service(admin::reconcile_category);

    let app = App::new()
        .app_data(state)
        .app_data(health_state)
        .service(api)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(
        SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", crate::doc::ApiDoc::openapi()),
    );

    app
}

/// Run the configured server until shutdown.
///
/// # Errors
///
/// Returns binding and runtime I/O failures.
pub async fn run(config: ServerConfig, state: HttpState) -> std::io::Result<()> {
    let shared_state = web::Data::new(state);
    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();

    let key = config.key.clone();
    let cookie_secure = config.cookie_secure;
    let same_site = config.same_site;
    let bind_addr = config.bind_addr;
    #[cfg(feature = "metrics")]
    let prometheus = config.prometheus.clone().unwrap_or_else(make_metrics);

    let server = HttpServer::new(move || {
        let app = build_app(
            shared_state.clone(),
            server_health_state.clone(),
            key.clone(),
            cookie_secure,
            same_site,
        );
        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());
        app
    })
    .bind(bind_addr)?;

    health_state.mark_ready();
    server.run().await
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    actix_web_prom::PrometheusMetricsBuilder::new("clubhub")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
