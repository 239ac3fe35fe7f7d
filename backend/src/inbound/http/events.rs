//! Event and registration handlers.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{DocumentStore, WriteSequencer};
use crate::domain::{
    ApiResult, CategoryId, Club, ClubId, CollectionPath, DocPath, Error, Event, EventId,
    EventMode, Label, SagaCommand, Team, TeamId, TeamSignup, TeamSizeBounds, Ticket, TicketCode,
    TicketId, UserId,
};
use crate::inbound::http::catalogue::{PageQuery, load_collection};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Requested team size range.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamSizeRequest {
    /// Smallest accepted team size.
    pub min: u32,
    /// Largest accepted team size.
    pub max: u32,
}

/// Request body for event creation.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// Event name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Scheduled start time.
    pub starts_at: DateTime<Utc>,
    /// Registration mode.
    pub mode: EventMode,
    /// Team size bounds, required for team-capable modes.
    #[serde(default)]
    pub team_size: Option<TeamSizeRequest>,
}

/// Request body for individual registration.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Client-generated ticket id; generated server-side when omitted.
    /// Supplying one makes a retried registration converge on the same
    /// ticket instead of issuing a duplicate.
    #[serde(default)]
    pub ticket_id: Option<String>,
}

/// Request body for team registration.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamRequest {
    /// Client-generated team id; generated server-side when omitted.
    #[serde(default)]
    pub team_id: Option<String>,
    /// Team name shown on the roster.
    pub name: String,
    /// Distinct members, the requesting leader included.
    pub member_ids: Vec<String>,
    /// Client-generated ticket ids aligned with `member_ids`; generated
    /// server-side when omitted.
    #[serde(default)]
    pub ticket_ids: Option<Vec<String>>,
}

/// Issued ticket with its QR display identity.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    /// The issued ticket.
    pub ticket: Ticket,
    /// Display identity rendered as a QR image by clients.
    #[schema(value_type = String)]
    pub code: TicketCode,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        let code = ticket.code();
        Self { ticket, code }
    }
}

/// Team registration result.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    /// The registered team.
    pub team: Team,
    /// One ticket per member, in roster order.
    pub tickets: Vec<TicketResponse>,
}

/// List a club's events.
#[utoipa::path(
    get,
    path = "/api/v1/categories/{categoryId}/clubs/{clubId}/events",
    params(
        ("categoryId" = String, Path, description = "Category id"),
        ("clubId" = String, Path, description = "Club id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Events", body = [Event]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["events"],
    operation_id = "listEvents"
)]
#[get("/categories/{category_id}/clubs/{club_id}/events")]
pub async fn list_events(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Event>>> {
    session.require_user_id()?;
    let (category_id, club_id) = parse_club_path(&path)?;
    let request = query.request()?;
    let events =
        load_collection::<Event>(&state, &CollectionPath::events(&category_id, &club_id)).await?;
    Ok(web::Json(Page::from_listing(events, request)))
}

/// Create an event. Club members only.
///
/// A successful creation is announced to all registered devices; relay
/// failures never fail the request.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{categoryId}/clubs/{clubId}/events",
    params(
        ("categoryId" = String, Path, description = "Category id"),
        ("clubId" = String, Path, description = "Club id")
    ),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["events"],
    operation_id = "createEvent"
)]
#[post("/categories/{category_id}/clubs/{club_id}/events")]
pub async fn create_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
    payload: web::Json<CreateEventRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let (category_id, club_id) = parse_club_path(&path)?;
    let club = load_club(&state, &category_id, &club_id).await?;
    ensure_membership(&state, &category_id, &club_id, &user_id).await?;

    let payload = payload.into_inner();
    let name =
        Label::new(payload.name).map_err(|error| Error::invalid_request(error.to_string()))?;
    let team_size = payload
        .team_size
        .map(|bounds| TeamSizeBounds::new(bounds.min, bounds.max))
        .transpose()
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    let mut event = Event::try_new(
        EventId::random(),
        category_id,
        club_id,
        name,
        payload.starts_at,
        payload.mode,
        team_size,
    )
    .map_err(|error| Error::invalid_request(error.to_string()))?
    .with_organisers(vec![user_id]);
    if let Some(description) = payload.description {
        event = event.with_description(description);
    }

    state
        .sequencer
        .execute(SagaCommand::CreateEvent {
            event: event.clone(),
        })
        .await
        .into_result()?;
    state.announcer.announce_event(&event, &club).await;

    Ok(HttpResponse::Created().json(event))
}

/// Register individually for an event, issuing one ticket.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{categoryId}/clubs/{clubId}/events/{eventId}/register",
    params(
        ("categoryId" = String, Path, description = "Category id"),
        ("clubId" = String, Path, description = "Club id"),
        ("eventId" = String, Path, description = "Event id")
    ),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Ticket issued", body = TicketResponse),
        (status = 404, description = "Event not found", body = Error),
        (status = 409, description = "Event is team-only", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["events"],
    operation_id = "registerForEvent"
)]
#[post("/categories/{category_id}/clubs/{club_id}/events/{event_id}/register")]
pub async fn register_single(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String, String)>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let (category_id, club_id, event_id) = parse_event_path(&path)?;
    let ticket_id = parse_optional_id::<TicketId>(payload.into_inner().ticket_id, "ticketId")?;

    let ticket = state
        .registration
        .register_single(&category_id, &club_id, &event_id, &user_id, ticket_id)
        .await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(ticket)))
}

/// Register a team for an event, issuing one ticket per member.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{categoryId}/clubs/{clubId}/events/{eventId}/teams",
    params(
        ("categoryId" = String, Path, description = "Category id"),
        ("clubId" = String, Path, description = "Club id"),
        ("eventId" = String, Path, description = "Event id")
    ),
    request_body = TeamRequest,
    responses(
        (status = 201, description = "Team registered", body = TeamResponse),
        (status = 400, description = "Invalid roster or size", body = Error),
        (status = 404, description = "Event not found", body = Error),
        (status = 409, description = "Event is individual-only", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["events"],
    operation_id = "registerTeam"
)]
#[post("/categories/{category_id}/clubs/{club_id}/events/{event_id}/teams")]
pub async fn register_team(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String, String)>,
    payload: web::Json<TeamRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let (category_id, club_id, event_id) = parse_event_path(&path)?;
    let payload = payload.into_inner();

    let name =
        Label::new(payload.name).map_err(|error| Error::invalid_request(error.to_string()))?;
    let team_id = parse_optional_id::<TeamId>(payload.team_id, "teamId")?;
    let member_ids: Vec<UserId> = payload
        .member_ids
        .iter()
        .map(|raw| UserId::new(raw).map_err(|error| Error::invalid_request(error.to_string())))
        .collect::<Result<_, _>>()?;
    let ticket_ids: Vec<TicketId> = match payload.ticket_ids {
        Some(raw_ids) => raw_ids
            .iter()
            .map(|raw| {
                TicketId::new(raw).map_err(|error| Error::invalid_request(error.to_string()))
            })
            .collect::<Result<_, _>>()?,
        None => member_ids.iter().map(|_| TicketId::random()).collect(),
    };

    let signup = TeamSignup {
        team_id,
        name,
        leader_id: user_id,
        member_ids,
        ticket_ids,
    };
    let (team, tickets) = state
        .registration
        .register_team(&category_id, &club_id, &event_id, signup)
        .await?;
    Ok(HttpResponse::Created().json(TeamResponse {
        team,
        tickets: tickets.into_iter().map(TicketResponse::from).collect(),
    }))
}

fn parse_club_path(path: &(String, String)) -> Result<(CategoryId, ClubId), Error> {
    crate::inbound::http::catalogue::parse_club_path(path)
}

fn parse_event_path(
    path: &(String, String, String),
) -> Result<(CategoryId, ClubId, EventId), Error> {
    let (category_raw, club_raw, event_raw) = path;
    let (category_id, club_id) =
        crate::inbound::http::catalogue::parse_club_path(&(category_raw.clone(), club_raw.clone()))?;
    let event_id =
        EventId::new(event_raw).map_err(|error| Error::invalid_request(error.to_string()))?;
    Ok((category_id, club_id, event_id))
}

fn parse_optional_id<T>(raw: Option<String>, field: &str) -> Result<T, Error>
where
    T: TryFrom<String>,
    T::Error: std::fmt::Display,
{
    match raw {
        Some(value) => T::try_from(value).map_err(|error| {
            Error::invalid_request(error.to_string())
                .with_details(serde_json::json!({ "field": field }))
        }),
        None => T::try_from(uuid::Uuid::new_v4().to_string())
            .map_err(|error| Error::internal(format!("generated id failed validation: {error}"))),
    }
}

async fn load_club(
    state: &HttpState,
    category_id: &CategoryId,
    club_id: &ClubId,
) -> Result<Club, Error> {
    let document = state
        .store
        .get(&DocPath::club(category_id, club_id))
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?
        .ok_or_else(|| Error::not_found("club not found"))?;
    document
        .to_entity()
        .map_err(|error| Error::internal(format!("stored club is malformed: {error}")))
}

async fn ensure_membership(
    state: &HttpState,
    category_id: &CategoryId,
    club_id: &ClubId,
    user_id: &UserId,
) -> Result<(), Error> {
    state
        .store
        .get(&DocPath::membership(category_id, club_id, user_id))
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?
        .map(|_| ())
        .ok_or_else(|| Error::forbidden("club membership required"))
}
