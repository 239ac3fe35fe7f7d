//! Ticket handlers for the authenticated user.

use actix_web::{get, web};

use crate::domain::ports::DocumentStore;
use crate::domain::{ApiResult, CollectionPath, DocPath, Error, Ticket, TicketId};
use crate::inbound::http::catalogue::load_collection;
use crate::inbound::http::events::TicketResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// List the authenticated user's tickets.
#[utoipa::path(
    get,
    path = "/api/v1/me/tickets",
    responses(
        (status = 200, description = "Tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listMyTickets"
)]
#[get("/me/tickets")]
pub async fn list_my_tickets(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let user_id = session.require_user_id()?;
    let tickets =
        load_collection::<Ticket>(&state, &CollectionPath::user_tickets(&user_id)).await?;
    Ok(web::Json(
        tickets.into_iter().map(TicketResponse::from).collect(),
    ))
}

/// Fetch one of the authenticated user's tickets with its QR identity.
#[utoipa::path(
    get,
    path = "/api/v1/me/tickets/{ticketId}",
    params(("ticketId" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket", body = TicketResponse),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "getMyTicket"
)]
#[get("/me/tickets/{ticket_id}")]
pub async fn get_my_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<TicketResponse>> {
    let user_id = session.require_user_id()?;
    let ticket_id =
        TicketId::new(path.as_str()).map_err(|error| Error::invalid_request(error.to_string()))?;
    let document = state
        .store
        .get(&DocPath::user_ticket(&user_id, &ticket_id))
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?
        .ok_or_else(|| Error::not_found("ticket not found"))?;
    let ticket: Ticket = document
        .to_entity()
        .map_err(|error| Error::internal(format!("stored ticket is malformed: {error}")))?;
    Ok(web::Json(TicketResponse::from(ticket)))
}
