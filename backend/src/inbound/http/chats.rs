//! Chat handlers.
//!
//! Listing only; messaging is not wired up yet.

use actix_web::{get, web};

use crate::domain::{ApiResult, Chat, CollectionPath, Error};
use crate::inbound::http::catalogue::load_collection;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// List chat rooms visible to the authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/chats",
    responses(
        (status = 200, description = "Chats", body = [Chat]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["chats"],
    operation_id = "listChats"
)]
#[get("/chats")]
pub async fn list_chats(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Chat>>> {
    let user_id = session.require_user_id()?;
    let chats = load_collection::<Chat>(&state, &CollectionPath::chats()).await?;
    let visible = chats
        .into_iter()
        .filter(|chat| {
            matches!(chat.kind, crate::domain::ChatKind::Global)
                || chat
                    .participants
                    .iter()
                    .any(|participant| participant.user_id == user_id)
        })
        .collect();
    Ok(web::Json(visible))
}
