//! Administrative handlers.

use actix_web::{post, web};

use crate::domain::{ApiResult, DriftReport, Error};
use crate::inbound::http::catalogue::parse_category_id;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Scan a category tree for reference-list drift and repair it.
///
/// Drift accumulates when a write sequence fails after committing some steps
/// and its compensation cannot fully reverse them; this endpoint is the
/// manual repair lever until a scheduled pass exists.
#[utoipa::path(
    post,
    path = "/api/v1/admin/categories/{categoryId}/reconcile",
    params(("categoryId" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Repairs applied", body = DriftReport),
        (status = 403, description = "Forbidden", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["admin"],
    operation_id = "reconcileCategory"
)]
#[post("/admin/categories/{category_id}/reconcile")]
pub async fn reconcile_category(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DriftReport>> {
    let user_id = session.require_user_id()?;
    state.require_admin(&user_id).await?;

    let category_id = parse_category_id(&path)?;
    let report = state.reconciler.reconcile_category(&category_id).await?;
    Ok(web::Json(report))
}
