//! Bug report handlers.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::DocumentStore;
use crate::domain::{ApiResult, BugReport, BugReportId, DocPath, Document, Error};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/bug-reports`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BugReportRequest {
    /// One-line summary.
    pub summary: String,
    /// Full description, including reproduction steps.
    pub body: String,
}

/// File a bug report.
#[utoipa::path(
    post,
    path = "/api/v1/bug-reports",
    request_body = BugReportRequest,
    responses(
        (status = 201, description = "Report filed", body = BugReport),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["bug-reports"],
    operation_id = "fileBugReport"
)]
#[post("/bug-reports")]
pub async fn file_bug_report(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BugReportRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let payload = payload.into_inner();
    if payload.summary.trim().is_empty() {
        return Err(Error::invalid_request("summary must not be empty"));
    }

    let report = BugReport::file(
        BugReportId::random(),
        user_id,
        payload.summary,
        payload.body,
    );
    let document = Document::from_entity(&report)
        .map_err(|error| Error::internal(format!("report failed to serialise: {error}")))?;
    state
        .store
        .put(&DocPath::bug_report(report.id()), &document)
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?;
    Ok(HttpResponse::Created().json(report))
}
