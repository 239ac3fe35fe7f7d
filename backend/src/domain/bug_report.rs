//! Bug report submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{BugReportId, UserId};

/// User-submitted bug report stored under `BugReports/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BugReport {
    #[schema(value_type = String)]
    id: BugReportId,
    #[schema(value_type = String)]
    reporter_id: UserId,
    #[schema(example = "Ticket QR fails to render")]
    summary: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl BugReport {
    /// File a new report stamped now.
    pub fn file(
        id: BugReportId,
        reporter_id: UserId,
        summary: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id,
            reporter_id,
            summary: summary.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// Stable report identifier.
    pub fn id(&self) -> &BugReportId {
        &self.id
    }

    /// Reporting user.
    pub fn reporter_id(&self) -> &UserId {
        &self.reporter_id
    }

    /// One-line summary.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Full description.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Submission timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
