//! OpenAPI document assembly for Swagger UI and tooling.

use utoipa::OpenApi;

use crate::domain;
use crate::inbound::http::{
    admin, bug_reports, catalogue, chats, events, health, tickets, users,
};

/// Public OpenAPI surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        users::signup,
        users::login,
        users::logout,
        users::me,
        tickets::list_my_tickets,
        tickets::get_my_ticket,
        catalogue::list_categories,
        catalogue::create_category,
        catalogue::get_category,
        catalogue::list_clubs,
        catalogue::create_club,
        catalogue::delete_club,
        catalogue::join_club,
        catalogue::leave_club,
        events::list_events,
        events::create_event,
        events::register_single,
        events::register_team,
        chats::list_chats,
        bug_reports::file_bug_report,
        admin::reconcile_category,
        health::ready,
        health::live,
    ),
    components(schemas(
        domain::Error,
        domain::ErrorCode,
        domain::User,
        domain::Role,
        domain::Category,
        domain::Club,
        domain::Visibility,
        domain::ClubRole,
        domain::Membership,
        domain::Event,
        domain::EventMode,
        domain::TeamSizeBounds,
        domain::Team,
        domain::Ticket,
        domain::TicketStatus,
        domain::Chat,
        domain::ChatKind,
        domain::BugReport,
        domain::DriftReport,
        domain::DriftEntry,
        domain::DriftKind,
        users::SignupRequest,
        users::LoginRequest,
        catalogue::CreateCategoryRequest,
        catalogue::CreateClubRequest,
        events::CreateEventRequest,
        events::TeamSizeRequest,
        events::RegisterRequest,
        events::TeamRequest,
        events::TicketResponse,
        events::TeamResponse,
        bug_reports::BugReportRequest,
    )),
    tags(
        (name = "users", description = "Accounts and sessions"),
        (name = "catalogue", description = "Categories and clubs"),
        (name = "events", description = "Events, registration, and teams"),
        (name = "tickets", description = "Issued tickets"),
        (name = "chats", description = "Chat rooms"),
        (name = "bug-reports", description = "Bug reports"),
        (name = "admin", description = "Administrative repairs"),
        (name = "health", description = "Probes"),
    )
)]
pub struct ApiDoc;
