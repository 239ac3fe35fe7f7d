//! Account and session handlers.
//!
//! ```text
//! POST /api/v1/signup {"displayName":"Ada Lovelace","email":"ada@clubhub.example","password":"pw"}
//! POST /api/v1/login  {"email":"ada@clubhub.example","password":"pw"}
//! POST /api/v1/logout
//! GET  /api/v1/me
//! ```
//!
//! Credential verification belongs to the external identity provider; this
//! adapter resolves accounts by email and manages the session cookie only.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::DocumentStore;
use crate::domain::{
    ApiResult, DisplayName, DocPath, Document, EmailAddress, Error, LoginCredentials,
    LoginValidationError, Role, User, UserId,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Signup request body for `POST /api/v1/signup`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Display name shown to other users.
    pub display_name: String,
    /// Account email address.
    pub email: String,
    /// Password forwarded to the identity provider.
    pub password: String,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Password forwarded to the identity provider.
    pub password: String,
}

/// Create an account and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let display_name = DisplayName::new(payload.display_name).map_err(|error| {
        Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "displayName" }))
    })?;
    let email = EmailAddress::new(payload.email.trim()).map_err(|error| {
        Error::invalid_request(error.to_string()).with_details(json!({ "field": "email" }))
    })?;
    if payload.password.is_empty() {
        return Err(Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password" })));
    }

    if find_user_by_email(&state, &email).await?.is_some() {
        return Err(Error::conflict("email is already registered"));
    }

    let user = User::new(UserId::random(), display_name, email, Role::Member);
    let document = Document::from_entity(&user)
        .map_err(|error| Error::internal(format!("user failed to serialise: {error}")))?;
    state
        .store
        .put(&DocPath::user(user.id()), &document)
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?;

    session.persist_user(user.id())?;
    Ok(HttpResponse::Created().json(user))
}

/// Authenticate by email and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(map_login_validation_error)?;
    let user = find_user_by_email(&state, credentials.email())
        .await?
        .ok_or_else(|| Error::unauthorized("invalid credentials"))?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Ok().finish())
}

/// Drop the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Return the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "me"
)]
#[get("/me")]
pub async fn me(state: web::Data<HttpState>, session: SessionContext) -> ApiResult<web::Json<User>> {
    let user_id = session.require_user_id()?;
    let user = state.load_user(&user_id).await?;
    Ok(web::Json(user))
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::InvalidEmail => Error::invalid_request("email address is not valid")
            .with_details(json!({ "field": "email", "code": "invalid_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

async fn find_user_by_email(
    state: &HttpState,
    email: &EmailAddress,
) -> Result<Option<User>, Error> {
    let users = state
        .store
        .list(&crate::domain::CollectionPath::users())
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?;
    for (path, document) in users {
        let user: User = document
            .to_entity()
            .map_err(|error| Error::internal(format!("stored user {path} is malformed: {error}")))?;
        if user.email() == email {
            return Ok(Some(user));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test as actix_test, web};
    use serde_json::Value;

    fn test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(HttpState::in_memory()))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(signup)
                    .service(login)
                    .service(logout)
                    .service(me),
            )
    }

    fn signup_request() -> SignupRequest {
        SignupRequest {
            display_name: "Ada Lovelace".into(),
            email: "ada@clubhub.example".into(),
            password: "pw".into(),
        }
    }

    #[actix_web::test]
    async fn signup_creates_the_account_and_session() {
        let app = actix_test::init_service(test_app()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/signup")
                .set_json(signup_request())
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
        let cookie = response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set");

        let me_response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert!(me_response.status().is_success());
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(me_response).await).expect("json body");
        assert_eq!(body["displayName"], "Ada Lovelace");
        assert_eq!(body["role"], "MEMBER");
    }

    #[actix_web::test]
    async fn duplicate_signup_conflicts() {
        let app = actix_test::init_service(test_app()).await;
        for expected in [
            actix_web::http::StatusCode::CREATED,
            actix_web::http::StatusCode::CONFLICT,
        ] {
            let response = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/v1/signup")
                    .set_json(signup_request())
                    .to_request(),
            )
            .await;
            assert_eq!(response.status(), expected);
        }
    }

    #[actix_web::test]
    async fn login_resolves_the_account_by_email() {
        let app = actix_test::init_service(test_app()).await;
        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/signup")
                .set_json(signup_request())
                .to_request(),
        )
        .await;
        assert!(created.status().is_success());

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequest {
                    email: "ada@clubhub.example".into(),
                    password: "pw".into(),
                })
                .to_request(),
        )
        .await;
        assert!(response.status().is_success());
    }

    #[actix_web::test]
    async fn unknown_email_is_unauthorised() {
        let app = actix_test::init_service(test_app()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequest {
                    email: "nobody@clubhub.example".into(),
                    password: "pw".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["code"], "unauthorized");
    }

    #[actix_web::test]
    async fn invalid_signup_payloads_name_the_field() {
        let app = actix_test::init_service(test_app()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/signup")
                .set_json(SignupRequest {
                    display_name: "x".into(),
                    email: "ada@clubhub.example".into(),
                    password: "pw".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["details"]["field"], "displayName");
    }
}
