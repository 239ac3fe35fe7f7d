//! Category and club handlers.
//!
//! Club creation, deletion, joining, and leaving are the multi-collection
//! actions; each goes through the write sequencer rather than issuing ad hoc
//! store calls.

use actix_web::{HttpResponse, delete, get, post, web};
use pagination::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::{DocumentStore, WriteSequencer};
use crate::domain::{
    ApiResult, Category, CategoryId, Club, ClubId, ClubRole, CollectionPath, DocPath, Document,
    Error, Label, Membership, Role, SagaCommand, UserId, Visibility,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Pagination query parameters shared by list endpoints.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: Option<usize>,
}

impl PageQuery {
    pub(crate) fn request(&self) -> Result<PageRequest, Error> {
        PageRequest::from_parts(self.cursor.as_deref(), self.limit)
            .map_err(|error| Error::invalid_request(error.to_string()))
    }
}

/// Request body for `POST /api/v1/categories`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    /// Category name.
    pub name: String,
}

/// Request body for club creation.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClubRequest {
    /// Club name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Catalogue visibility.
    pub visibility: Visibility,
}

/// List categories.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(PageQuery),
    responses(
        (status = 200, description = "Categories", body = [Category]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "listCategories"
)]
#[get("/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Category>>> {
    session.require_user_id()?;
    let request = query.request()?;
    let categories = load_collection::<Category>(&state, &CollectionPath::categories()).await?;
    Ok(web::Json(Page::from_listing(categories, request)))
}

/// Create a category. Administrators only.
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "createCategory"
)]
#[post("/categories")]
pub async fn create_category(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCategoryRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state.require_admin(&user_id).await?;

    let name = Label::new(payload.into_inner().name)
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    let category = Category::new(CategoryId::random(), name);
    let document = Document::from_entity(&category)
        .map_err(|error| Error::internal(format!("category failed to serialise: {error}")))?;
    state
        .store
        .put(&DocPath::category(category.id()), &document)
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?;
    Ok(HttpResponse::Created().json(category))
}

/// Fetch one category.
#[utoipa::path(
    get,
    path = "/api/v1/categories/{categoryId}",
    params(("categoryId" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "getCategory"
)]
#[get("/categories/{category_id}")]
pub async fn get_category(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Category>> {
    session.require_user_id()?;
    let category_id = parse_category_id(&path)?;
    let document = state
        .store
        .get(&DocPath::category(&category_id))
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?
        .ok_or_else(|| Error::not_found("category not found"))?;
    let category = document
        .to_entity()
        .map_err(|error| Error::internal(format!("stored category is malformed: {error}")))?;
    Ok(web::Json(category))
}

/// List a category's clubs.
#[utoipa::path(
    get,
    path = "/api/v1/categories/{categoryId}/clubs",
    params(("categoryId" = String, Path, description = "Category id"), PageQuery),
    responses(
        (status = 200, description = "Clubs", body = [Club]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "listClubs"
)]
#[get("/categories/{category_id}/clubs")]
pub async fn list_clubs(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Club>>> {
    session.require_user_id()?;
    let category_id = parse_category_id(&path)?;
    let request = query.request()?;
    let clubs: Vec<Club> =
        load_collection::<Club>(&state, &CollectionPath::clubs(&category_id)).await?;
    // Private clubs stay out of the public catalogue listing.
    let visible = clubs
        .into_iter()
        .filter(|club| club.visibility() == Visibility::Public)
        .collect();
    Ok(web::Json(Page::from_listing(visible, request)))
}

/// Create a club inside a category.
///
/// The creator becomes the club's owner: the creation sequence is followed
/// by an owner-role join sequence.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{categoryId}/clubs",
    params(("categoryId" = String, Path, description = "Category id")),
    request_body = CreateClubRequest,
    responses(
        (status = 201, description = "Club created", body = Club),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Category not found", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "createClub"
)]
#[post("/categories/{category_id}/clubs")]
pub async fn create_club(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateClubRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let category_id = parse_category_id(&path)?;
    ensure_category_exists(&state, &category_id).await?;

    let payload = payload.into_inner();
    let name =
        Label::new(payload.name).map_err(|error| Error::invalid_request(error.to_string()))?;
    let mut club = Club::new(
        ClubId::random(),
        category_id.clone(),
        name,
        payload.visibility,
    );
    if let Some(description) = payload.description {
        club = club.with_description(description);
    }

    state
        .sequencer
        .execute(SagaCommand::CreateClub { club: club.clone() })
        .await
        .into_result()?;
    state
        .sequencer
        .execute(SagaCommand::JoinClub {
            category_id,
            club_id: club.id().clone(),
            membership: Membership::new(user_id, ClubRole::Owner),
        })
        .await
        .into_result()?;

    Ok(HttpResponse::Created().json(club))
}

/// Delete a club. Club owners, club admins, and platform admins only.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{categoryId}/clubs/{clubId}",
    params(
        ("categoryId" = String, Path, description = "Category id"),
        ("clubId" = String, Path, description = "Club id")
    ),
    responses(
        (status = 204, description = "Club deleted"),
        (status = 403, description = "Forbidden", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "deleteClub"
)]
#[delete("/categories/{category_id}/clubs/{club_id}")]
pub async fn delete_club(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let (category_id, club_id) = parse_club_path(&path)?;
    ensure_may_manage_club(&state, &category_id, &club_id, &user_id).await?;

    state
        .sequencer
        .execute(SagaCommand::DeleteClub {
            category_id,
            club_id,
        })
        .await
        .into_result()?;
    Ok(HttpResponse::NoContent().finish())
}

/// Join a club as a regular member.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{categoryId}/clubs/{clubId}/join",
    params(
        ("categoryId" = String, Path, description = "Category id"),
        ("clubId" = String, Path, description = "Club id")
    ),
    responses(
        (status = 200, description = "Joined", body = Membership),
        (status = 404, description = "Club not found", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "joinClub"
)]
#[post("/categories/{category_id}/clubs/{club_id}/join")]
pub async fn join_club(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<Membership>> {
    let user_id = session.require_user_id()?;
    let (category_id, club_id) = parse_club_path(&path)?;
    ensure_club_exists(&state, &category_id, &club_id).await?;

    let membership = Membership::new(user_id, ClubRole::Member);
    state
        .sequencer
        .execute(SagaCommand::JoinClub {
            category_id,
            club_id,
            membership: membership.clone(),
        })
        .await
        .into_result()?;
    Ok(web::Json(membership))
}

/// Leave a club.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{categoryId}/clubs/{clubId}/leave",
    params(
        ("categoryId" = String, Path, description = "Category id"),
        ("clubId" = String, Path, description = "Club id")
    ),
    responses(
        (status = 204, description = "Left"),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "leaveClub"
)]
#[post("/categories/{category_id}/clubs/{club_id}/leave")]
pub async fn leave_club(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let (category_id, club_id) = parse_club_path(&path)?;

    state
        .sequencer
        .execute(SagaCommand::LeaveClub {
            category_id,
            club_id,
            user_id,
        })
        .await
        .into_result()?;
    Ok(HttpResponse::NoContent().finish())
}

pub(crate) fn parse_category_id(raw: &str) -> Result<CategoryId, Error> {
    CategoryId::new(raw).map_err(|error| Error::invalid_request(error.to_string()))
}

pub(crate) fn parse_club_path(path: &(String, String)) -> Result<(CategoryId, ClubId), Error> {
    let (category_raw, club_raw) = path;
    let category_id = parse_category_id(category_raw)?;
    let club_id =
        ClubId::new(club_raw).map_err(|error| Error::invalid_request(error.to_string()))?;
    Ok((category_id, club_id))
}

pub(crate) async fn load_collection<T: serde::de::DeserializeOwned>(
    state: &HttpState,
    collection: &CollectionPath,
) -> Result<Vec<T>, Error> {
    let documents = state
        .store
        .list(collection)
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?;
    documents
        .into_iter()
        .map(|(path, document)| {
            document.to_entity().map_err(|error| {
                Error::internal(format!("stored document {path} is malformed: {error}"))
            })
        })
        .collect()
}

async fn ensure_category_exists(state: &HttpState, category_id: &CategoryId) -> Result<(), Error> {
    state
        .store
        .get(&DocPath::category(category_id))
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?
        .map(|_| ())
        .ok_or_else(|| Error::not_found("category not found"))
}

pub(crate) async fn ensure_club_exists(
    state: &HttpState,
    category_id: &CategoryId,
    club_id: &ClubId,
) -> Result<(), Error> {
    state
        .store
        .get(&DocPath::club(category_id, club_id))
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?
        .map(|_| ())
        .ok_or_else(|| Error::not_found("club not found"))
}

async fn ensure_may_manage_club(
    state: &HttpState,
    category_id: &CategoryId,
    club_id: &ClubId,
    user_id: &UserId,
) -> Result<(), Error> {
    let user = state.load_user(user_id).await?;
    if user.role() == Role::Admin {
        return Ok(());
    }
    let membership = state
        .store
        .get(&DocPath::membership(category_id, club_id, user_id))
        .await
        .map_err(|error| Error::service_unavailable(error.to_string()))?
        .ok_or_else(|| Error::forbidden("club management requires a leadership role"))?;
    let membership: Membership = membership
        .to_entity()
        .map_err(|error| Error::internal(format!("stored membership is malformed: {error}")))?;
    match membership.role() {
        ClubRole::Owner | ClubRole::Admin => Ok(()),
        role @ (ClubRole::Moderator | ClubRole::Member) => Err(Error::forbidden(
            "club management requires a leadership role",
        )
        .with_details(json!({ "role": role }))),
    }
}
