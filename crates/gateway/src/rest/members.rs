//! Member profile endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use spk_database::{MemberFields, MembershipStatus, Paged, Province};
use spk_members::{MemberQuery, MemberView, UploadSlot};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::rest::PageParams;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct ListMembersParams {
    pub status: Option<MembershipStatus>,
    pub province_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    /// Account to link the profile to. Omitted by members registering
    /// themselves.
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub fields: MemberFields,
}

pub fn create_member_routes() -> Router<AppState> {
    Router::new()
        .route("/api/members", get(list_members).post(create_member))
        .route("/api/members/me", get(own_member))
        .route(
            "/api/members/:member_id",
            get(get_member).put(update_member).delete(delete_member),
        )
        .route("/api/members/:member_id/verify", post(verify_member))
        .route("/api/members/:member_id/reject", post(reject_member))
        .route("/api/members/:member_id/photo", post(upload_photo))
        .route("/api/members/:member_id/id-card", post(upload_id_card))
        .route("/api/provinces", get(list_provinces))
}

#[utoipa::path(
    get,
    path = "/api/members",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(
        ("status" = Option<String>, Query, description = "pending, active, inactive or rejected"),
        ("province_id" = Option<i64>, Query, description = "Province filter"),
        ("search" = Option<String>, Query, description = "Name, NIK, email or member number"),
        PageParams
    ),
    responses(
        (status = 200, description = "Members visible to the caller"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<ListMembersParams>,
) -> Result<Json<Paged<MemberView>>, ApiError> {
    let page = PageParams { limit: params.limit, offset: params.offset }.page();
    let query = MemberQuery {
        status: params.status,
        province_id: params.province_id,
        search: params.search,
    };
    let members = state.members().list(&current.viewer, &query, page).await?;
    Ok(Json(members))
}

#[utoipa::path(
    post,
    path = "/api/members",
    tag = "Members",
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Member profile created"),
        (status = 403, description = "Missing member.create", body = crate::error::ErrorResponse),
        (status = 409, description = "The account already has a profile", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid profile fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberView>), ApiError> {
    let viewer = &current.viewer;
    let user_id = req
        .user_id
        .or_else(|| (!viewer.can("member.create")).then_some(viewer.user_id));
    let member = state.members().create(viewer, user_id, req.fields).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    get,
    path = "/api/members/me",
    tag = "Members",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The caller's own profile"),
        (status = 404, description = "No profile registered yet", body = crate::error::ErrorResponse)
    )
)]
pub async fn own_member(State(state): State<AppState>, current: CurrentUser) -> Result<Json<MemberView>, ApiError> {
    state
        .members()
        .own_profile(&current.viewer)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("member profile not found"))
}

#[utoipa::path(
    get,
    path = "/api/members/{member_id}",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(("member_id" = i64, Path, description = "Member id")),
    responses(
        (status = 200, description = "Member profile with derived fields"),
        (status = 403, description = "Outside the caller's scope", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(member_id): Path<i64>,
) -> Result<Json<MemberView>, ApiError> {
    Ok(Json(state.members().get(&current.viewer, member_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/members/{member_id}",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(("member_id" = i64, Path, description = "Member id")),
    responses(
        (status = 200, description = "Member profile updated"),
        (status = 403, description = "Missing member.edit or outside scope", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid profile fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(member_id): Path<i64>,
    Json(fields): Json<MemberFields>,
) -> Result<Json<MemberView>, ApiError> {
    Ok(Json(state.members().update(&current.viewer, member_id, fields).await?))
}

#[utoipa::path(
    delete,
    path = "/api/members/{member_id}",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(("member_id" = i64, Path, description = "Member id")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 403, description = "Missing member.delete", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(member_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.members().delete(&current.viewer, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/members/{member_id}/verify",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(("member_id" = i64, Path, description = "Member id")),
    responses(
        (status = 200, description = "Registration verified and member number issued"),
        (status = 409, description = "Registration is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(member_id): Path<i64>,
) -> Result<Json<MemberView>, ApiError> {
    Ok(Json(state.members().verify(&current.viewer, member_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/members/{member_id}/reject",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(("member_id" = i64, Path, description = "Member id")),
    responses(
        (status = 200, description = "Registration rejected"),
        (status = 409, description = "Registration is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_member(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(member_id): Path<i64>,
) -> Result<Json<MemberView>, ApiError> {
    Ok(Json(state.members().reject(&current.viewer, member_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/members/{member_id}/photo",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(("member_id" = i64, Path, description = "Member id")),
    responses(
        (status = 200, description = "Photo stored; multipart field `file`, JPEG or PNG"),
        (status = 422, description = "File rejected", body = crate::error::ErrorResponse)
    )
)]
pub async fn upload_photo(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(member_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<MemberView>, ApiError> {
    let bytes = read_upload(multipart).await?;
    let member = state
        .members()
        .upload(&current.viewer, member_id, UploadSlot::Photo, &bytes)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    post,
    path = "/api/members/{member_id}/id-card",
    tag = "Members",
    security(("bearerAuth" = [])),
    params(("member_id" = i64, Path, description = "Member id")),
    responses(
        (status = 200, description = "ID card stored; multipart field `file`, JPEG, PNG or PDF"),
        (status = 422, description = "File rejected", body = crate::error::ErrorResponse)
    )
)]
pub async fn upload_id_card(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(member_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<MemberView>, ApiError> {
    let bytes = read_upload(multipart).await?;
    let member = state
        .members()
        .upload(&current.viewer, member_id, UploadSlot::IdCard, &bytes)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    get,
    path = "/api/provinces",
    tag = "Members",
    responses((status = 200, description = "Province reference list"))
)]
pub async fn list_provinces(State(state): State<AppState>) -> Result<Json<Vec<Province>>, ApiError> {
    Ok(Json(state.members().provinces().await?))
}

async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::new(err.status(), err.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::new(err.status(), err.body_text()))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::bad_request(format!("missing multipart field '{UPLOAD_FIELD}'")))
}
