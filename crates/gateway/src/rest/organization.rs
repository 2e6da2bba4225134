//! Organization chart endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use spk_database::PositionFields;
use spk_members::{OrgChart, OrgNode};
use utoipa::IntoParams;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrganizationParams {
    /// Board period such as `2024-2027`; defaults to the newest one.
    pub period: Option<String>,
}

pub fn create_organization_routes() -> Router<AppState> {
    Router::new()
        .route("/api/organization", get(organization_chart))
        .route("/api/organization/positions", post(create_position))
        .route(
            "/api/organization/positions/:position_id",
            put(update_position).delete(delete_position),
        )
}

#[utoipa::path(
    get,
    path = "/api/organization",
    tag = "Organization",
    params(OrganizationParams),
    responses((status = 200, description = "Position tree of one period and the known periods"))
)]
pub async fn organization_chart(
    State(state): State<AppState>,
    Query(params): Query<OrganizationParams>,
) -> Result<Json<OrgChart>, ApiError> {
    let period = params.period.as_deref().map(str::trim).filter(|p| !p.is_empty());
    Ok(Json(state.members().organization(period).await?))
}

#[utoipa::path(
    post,
    path = "/api/organization/positions",
    tag = "Organization",
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Position created"),
        (status = 403, description = "Missing org.manage", body = crate::error::ErrorResponse),
        (status = 422, description = "Unknown parent or member", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_position(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(fields): Json<PositionFields>,
) -> Result<(StatusCode, Json<OrgNode>), ApiError> {
    let node = state.members().create_position(&current.viewer, &fields).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

#[utoipa::path(
    put,
    path = "/api/organization/positions/{position_id}",
    tag = "Organization",
    security(("bearerAuth" = [])),
    params(("position_id" = i64, Path, description = "Position id")),
    responses(
        (status = 200, description = "Position updated"),
        (status = 422, description = "Parent would create a cycle", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_position(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(position_id): Path<i64>,
    Json(fields): Json<PositionFields>,
) -> Result<Json<OrgNode>, ApiError> {
    Ok(Json(state.members().update_position(&current.viewer, position_id, &fields).await?))
}

#[utoipa::path(
    delete,
    path = "/api/organization/positions/{position_id}",
    tag = "Organization",
    security(("bearerAuth" = [])),
    params(("position_id" = i64, Path, description = "Position id")),
    responses(
        (status = 204, description = "Position and its subordinates removed"),
        (status = 404, description = "Position not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_position(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(position_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.members().delete_position(&current.viewer, position_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
