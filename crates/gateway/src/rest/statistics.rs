use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::statistics::Dashboard;

pub fn create_statistics_routes() -> Router<AppState> {
    Router::new().route("/api/statistics", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/statistics",
    tag = "Statistics",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Member, ticket, post and survey aggregates within the caller's scope"),
        (status = 403, description = "Missing stats.view", body = crate::error::ErrorResponse)
    )
)]
pub async fn dashboard(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.statistics().dashboard(&current.viewer, Utc::now()).await?))
}
