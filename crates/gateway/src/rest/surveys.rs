//! Survey endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use spk_database::{Paged, SurveyFields};
use spk_surveys::{ResponseRequest, SurveyDetail, SurveyResults, SurveyView};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::rest::PageParams;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    /// `false` takes the survey back to draft.
    #[serde(default = "published_default")]
    pub published: bool,
}

fn published_default() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseCreated {
    pub response_id: i64,
}

pub fn create_survey_routes() -> Router<AppState> {
    Router::new()
        .route("/api/surveys", get(list_surveys).post(create_survey))
        .route(
            "/api/surveys/:survey_id",
            get(get_survey).put(update_survey).delete(delete_survey),
        )
        .route("/api/surveys/:survey_id/publish", post(publish_survey))
        .route("/api/surveys/:survey_id/responses", post(respond_survey))
        .route("/api/surveys/:survey_id/results", get(survey_results))
}

#[utoipa::path(
    get,
    path = "/api/surveys",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Surveys with derived status; drafts only for survey managers"),
        (status = 403, description = "Missing survey.view", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_surveys(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Paged<SurveyView>>, ApiError> {
    Ok(Json(state.surveys().list(&current.viewer, params.page()).await?))
}

#[utoipa::path(
    post,
    path = "/api/surveys",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Survey created as draft"),
        (status = 422, description = "Invalid survey or questions", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_survey(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(fields): Json<SurveyFields>,
) -> Result<(StatusCode, Json<SurveyView>), ApiError> {
    let survey = state.surveys().create(&current.viewer, fields).await?;
    Ok((StatusCode::CREATED, Json(survey)))
}

#[utoipa::path(
    get,
    path = "/api/surveys/{survey_id}",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    params(("survey_id" = i64, Path, description = "Survey id")),
    responses(
        (status = 200, description = "Survey with its questions and whether the caller responded"),
        (status = 404, description = "Survey not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_survey(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(survey_id): Path<i64>,
) -> Result<Json<SurveyDetail>, ApiError> {
    Ok(Json(state.surveys().get(&current.viewer, survey_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/surveys/{survey_id}",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    params(("survey_id" = i64, Path, description = "Survey id")),
    responses(
        (status = 200, description = "Survey and questions replaced"),
        (status = 409, description = "Survey already collected responses", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_survey(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(survey_id): Path<i64>,
    Json(fields): Json<SurveyFields>,
) -> Result<Json<SurveyView>, ApiError> {
    Ok(Json(state.surveys().update(&current.viewer, survey_id, fields).await?))
}

#[utoipa::path(
    delete,
    path = "/api/surveys/{survey_id}",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    params(("survey_id" = i64, Path, description = "Survey id")),
    responses(
        (status = 204, description = "Survey deleted"),
        (status = 404, description = "Survey not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_survey(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(survey_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.surveys().delete(&current.viewer, survey_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/surveys/{survey_id}/publish",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    params(("survey_id" = i64, Path, description = "Survey id")),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Publish flag changed"),
        (status = 422, description = "Survey has no questions", body = crate::error::ErrorResponse)
    )
)]
pub async fn publish_survey(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(survey_id): Path<i64>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<SurveyView>, ApiError> {
    let survey = state
        .surveys()
        .set_published(&current.viewer, survey_id, req.published)
        .await?;
    Ok(Json(survey))
}

#[utoipa::path(
    post,
    path = "/api/surveys/{survey_id}/responses",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    params(("survey_id" = i64, Path, description = "Survey id")),
    responses(
        (status = 201, description = "Response recorded", body = ResponseCreated),
        (status = 409, description = "Survey not active or already answered", body = crate::error::ErrorResponse),
        (status = 422, description = "Missing or invalid answers", body = crate::error::ErrorResponse)
    )
)]
pub async fn respond_survey(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(survey_id): Path<i64>,
    Json(req): Json<ResponseRequest>,
) -> Result<(StatusCode, Json<ResponseCreated>), ApiError> {
    let response_id = state.surveys().respond(&current.viewer, survey_id, &req).await?;
    Ok((StatusCode::CREATED, Json(ResponseCreated { response_id })))
}

#[utoipa::path(
    get,
    path = "/api/surveys/{survey_id}/results",
    tag = "Surveys",
    security(("bearerAuth" = [])),
    params(("survey_id" = i64, Path, description = "Survey id")),
    responses(
        (status = 200, description = "Per-question counts, rating averages and text answers"),
        (status = 403, description = "Missing survey.results", body = crate::error::ErrorResponse)
    )
)]
pub async fn survey_results(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(survey_id): Path<i64>,
) -> Result<Json<SurveyResults>, ApiError> {
    Ok(Json(state.surveys().results(&current.viewer, survey_id).await?))
}
