//! Complaint ticket endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use spk_database::{CreateTicketRequest, Paged, TicketReply, TicketStatus};
use spk_tickets::{ReplyRequest, TicketDetail, TicketQuery, TicketView};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::rest::PageParams;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsParams {
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub assigned_to_me: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTicketRequest {
    pub assignee_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: TicketStatus,
}

pub fn create_ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/:ticket_id", get(get_ticket))
        .route("/api/tickets/:ticket_id/replies", post(reply_ticket))
        .route("/api/tickets/:ticket_id/assign", post(assign_ticket))
        .route("/api/tickets/:ticket_id/status", post(change_ticket_status))
}

#[utoipa::path(
    get,
    path = "/api/tickets",
    tag = "Tickets",
    security(("bearerAuth" = [])),
    params(
        ("status" = Option<String>, Query, description = "open, in_progress, resolved or closed"),
        ("assigned_to_me" = Option<bool>, Query, description = "Only tickets assigned to the caller"),
        PageParams
    ),
    responses(
        (status = 200, description = "All tickets for staff, own tickets otherwise"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<Paged<TicketView>>, ApiError> {
    let page = PageParams { limit: params.limit, offset: params.offset }.page();
    let query = TicketQuery {
        status: params.status,
        assigned_to_me: params.assigned_to_me,
    };
    Ok(Json(state.tickets().list(&current.viewer, &query, page).await?))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    tag = "Tickets",
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Ticket filed and numbered"),
        (status = 422, description = "Subject or description invalid", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketView>), ApiError> {
    let ticket = state.tickets().create(&current.viewer, req).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{ticket_id}",
    tag = "Tickets",
    security(("bearerAuth" = [])),
    params(("ticket_id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket with replies and the statuses the caller may choose"),
        (status = 403, description = "Not the reporter and not staff", body = crate::error::ErrorResponse),
        (status = 404, description = "Ticket not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(ticket_id): Path<i64>,
) -> Result<Json<TicketDetail>, ApiError> {
    Ok(Json(state.tickets().get(&current.viewer, ticket_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{ticket_id}/replies",
    tag = "Tickets",
    security(("bearerAuth" = [])),
    params(("ticket_id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 201, description = "Reply added"),
        (status = 409, description = "Ticket is closed", body = crate::error::ErrorResponse)
    )
)]
pub async fn reply_ticket(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(ticket_id): Path<i64>,
    Json(req): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<TicketReply>), ApiError> {
    let reply = state.tickets().reply(&current.viewer, ticket_id, req).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{ticket_id}/assign",
    tag = "Tickets",
    security(("bearerAuth" = [])),
    params(("ticket_id" = i64, Path, description = "Ticket id")),
    request_body = AssignTicketRequest,
    responses(
        (status = 200, description = "Ticket assigned"),
        (status = 403, description = "Missing ticket.assign", body = crate::error::ErrorResponse),
        (status = 422, description = "Assignee cannot handle tickets", body = crate::error::ErrorResponse)
    )
)]
pub async fn assign_ticket(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(ticket_id): Path<i64>,
    Json(req): Json<AssignTicketRequest>,
) -> Result<Json<TicketView>, ApiError> {
    let ticket = state.tickets().assign(&current.viewer, ticket_id, req.assignee_id).await?;
    Ok(Json(ticket))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{ticket_id}/status",
    tag = "Tickets",
    security(("bearerAuth" = [])),
    params(("ticket_id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Status changed"),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_ticket_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(ticket_id): Path<i64>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<TicketView>, ApiError> {
    let ticket = state
        .tickets()
        .change_status(&current.viewer, ticket_id, req.status)
        .await?;
    Ok(Json(ticket))
}
