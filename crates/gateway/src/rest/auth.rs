//! Authentication REST endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use spk_access::MemberScope;
use spk_auth::{AuthSession, Registration, User};
use spk_database::{validation::is_valid_email, ValidationErrors};
use spk_members::MemberView;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Role granted to every self-registered account.
const DEFAULT_ROLE: &str = spk_access::hierarchy::ANGGOTA;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address or username.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: String,
}

impl SessionResponse {
    pub fn new(session: AuthSession, user: User) -> Self {
        Self {
            token: session.token,
            user: user.into(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.public_id,
            email: value.email,
            username: value.username,
            display_name: value.display_name,
        }
    }
}

/// The signed-in user together with what they may do.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub highest_level: u8,
    pub member_scope: MemberScope,
    pub member: Option<MemberView>,
}

pub fn create_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/password", put(change_password))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 409, description = "Email or username already taken", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid registration", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let mut errors = ValidationErrors::new();
    errors.required("email", &req.email, "Email");
    if !req.email.trim().is_empty() && !is_valid_email(req.email.trim()) {
        errors.add("email", "Format email tidak valid");
    }
    errors.into_result()?;

    let registration = Registration {
        email: req.email,
        password: req.password,
        username: req.username,
        display_name: req.display_name,
    };
    let user = state.authenticator().register_with_password(&registration).await?;
    state.access().grant_system_role(user.id, DEFAULT_ROLE).await?;

    let session = state
        .authenticator()
        .login_with_password(&registration.email, &registration.password)
        .await?;
    info!(user = %user.public_id, "account registered");

    Ok((StatusCode::CREATED, Json(SessionResponse::new(session, user))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Account disabled", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.authenticator().login_with_password(&req.login, &req.password).await?;
    let user = state.authenticator().user_profile(session.user_id).await?;
    Ok(Json(SessionResponse::new(session, user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Result<StatusCode, ApiError> {
    state.authenticator().logout(&current.session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current user, roles, permissions and member profile"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(State(state): State<AppState>, current: CurrentUser) -> Result<Json<MeResponse>, ApiError> {
    let member = state.members().own_profile(&current.viewer).await?;
    let viewer = current.viewer;

    Ok(Json(MeResponse {
        highest_level: viewer.highest_level(),
        member_scope: viewer.member_scope(),
        permissions: viewer.permissions.into_iter().collect(),
        roles: viewer.roles,
        user: current.user.into(),
        member,
    }))
}

#[utoipa::path(
    put,
    path = "/api/auth/password",
    tag = "Auth",
    security(("bearerAuth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Current password is wrong", body = crate::error::ErrorResponse),
        (status = 422, description = "New password too weak", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .authenticator()
        .change_password(current.user.id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
