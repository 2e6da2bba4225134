//! Mapping of domain failures onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use spk_access::AccessError;
use spk_auth::AuthError;
use spk_blog::BlogError;
use spk_database::{DatabaseError, ValidationErrors};
use spk_members::{MemberError, UploadError};
use spk_surveys::SurveyError;
use spk_tickets::TicketError;
use std::collections::BTreeMap;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::statistics::StatisticsError;

const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub fields: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Logs the underlying cause and hides it from the client.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        let fields = errors
            .fields()
            .map(|(field, message)| (field.to_string(), message.to_string()))
            .collect();
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "validation failed".to_string(),
            fields: Some(fields),
        }
    }

    fn with_field(mut self, field: &str, message: impl Into<String>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(field.to_string(), message.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if !self.status.is_server_error() {
            debug!(status = %self.status, error = %self.message, "request rejected");
        }
        let body = Json(ErrorResponse {
            error: self.message,
            fields: self.fields,
        });
        (self.status, body).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(what) => Self::not_found(format!("{what} not found")),
            DatabaseError::Duplicate(what) => Self::conflict(format!("{what} already exists")),
            other => Self::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => Self::unauthorized(error.to_string()),
            AuthError::AccountDisabled => Self::forbidden(error.to_string()),
            AuthError::UserExists => Self::conflict(error.to_string()),
            AuthError::WeakPassword(_) => {
                let message = error.to_string();
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation failed").with_field("password", message)
            }
            AuthError::Database(_) | AuthError::PasswordHash(_) => Self::internal(error),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::InvalidKey(_) => Self::bad_request(error.to_string()),
            AccessError::Validation(ref message) => {
                let message = message.clone();
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation failed").with_field("title", message)
            }
            AccessError::NotFound(_) => Self::not_found(error.to_string()),
            AccessError::MissingPermission(_) | AccessError::Forbidden(_) => {
                Self::forbidden(error.to_string())
            }
            AccessError::SystemRole(_)
            | AccessError::SuperAdminImmutable
            | AccessError::LastSuperAdmin
            | AccessError::Duplicate(_) => Self::conflict(error.to_string()),
            AccessError::Database(inner) => inner.into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Storage(_) => Self::internal(error),
            other => Self::new(StatusCode::UNPROCESSABLE_ENTITY, other.localized())
                .with_field("file", other.localized()),
        }
    }
}

impl From<MemberError> for ApiError {
    fn from(error: MemberError) -> Self {
        match error {
            MemberError::Validation(errors) => Self::validation(errors),
            MemberError::NotFound(_) => Self::not_found(error.to_string()),
            MemberError::Forbidden(_) => Self::forbidden(error.to_string()),
            MemberError::InvalidState(_) | MemberError::Duplicate(_) => Self::conflict(error.to_string()),
            MemberError::Access(inner) => inner.into(),
            MemberError::Upload(inner) => inner.into(),
            MemberError::Database(inner) => inner.into(),
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(error: TicketError) -> Self {
        match error {
            TicketError::Validation(errors) => Self::validation(errors),
            TicketError::NotFound(_) => Self::not_found(error.to_string()),
            TicketError::Forbidden(_) => Self::forbidden(error.to_string()),
            TicketError::InvalidTransition { .. } | TicketError::Closed => Self::conflict(error.to_string()),
            TicketError::Access(inner) => inner.into(),
            TicketError::Database(inner) => inner.into(),
        }
    }
}

impl From<BlogError> for ApiError {
    fn from(error: BlogError) -> Self {
        match error {
            BlogError::Validation(errors) => Self::validation(errors),
            BlogError::NotFound(_) => Self::not_found(error.to_string()),
            BlogError::Duplicate(_) => Self::conflict(error.to_string()),
            BlogError::Access(inner) => inner.into(),
            BlogError::Database(inner) => inner.into(),
        }
    }
}

impl From<SurveyError> for ApiError {
    fn from(error: SurveyError) -> Self {
        match error {
            SurveyError::Validation(errors) => Self::validation(errors),
            SurveyError::NotFound(_) => Self::not_found(error.to_string()),
            SurveyError::NotAccepting(_) | SurveyError::AlreadyResponded | SurveyError::Locked => {
                Self::conflict(error.to_string())
            }
            SurveyError::Access(inner) => inner.into(),
            SurveyError::Database(inner) => inner.into(),
        }
    }
}

impl From<StatisticsError> for ApiError {
    fn from(error: StatisticsError) -> Self {
        match error {
            StatisticsError::Access(inner) => inner.into(),
            StatisticsError::Survey(inner) => inner.into(),
            StatisticsError::Database(inner) => inner.into(),
        }
    }
}
