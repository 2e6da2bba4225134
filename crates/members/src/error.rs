use spk_access::AccessError;
use spk_database::{DatabaseError, ValidationErrors};
use thiserror::Error;

use crate::upload::UploadError;

#[derive(Debug, Error)]
pub enum MemberError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for MemberError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Duplicate(message) => MemberError::Duplicate(message),
            other => MemberError::Database(other),
        }
    }
}

impl From<ValidationErrors> for MemberError {
    fn from(errors: ValidationErrors) -> Self {
        MemberError::Validation(errors)
    }
}

pub type MemberResult<T> = Result<T, MemberError>;
