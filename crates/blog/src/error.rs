use spk_access::AccessError;
use spk_database::{DatabaseError, ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for BlogError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Duplicate(message) => BlogError::Duplicate(message),
            other => BlogError::Database(other),
        }
    }
}

impl From<ValidationErrors> for BlogError {
    fn from(errors: ValidationErrors) -> Self {
        BlogError::Validation(errors)
    }
}

pub type BlogResult<T> = Result<T, BlogError>;
