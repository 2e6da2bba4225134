use spk_access::AccessError;
use spk_database::{DatabaseError, ValidationErrors};
use thiserror::Error;

use crate::status::SurveyStatus;

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("survey is not accepting responses ({})", .0.label())]
    NotAccepting(SurveyStatus),
    #[error("survey already answered")]
    AlreadyResponded,
    #[error("survey has responses and can no longer be edited")]
    Locked,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<ValidationErrors> for SurveyError {
    fn from(errors: ValidationErrors) -> Self {
        SurveyError::Validation(errors)
    }
}

pub type SurveyResult<T> = Result<T, SurveyError>;
