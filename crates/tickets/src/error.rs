use spk_access::AccessError;
use spk_database::{DatabaseError, TicketStatus, ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("cannot move a ticket from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition { from: TicketStatus, to: TicketStatus },
    #[error("ticket is closed")]
    Closed,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<ValidationErrors> for TicketError {
    fn from(errors: ValidationErrors) -> Self {
        TicketError::Validation(errors)
    }
}

pub type TicketResult<T> = Result<T, TicketError>;
