use spk_database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("invalid permission key: {0}")]
    InvalidKey(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("missing permission {0}")]
    MissingPermission(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("system role '{0}' cannot be renamed or deleted")]
    SystemRole(String),
    #[error("the Super Admin permission set cannot be changed")]
    SuperAdminImmutable,
    #[error("the last Super Admin cannot be revoked")]
    LastSuperAdmin,
    #[error("{0}")]
    Validation(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for AccessError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Duplicate(message) => AccessError::Duplicate(message),
            other => AccessError::Database(other),
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;
