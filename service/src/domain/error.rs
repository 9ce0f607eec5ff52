use crate::domain::repository::RepositoryError;

/// Failures surfaced by the domain services to their callers
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("authentication required")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage temporarily unavailable: {0}")]
    TransientStorage(String),
}

impl ServiceError {
    /// True for failures worth retrying later
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::TransientStorage(_))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::UniqueViolation(cause) => ServiceError::Conflict(cause),
            RepositoryError::ValidationFailed(cause) => ServiceError::Validation(cause),
            RepositoryError::Timeout => {
                ServiceError::TransientStorage("storage call timed out".to_string())
            }
            RepositoryError::DatabaseError(cause) => ServiceError::TransientStorage(cause),
        }
    }
}
