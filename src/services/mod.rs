//! Application services orchestrating domain logic and side effects.
pub mod profiles;

use crate::forms::profile::FormError;
use crate::repository::RepositoryError;
use crate::storage::StorageError;

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid upload form: {0}")]
    InvalidForm(FormError),
    #[error("failed to read uploaded file")]
    ReadUpload(#[source] std::io::Error),
    #[error("media storage failed")]
    Storage(#[from] StorageError),
    #[error("profile repository failed")]
    Repository(#[from] RepositoryError),
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Read(err) => ServiceError::ReadUpload(err),
            other => ServiceError::InvalidForm(other),
        }
    }
}

impl ServiceError {
    /// Whether the error stems from user input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::InvalidForm(_))
    }
}
