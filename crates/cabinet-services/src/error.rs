use cabinet_core::{AppError, ObjectStorageProvider};
use thiserror::Error;

/// Errors raised by the object-storage adapters.
///
/// Every variant except `InvalidArgument` names the provider that produced it.
#[derive(Debug, Error)]
pub enum ObjectStorageError {
    /// Rejected before any remote call was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{provider}: {resource} not found")]
    NotFound {
        provider: ObjectStorageProvider,
        resource: String,
    },

    /// The provider call failed; these are the only errors that get retried.
    #[error("{provider} {operation} failed: {message}")]
    Backend {
        provider: ObjectStorageProvider,
        operation: String,
        message: String,
    },
}

pub type ObjectStorageResult<T> = Result<T, ObjectStorageError>;

impl ObjectStorageError {
    pub fn backend(
        provider: ObjectStorageProvider,
        operation: &str,
        message: impl Into<String>,
    ) -> Self {
        ObjectStorageError::Backend {
            provider,
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(provider: ObjectStorageProvider, resource: impl Into<String>) -> Self {
        ObjectStorageError::NotFound {
            provider,
            resource: resource.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ObjectStorageError::Backend { .. })
    }

    /// Provider label (`garage`, `oxicloud`, `minio`, `lakefs`), if known.
    pub fn provider(&self) -> Option<ObjectStorageProvider> {
        match self {
            ObjectStorageError::InvalidArgument(_) => None,
            ObjectStorageError::NotFound { provider, .. }
            | ObjectStorageError::Backend { provider, .. } => Some(*provider),
        }
    }
}

impl From<validator::ValidationErrors> for ObjectStorageError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ObjectStorageError::InvalidArgument(errors.to_string())
    }
}

impl From<ObjectStorageError> for AppError {
    fn from(error: ObjectStorageError) -> Self {
        let message = error.to_string();
        match error {
            ObjectStorageError::InvalidArgument(msg) => AppError::BadRequest(msg),
            ObjectStorageError::NotFound { .. } => AppError::NotFound(message),
            ObjectStorageError::Backend { .. } => AppError::Storage(message),
        }
    }
}
