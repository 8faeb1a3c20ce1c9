use thiserror::Error;
use tokio::io;

use crate::storage::StorageError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP 401, or a download attempted without a token.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    /// The request never reached the backend (refused connection, DNS, TLS).
    #[error("{0}")]
    NetworkUnreachable(String),
    #[error("{0}")]
    EmptyFile(String),
    /// Client-side check that failed before any request was built.
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("A submission is already in progress")]
    SubmissionInProgress,
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Prompt(#[from] dialoguer::Error),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Field name carried by a validation failure, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ServiceError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized(_))
    }
}
