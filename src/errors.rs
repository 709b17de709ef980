use thiserror::Error;

use crate::repositories::RepositoryError;

/// Failure taxonomy shared by every operation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("sign in required.")]
    Unauthenticated,

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cannot find {0}.")]
    NotFound(&'static str),

    #[error("read failed: {0}")]
    Read(#[source] RepositoryError),

    #[error("write failed: {0}")]
    Write(#[source] RepositoryError),

    #[error("subscription failed: {0}")]
    Subscription(String),

    #[error("storage failed: {0}")]
    Storage(#[source] anyhow::Error),
}

pub type Result<T, E = AppError> = ::core::result::Result<T, E>;

impl AppError {
    /// Short text suitable for a transient notice.
    pub fn notice(&self) -> String {
        match self {
            AppError::Unauthenticated => "Please sign in to continue".to_string(),
            AppError::Forbidden(_) => "You can't do that".to_string(),
            AppError::Validation(m) => m.clone(),
            AppError::NotFound(what) => format!("{} not found", what),
            AppError::Read(_) | AppError::Subscription(_) => "Failed to load".to_string(),
            AppError::Write(_) | AppError::Storage(_) => "Something went wrong".to_string(),
        }
    }
}
