//! Error types for the alba tracker backend.
//!
//! Every service and engine operation returns [`AppError`]. The HTTP layer
//! renders it through [`crate::response`] into the shared failure envelope.

use thiserror::Error;

use crate::model::work_log::{ShiftAction, ShiftStatus};

#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced shift, schedule, user or posting does not exist
    /// (or is not visible to the caller).
    #[error("{resource} not found")]
    NotFound {
        /// Kind of resource that was looked up.
        resource: &'static str,
    },

    /// Authenticated caller does not own the target resource.
    #[error("{0}")]
    Forbidden(String),

    /// The requested action is not legal from the current shift status.
    #[error("cannot {action} a shift that is {from}")]
    InvalidStateTransition {
        from: ShiftStatus,
        action: ShiftAction,
    },

    /// Malformed input.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid bearer credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Persistence or unexpected failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(resource: &'static str) -> Self {
        AppError::NotFound { resource }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Stable machine-readable code used in the failure envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
