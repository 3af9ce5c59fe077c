//! Dispatch Error Types
//!
//! Command-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Callers branch on [`DispatchError::kind`],
//! never on message text.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Dispatch-specific result type alias
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Dispatch-specific error variants
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No authenticated principal attached to the call
    #[error("Authentication required")]
    Unauthenticated,

    /// Payload rejected by the validator. The reason is user-facing text.
    #[error("{reason}")]
    ValidationFailed { field: &'static str, reason: String },

    /// Per-principal quota exhausted
    #[error("{}", rate_limit_message(*max_requests, *window_secs))]
    RateLimited { max_requests: u32, window_secs: u64 },

    /// Provider could not be reached or did not answer in time
    #[error("{}", message.as_deref().unwrap_or("Provider unavailable"))]
    ProviderUnavailable { message: Option<String> },

    /// Provider answered with an error
    #[error("{}", provider_message.as_deref().unwrap_or("Provider rejected the request"))]
    ProviderRejected { provider_message: Option<String> },

    /// Provider answered successfully but had nothing usable
    #[error("{message}")]
    NotFound { message: String },

    /// Command name not recognised
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn rate_limit_message(max_requests: u32, window_secs: u64) -> String {
    if window_secs == 60 {
        format!("Rate limit exceeded. Maximum {max_requests} emails per minute")
    } else {
        format!("Rate limit exceeded. Maximum {max_requests} emails per {window_secs} seconds")
    }
}

impl DispatchError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        DispatchError::ValidationFailed {
            field,
            reason: reason.into(),
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Unauthenticated => ErrorKind::Unauthorized,
            DispatchError::ValidationFailed { .. } => ErrorKind::BadRequest,
            DispatchError::RateLimited { .. } => ErrorKind::TooManyRequests,
            DispatchError::ProviderUnavailable { .. } => ErrorKind::ServiceUnavailable,
            DispatchError::ProviderRejected { .. } => ErrorKind::BadGateway,
            DispatchError::NotFound { .. } | DispatchError::UnknownCommand(_) => {
                ErrorKind::NotFound
            }
            DispatchError::Database(_) | DispatchError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Fill in a command-specific message for provider failures that carried none.
    pub fn or_provider_fallback(self, fallback: &str) -> Self {
        match self {
            DispatchError::ProviderUnavailable { message } => DispatchError::ProviderUnavailable {
                message: non_blank(message).or_else(|| Some(fallback.to_string())),
            },
            DispatchError::ProviderRejected { provider_message } => {
                DispatchError::ProviderRejected {
                    provider_message: non_blank(provider_message)
                        .or_else(|| Some(fallback.to_string())),
                }
            }
            other => other,
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            DispatchError::Database(_) | DispatchError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.public_message());
        match self {
            DispatchError::Unauthenticated => err.with_action("Please log in and try again"),
            DispatchError::RateLimited { .. } => {
                err.with_action("Too many emails sent. Please wait a minute.")
            }
            DispatchError::ProviderUnavailable { .. } => {
                err.with_action("Service temporarily unavailable. Please try again.")
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            DispatchError::Database(e) => {
                tracing::error!(error = %e, "Dispatch database error");
            }
            DispatchError::Internal(msg) => {
                tracing::error!(message = %msg, "Dispatch internal error");
            }
            DispatchError::ProviderUnavailable { .. } => {
                tracing::error!(error = %self, "Provider unavailable");
            }
            DispatchError::ProviderRejected { .. } => {
                tracing::warn!(error = %self, "Provider rejected request");
            }
            DispatchError::RateLimited { .. } => {
                tracing::warn!("Email rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Dispatch error");
            }
        }
    }
}

fn non_blank(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
