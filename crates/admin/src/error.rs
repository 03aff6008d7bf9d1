//! Unified error handling for the dashboard.

use schoolsoft_core::UserId;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::forms::ValidationErrors;
use crate::invoice::InvoiceError;
use crate::session::{SessionError, StorageError};

/// Application-level error type for dashboard front-ends.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// No usable session.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Form input rejected before submission.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    /// Invoice could not be generated or printed.
    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::Session(SessionError::Storage(err))
    }
}

impl AppError {
    /// Whether this is our fault (or the backend's) rather than the user's.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Api(e) => e.is_server_side(),
            Self::Session(SessionError::Storage(_)) | Self::Internal(_) => true,
            _ => false,
        }
    }

    /// Log the error, sending server-side failures to Sentry.
    pub fn report(&self) {
        if self.is_server_side() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Dashboard error"
            );
        } else {
            tracing::warn!(error = %self, "Dashboard request rejected");
        }
    }

    /// Message safe to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Unauthorized) | Self::Session(SessionError::Expired) => {
                "Session expired, please sign in again".to_string()
            }
            Self::Session(SessionError::NotSignedIn) => "Please sign in".to_string(),
            Self::Internal(_) | Self::Session(SessionError::Storage(_)) => {
                "Internal error".to_string()
            }
            Self::Api(e) if e.is_server_side() => "The server could not be reached".to_string(),
            Self::Validation(errors) => errors
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => self.to_string(),
        }
    }
}

/// Set the Sentry user context from the signed-in user.
pub fn set_sentry_user(user_id: UserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
