//! Error taxonomy for everything that talks to the backend

use serde::Deserialize;

use crate::core::auth::StoreError;
use crate::core::validation::ValidationError;

use super::transport::TransportError;

/// Fallback message when the backend does not send `{error:{message}}`
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rejected on the client, never sent
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Backend rejected the credentials or the token
    #[error("{0}")]
    Auth(String),

    /// Transport or connectivity failure
    #[error("Network error: {0}")]
    Network(String),

    /// Token refresh failed; the session has been cleared
    #[error("Session expired, please sign in again")]
    AuthorizationExpired,

    /// Any other non-success response
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Session storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl ApiError {
    /// Whether the caller must send the user back to the login surface
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, ApiError::AuthorizationExpired)
    }

    /// Short text for a view. Validation and auth messages are shown verbatim,
    /// everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Auth(message) => message.clone(),
            ApiError::Http { message, .. } if message != GENERIC_ERROR_MESSAGE => message.clone(),
            ApiError::AuthorizationExpired => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull `error.message` out of an error body, falling back to a generic message
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}
