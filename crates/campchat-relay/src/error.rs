//! Error types for the relay

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campchat_contracts::ErrorBody;
use thiserror::Error;

/// Relay error types. The `Display` text is what the caller sees.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Rate limit exceeded. Please try again shortly.")]
    RateLimited,

    #[error("Service temporarily unavailable.")]
    PaymentRequired,

    /// Status and body stay server-side.
    #[error("AI service error")]
    Upstream { status: u16, body: String },

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            RelayError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::Upstream { .. }
            | RelayError::Configuration(_)
            | RelayError::InvalidRequest(_)
            | RelayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::RateLimited => "rate_limited",
            RelayError::PaymentRequired => "payment_required",
            RelayError::Upstream { .. } => "upstream_error",
            RelayError::Configuration(_) => "configuration",
            RelayError::InvalidRequest(_) => "invalid_request",
            RelayError::Unauthorized => "unauthorized",
            RelayError::Transport(_) => "transport_error",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
