//! Error types for the chat client

use thiserror::Error;

/// Why a chat turn could not be streamed
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Relay error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse failure classes shown to the session owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    PaymentRequired,
    UpstreamError,
    TransportError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::PaymentRequired => "payment_required",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::TransportError => "transport_error",
        }
    }
}

impl ChatError {
    /// Classify a non-success relay response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => ChatError::RateLimited(message),
            402 => ChatError::PaymentRequired(message),
            _ => ChatError::Upstream { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::RateLimited(_) => ErrorKind::RateLimited,
            ChatError::PaymentRequired(_) => ErrorKind::PaymentRequired,
            ChatError::Upstream { .. } => ErrorKind::UpstreamError,
            ChatError::Transport(_) | ChatError::Http(_) => ErrorKind::TransportError,
        }
    }
}

/// Malformed SSE input that could not be recovered by re-buffering.
/// Handled inside the assembler; never shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("SSE line still unparseable after {retries} retries ({bytes} bytes dropped)")]
    RetriesExhausted { retries: u32, bytes: usize },

    #[error("Partial SSE line exceeded {limit} bytes ({bytes} bytes dropped)")]
    LineTooLong { limit: usize, bytes: usize },
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;
