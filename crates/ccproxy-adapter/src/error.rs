use ccproxy_core::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Errors raised while adapting one request
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Request body is not a well-formed messages request
    #[error("bad request: {0}")]
    InvalidRequest(String),

    /// Request uses a feature the backend cannot honor
    #[error("request contains unsupported features: {feature}")]
    Unsupported { feature: &'static str },

    /// Completion backend failed after the stream was opened
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    /// Writing to the peer failed; the rest of the stream is abandoned
    #[error("failed to write event stream: {0}")]
    Transport(#[from] std::io::Error),

    /// An event was requested in a state that cannot produce it
    #[error("event emitted out of order: {0}")]
    OutOfOrder(&'static str),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for AdapterError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Unsupported { .. } => StatusCode::BAD_REQUEST,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Transport(_) | Self::OutOfOrder(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Unsupported { .. } => "unsupported_feature_error",
            Self::Backend(_) => "backend_error",
            Self::Transport(_) => "transport_error",
            Self::OutOfOrder(_) | Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

/// Errors reported by a completion backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response stream broke off or could not be decoded
    #[error("stream error: {0}")]
    Stream(String),
}
