use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors raised by the middleware layer itself.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable session on a request that needs one.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Signed in without the required role.
    #[error("Forbidden")]
    Forbidden,

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session cookie could not be written.
    #[error("Session encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, self.to_string()).into_response(),
            Self::Config(_) | Self::Encode(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<crate::error::Error> for AuthError {
    fn from(e: crate::error::Error) -> Self {
        match e {
            crate::error::Error::Unauthorized => Self::Forbidden,
            _ => Self::Unauthenticated,
        }
    }
}

