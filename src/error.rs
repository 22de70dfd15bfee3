/// Errors surfaced by credential exchange, refresh and the upstream API client.
///
/// None of these are meant to escape as faults: the middleware turns them into
/// redirects with [`Error::code`] or into a `refresh_failed` session marker.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The API rejected the email/password or the federated token.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Network failure or timeout talking to the API.
    #[cfg(feature = "client")]
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[source] reqwest::Error),

    /// The refresh token was rejected or the refresh call failed.
    #[error("Token refresh failed: {0}")]
    RefreshFailure(String),

    /// Authenticated, but the role check failed.
    #[error("Unauthorized")]
    Unauthorized,

    /// The API has no such resource.
    #[error("Not found: {0}")]
    NotFound(&'static str),

    /// Any other non-success answer from the API.
    #[error("Upstream {operation} failed (status {status:?}): {detail}")]
    Upstream {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },

    /// Input rejected before reaching the API.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Stable machine-readable code, used in `?error=` redirect parameters.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            #[cfg(feature = "client")]
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::RefreshFailure(_) => "refresh_failed",
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Upstream { .. } => "upstream_error",
            Self::Validation(_) => "validation",
        }
    }

    /// Whether the API answered with an authentication rejection (401/403).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::Upstream {
                    status: Some(401 | 403),
                    ..
                }
        )
    }
}
