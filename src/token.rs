use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifetime of an access token, counted from `issued_at`.
///
/// The session cookie carries the same max-age.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Access/refresh credential pair issued by the API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds at which the pair was received.
    pub issued_at: i64,
}

impl TokenPair {
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at,
        }
    }

    /// Build a pair from a token response received at `now`.
    #[must_use]
    pub fn issue(response: TokenResponse, now: i64) -> Self {
        Self::new(response.access_token, response.refresh_token, now)
    }

    /// Unix second at which the access token stops being valid.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.issued_at.saturating_add(ACCESS_TOKEN_TTL_SECS)
    }

    /// `true` once `now >= issued_at + ttl`.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at()
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Body of `/token` and `/token/refresh` responses.
#[derive(Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}
