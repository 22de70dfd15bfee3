use serde::{Deserialize, Serialize};

use crate::token::TokenPair;
use crate::types::{PrincipalId, Roles};

/// Error marker carried by a session that can no longer be renewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionError {
    RefreshFailed,
}

/// Everything the signed session cookie holds.
///
/// Minted on sign-in, mutated on refresh, dropped on sign-out. Once `error`
/// is set the artifact is treated as signed-out by the route guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionArtifact {
    pub principal_id: PrincipalId,
    #[serde(default)]
    pub roles: Roles,
    pub tokens: TokenPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl SessionArtifact {
    #[must_use]
    pub fn mint(principal_id: PrincipalId, roles: Roles, tokens: TokenPair) -> Self {
        Self {
            principal_id,
            roles,
            tokens,
            error: None,
        }
    }

    /// Access token expired and no error recorded yet.
    #[must_use]
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.error.is_none() && self.tokens.is_expired_at(now)
    }

    /// Usable for authorization: no error marker and an unexpired access token.
    #[must_use]
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.error.is_none() && !self.tokens.is_expired_at(now)
    }

    pub fn apply_refresh(&mut self, tokens: TokenPair) {
        self.tokens = tokens;
        self.error = None;
    }

    pub fn mark_refresh_failed(&mut self) {
        self.error = Some(SessionError::RefreshFailed);
    }

    /// Cookie payload.
    ///
    /// # Errors
    ///
    /// Only if serialization fails, which the field types rule out in practice.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a cookie payload; `None` for anything that isn't a current artifact.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ACCESS_TOKEN_TTL_SECS;

    fn artifact(issued_at: i64) -> SessionArtifact {
        SessionArtifact::mint(
            PrincipalId::from("u-1"),
            ["user"].into_iter().collect(),
            TokenPair::new("acc", "ref", issued_at),
        )
    }

    #[test]
    fn fresh_artifact_is_valid() {
        let a = artifact(100);
        assert!(a.is_valid_at(100));
        assert!(!a.needs_refresh(100 + ACCESS_TOKEN_TTL_SECS - 1));
        assert!(a.needs_refresh(100 + ACCESS_TOKEN_TTL_SECS));
    }

    #[test]
    fn failed_artifact_never_asks_for_refresh() {
        let mut a = artifact(0);
        a.mark_refresh_failed();
        assert!(!a.needs_refresh(ACCESS_TOKEN_TTL_SECS * 10));
        assert!(!a.is_valid_at(0));
    }

    #[test]
    fn apply_refresh_replaces_tokens() {
        let mut a = artifact(0);
        a.apply_refresh(TokenPair::new("acc2", "ref2", 5_000));
        assert_eq!(a.tokens.refresh_token, "ref2");
        assert!(a.is_valid_at(5_000));
    }

    #[test]
    fn cookie_payload_roundtrip() {
        let mut a = artifact(7);
        a.mark_refresh_failed();
        let raw = a.encode().unwrap();
        assert!(raw.contains(r#""error":"refresh_failed""#));
        assert_eq!(SessionArtifact::decode(&raw), Some(a));
    }

    #[test]
    fn garbage_payload_is_no_session() {
        assert!(SessionArtifact::decode("not json").is_none());
        assert!(SessionArtifact::decode(r#"{"principal_id":"u"}"#).is_none());
    }
}
