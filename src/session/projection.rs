use serde::Serialize;

use super::artifact::{SessionArtifact, SessionError};
use crate::types::{PrincipalId, Roles};

/// What page code may see of a session. The refresh token is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub id: PrincipalId,
    pub roles: Roles,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl SessionView {
    /// An errored session counts as signed-out.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.error.is_none()
    }
}

/// Derive the view of an artifact as it stands.
#[must_use]
pub fn project(artifact: &SessionArtifact) -> SessionView {
    SessionView {
        id: artifact.principal_id.clone(),
        roles: artifact.roles.clone(),
        access_token: artifact.tokens.access_token.clone(),
        error: artifact.error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenPair;

    const REFRESH: &str = "refresh-token-value-4f1c";

    fn artifact() -> SessionArtifact {
        SessionArtifact::mint(
            PrincipalId::from("u-1"),
            ["admin", "user"].into_iter().collect(),
            TokenPair::new("access-token-value", REFRESH, 0),
        )
    }

    #[test]
    fn view_exposes_id_roles_and_access_token() {
        let view = project(&artifact());
        assert_eq!(view.id, PrincipalId::from("u-1"));
        assert!(view.roles.is_admin());
        assert_eq!(view.access_token, "access-token-value");
        assert!(view.is_signed_in());
    }

    #[test]
    fn refresh_token_never_leaks() {
        let mut failed = artifact();
        failed.mark_refresh_failed();

        for a in [artifact(), failed] {
            let view = project(&a);
            let json = serde_json::to_string(&view).unwrap();
            assert!(!json.contains(REFRESH));
            assert!(!json.contains("refresh_token"));
            assert!(!format!("{view:?}").contains(REFRESH));
        }
    }

    #[test]
    fn error_marker_is_carried() {
        let mut a = artifact();
        a.mark_refresh_failed();
        let view = project(&a);
        assert_eq!(view.error, Some(SessionError::RefreshFailed));
        assert!(!view.is_signed_in());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["error"], "refresh_failed");
    }

    #[test]
    fn projection_is_deterministic() {
        let a = artifact();
        assert_eq!(project(&a), project(&a));
    }
}
