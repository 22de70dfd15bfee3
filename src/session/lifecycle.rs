use std::sync::Arc;

use super::artifact::SessionArtifact;
use super::refresh::Refresher;
use crate::client::ApiClient;

/// Artifact after revalidation, and whether the cookie must be rewritten.
#[derive(Debug, Clone)]
pub struct Revalidated {
    pub artifact: SessionArtifact,
    pub changed: bool,
}

/// Per-request revalidation: refresh on expiry, mark the session on failure.
pub struct SessionLifecycle {
    refresher: Refresher,
}

impl SessionLifecycle {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            refresher: Refresher::new(api),
        }
    }

    /// Bring `artifact` up to date as of `now`.
    ///
    /// Unexpired and already-errored artifacts come back untouched. An expired
    /// one gets exactly one refresh attempt; a failure marks it
    /// `refresh_failed` instead of returning an error.
    pub async fn revalidate(&self, mut artifact: SessionArtifact, now: i64) -> Revalidated {
        if !artifact.needs_refresh(now) {
            return Revalidated {
                artifact,
                changed: false,
            };
        }

        match self
            .refresher
            .refresh(&artifact.principal_id, &artifact.tokens)
            .await
        {
            Ok(tokens) => {
                tracing::debug!(principal_id = %artifact.principal_id, "Access token refreshed");
                artifact.apply_refresh(tokens);
            }
            Err(e) => {
                tracing::warn!(
                    principal_id = %artifact.principal_id,
                    error = %e,
                    "Access token refresh failed, session needs re-authentication"
                );
                artifact.mark_refresh_failed();
            }
        }

        Revalidated {
            artifact,
            changed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::ApiConfig;
    use crate::session::artifact::SessionError;
    use crate::session::guard::{GuardState, RouteTable};
    use crate::session::projection::project;
    use crate::token::{ACCESS_TOKEN_TTL_SECS, TokenPair, unix_now};
    use crate::types::PrincipalId;

    fn lifecycle_for(server: &MockServer) -> SessionLifecycle {
        SessionLifecycle::new(Arc::new(ApiClient::new(ApiConfig::new(
            server.uri().parse().unwrap(),
        ))))
    }

    fn artifact(issued_at: i64) -> SessionArtifact {
        SessionArtifact::mint(
            PrincipalId::from("u-1"),
            ["user"].into_iter().collect(),
            TokenPair::new("acc-1", "ref-1", issued_at),
        )
    }

    #[tokio::test]
    async fn fresh_artifact_is_left_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/refresh"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let now = unix_now();
        let out = lifecycle_for(&server).revalidate(artifact(now), now).await;
        assert!(!out.changed);
        assert_eq!(out.artifact, artifact(now));
    }

    #[tokio::test]
    async fn expired_artifact_refreshes_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "acc-2",
                "refresh_token": "ref-2",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let now = unix_now();
        let stale = artifact(now - ACCESS_TOKEN_TTL_SECS);
        let out = lifecycle_for(&server).revalidate(stale, now).await;

        assert!(out.changed);
        assert_eq!(out.artifact.tokens.access_token, "acc-2");
        assert!(out.artifact.is_valid_at(unix_now()));
    }

    #[tokio::test]
    async fn revoked_refresh_marks_session_and_guard_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let lifecycle = lifecycle_for(&server);
        let now = unix_now();
        let out = lifecycle
            .revalidate(artifact(now - 2 * ACCESS_TOKEN_TTL_SECS), now)
            .await;
        assert_eq!(out.artifact.error, Some(SessionError::RefreshFailed));

        let view = project(&out.artifact);
        assert_eq!(
            RouteTable::default().evaluate("/dashboard", Some(&view)),
            Some(GuardState::Unauthenticated)
        );

        // a marked session is not retried
        let again = lifecycle.revalidate(out.artifact, now).await;
        assert!(!again.changed);
    }
}
