use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::AuthError;
use crate::session::{SessionView, require_admin};

/// Session of the signed-in principal, as placed by the route guard.
///
/// Only available on guarded routes. Returns `401 Unauthorized` otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(CurrentSession(session): CurrentSession) -> impl IntoResponse {
///     format!("Hello, {}", session.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionView);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionView>()
            .filter(|view| view.is_signed_in())
            .cloned()
            .map(Self)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Like [`CurrentSession`], but rejects with `403 Forbidden` unless the
/// principal holds the admin role.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionView);

impl<S: Send + Sync> FromRequestParts<S> for AdminSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(view) = CurrentSession::from_request_parts(parts, state).await?;
        require_admin(&view)?;
        Ok(Self(view))
    }
}
