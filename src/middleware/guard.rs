use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use super::cookies;
use super::error::AuthError;
use super::state::AuthState;
use crate::session::{GuardState, SessionArtifact, project};
use crate::token::unix_now;

/// Load the session artifact and bring it up to date.
///
/// The returned jar always re-issues the session cookie, so its max-age rolls
/// forward on every read and an active browser still holds the artifact when
/// the access token expires. A refreshed or `refresh_failed` artifact is
/// written back in its new form.
pub(super) async fn resolve_session(
    state: &AuthState,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Option<SessionArtifact>), AuthError> {
    let name = &state.settings.session_cookie_name;
    let Some(artifact) = cookies::get_session(&jar, name) else {
        return Ok((jar, None));
    };

    let revalidated = state.lifecycle.revalidate(artifact, unix_now()).await;
    if revalidated.changed {
        tracing::debug!(principal_id = %revalidated.artifact.principal_id, "Session artifact rewritten");
    }
    let jar = jar.add(cookies::session_cookie(
        name,
        &revalidated.artifact,
        state.settings.secure_cookies,
    )?);

    Ok((jar, Some(revalidated.artifact)))
}

/// Route guard middleware.
///
/// Paths outside the route table pass straight through. Guarded paths get
/// their session revalidated, then are let through with the [`SessionView`]
/// in request extensions, or redirected to sign-in / the unauthorized page.
///
/// [`SessionView`]: crate::session::SessionView
pub(super) async fn route_guard(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    if state.routes.policy_for(&path).is_none() {
        return next.run(req).await;
    }

    let (jar, artifact) = match resolve_session(&state, jar).await {
        Ok(resolved) => resolved,
        Err(e) => return e.into_response(),
    };
    let view = artifact.as_ref().map(project);

    match state.routes.evaluate(&path, view.as_ref()) {
        Some(GuardState::Unauthenticated) => {
            tracing::debug!(path = %path, "No valid session, redirecting to sign-in");
            let target = req
                .uri()
                .path_and_query()
                .map_or(path.as_str(), |pq| pq.as_str());
            let location = format!(
                "{}?callbackUrl={}",
                state.settings.sign_in_page,
                urlencoding::encode(target)
            );
            (jar, Redirect::to(&location)).into_response()
        }
        Some(GuardState::Denied) => {
            tracing::info!(path = %path, "Role check failed");
            (jar, Redirect::to(&state.settings.unauthorized_page)).into_response()
        }
        Some(GuardState::Authenticated | GuardState::AuthenticatedAdmin) | None => {
            if let Some(view) = view {
                req.extensions_mut().insert(view);
            }
            (jar, next.run(req).await).into_response()
        }
    }
}
