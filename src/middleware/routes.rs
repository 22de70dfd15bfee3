use axum::{Json, Router};
use axum::extract::{Form, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum_extra::extract::PrivateCookieJar;

use super::cookies;
use super::error::AuthError;
use super::guard::resolve_session;
use super::state::AuthState;
use super::types::{CallbackParams, SignInForm, SignUpForm, local_redirect};
use crate::client::Provider;
use crate::error::Error;
use crate::session::{Credentials, SignIn, project};

/// Build the auth router for `state`.
pub(super) fn auth_routes(state: AuthState) -> Router {
    let auth_path = state.settings.auth_path.clone();

    let mut router = Router::new()
        .route(&format!("{auth_path}/signin/credentials"), post(sign_in))
        .route(&format!("{auth_path}/signup"), post(sign_up))
        .route(&format!("{auth_path}/signout"), post(sign_out))
        .route(&format!("{auth_path}/session"), get(session));

    if state.google.is_some() {
        router = router
            .route(&format!("{auth_path}/signin/google"), get(google_sign_in))
            .route(&format!("{auth_path}/callback/google"), get(google_callback));
    }

    router.with_state(state)
}

// ── Credentials ────────────────────────────────────────────────────

async fn sign_in(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Form(form): Form<SignInForm>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let sign_in = state
        .exchange
        .authenticate(&form.credentials())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Credentials sign-in failed");
            redirect_with_error(&state.settings.sign_in_page, e.code())
        })?;

    let target = local_redirect(form.callback_url.as_deref())
        .unwrap_or(&state.settings.login_redirect)
        .to_string();
    start_session(&state, jar, sign_in, &target)
}

async fn sign_up(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Form(form): Form<SignUpForm>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let sign_up_page = &state.settings.sign_up_page;

    let account = form.validate().map_err(|e| {
        let message = match e {
            Error::Validation(message) => message,
            other => other.code().to_string(),
        };
        redirect_with_error(sign_up_page, &message)
    })?;

    let principal = state.api.register(&account).await.map_err(|e| {
        tracing::warn!(error = %e, "Registration failed");
        let message = match &e {
            Error::Upstream {
                status: Some(400..=499),
                detail,
                ..
            } => detail.clone(),
            other => other.code().to_string(),
        };
        redirect_with_error(sign_up_page, &message)
    })?;
    tracing::info!(principal_id = %principal.id, "Account registered");

    let credentials = Credentials::Password {
        email: account.email,
        password: account.password,
    };
    let sign_in = state.exchange.authenticate(&credentials).await.map_err(|e| {
        tracing::warn!(error = %e, "Sign-in after registration failed");
        redirect_with_error(&state.settings.sign_in_page, "signin_after_register")
    })?;

    start_session(&state, jar, sign_in, &state.settings.login_redirect)
}

// ── Google ─────────────────────────────────────────────────────────

async fn google_sign_in(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| redirect_with_error(&state.settings.error_page, "configuration"))?;
    let auth_req = google.authorization_url();

    let (pkce_cookie, state_cookie) = cookies::pkce_cookies(
        &auth_req.code_verifier,
        &auth_req.state,
        state.settings.secure_cookies,
        &state.settings.auth_path,
    );

    Ok((jar.add(pkce_cookie).add(state_cookie), Redirect::to(&auth_req.url)))
}

async fn google_callback(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let error_page = &state.settings.error_page;
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| redirect_with_error(error_page, "configuration"))?;

    if let Some(error) = &params.error {
        tracing::warn!(error = %error, "OAuth2 error from Google");
        return Err(redirect_with_error(error_page, "oauth_callback"));
    }

    let code = params
        .code
        .ok_or_else(|| redirect_with_error(error_page, "missing_code"))?;

    let received_state = params
        .state
        .ok_or_else(|| redirect_with_error(error_page, "state_mismatch"))?;
    let stored_state =
        cookies::get_state(&jar).ok_or_else(|| redirect_with_error(error_page, "state_mismatch"))?;
    if received_state != stored_state {
        tracing::warn!("OAuth state mismatch");
        return Err(redirect_with_error(error_page, "state_mismatch"));
    }

    let code_verifier = cookies::get_pkce_verifier(&jar)
        .ok_or_else(|| redirect_with_error(error_page, "missing_verifier"))?;

    let provider_token = google
        .exchange_code(&code, &code_verifier)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Google code exchange failed");
            redirect_with_error(error_page, "oauth_callback")
        })?;

    let credentials = Credentials::Federated {
        provider: Provider::Google,
        access_token: provider_token,
    };
    let sign_in = state.exchange.authenticate(&credentials).await.map_err(|e| {
        tracing::error!(error = %e, "Federated token exchange failed");
        redirect_with_error(error_page, e.code())
    })?;

    let (clear_pkce, clear_state) = cookies::clear_pkce_cookies(&state.settings.auth_path);
    let jar = jar.add(clear_pkce).add(clear_state);
    start_session(&state, jar, sign_in, &state.settings.login_redirect)
}

// ── Sign-out / session ─────────────────────────────────────────────

async fn sign_out(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let name = &state.settings.session_cookie_name;
    if let Some(artifact) = cookies::get_session(&jar, name) {
        let tokens = &artifact.tokens;
        if let Err(e) = state.api.logout(&tokens.access_token, &tokens.refresh_token).await {
            tracing::warn!(error = %e, "Upstream logout failed, clearing session anyway");
        }
        tracing::info!(principal_id = %artifact.principal_id, "Signed out");
    }

    (
        jar.remove(cookies::clear_session_cookie(name)),
        Redirect::to(&state.settings.logout_redirect),
    )
}

/// Current session view as JSON, `null` when signed out.
async fn session(State(state): State<AuthState>, jar: PrivateCookieJar) -> Response {
    match resolve_session(&state, jar).await {
        Ok((jar, artifact)) => (jar, Json(artifact.as_ref().map(project))).into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn start_session(
    state: &AuthState,
    jar: PrivateCookieJar,
    sign_in: SignIn,
    redirect_to: &str,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let artifact = sign_in.into_artifact();
    let cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        &artifact,
        state.settings.secure_cookies,
    )
    .map_err(|e| AuthError::from(e).into_response())?;

    tracing::info!(principal_id = %artifact.principal_id, "Sign-in successful");
    Ok((jar.add(cookie), Redirect::to(redirect_to)))
}

fn redirect_with_error(page: &str, code: &str) -> Response {
    let encoded = urlencoding::encode(code);
    Redirect::to(&format!("{page}?error={encoded}")).into_response()
}
