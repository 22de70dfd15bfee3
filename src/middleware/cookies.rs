use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::session::SessionArtifact;
use crate::token::ACCESS_TOKEN_TTL_SECS;

const PKCE_COOKIE_NAME: &str = "__ms_auth_pkce";
const STATE_COOKIE_NAME: &str = "__ms_auth_state";

/// PKCE verifier + state cookies for the Google authorization request.
pub(super) fn pkce_cookies(
    code_verifier: &str,
    state: &str,
    secure: bool,
    auth_path: &str,
) -> (Cookie<'static>, Cookie<'static>) {
    let short_lived = |name: &'static str, value: &str| {
        Cookie::build((name, value.to_string()))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .path(auth_path.to_string())
            .max_age(Duration::minutes(5))
            .build()
    };

    (
        short_lived(PKCE_COOKIE_NAME, code_verifier),
        short_lived(STATE_COOKIE_NAME, state),
    )
}

pub(super) fn clear_pkce_cookies(auth_path: &str) -> (Cookie<'static>, Cookie<'static>) {
    let clear = |name: &'static str| {
        Cookie::build((name, ""))
            .path(auth_path.to_string())
            .max_age(Duration::ZERO)
            .build()
    };
    (clear(PKCE_COOKIE_NAME), clear(STATE_COOKIE_NAME))
}

/// Session cookie holding the encoded artifact. Lives as long as an access token.
pub(super) fn session_cookie(
    name: &str,
    artifact: &SessionArtifact,
    secure: bool,
) -> Result<Cookie<'static>, serde_json::Error> {
    Ok(Cookie::build((name.to_string(), artifact.encode()?))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(ACCESS_TOKEN_TTL_SECS))
        .build())
}

pub(super) fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Artifact stored in the jar, if present and readable.
///
/// The private jar already rejects cookies that fail decryption; this only
/// filters payloads that don't parse.
pub(super) fn get_session(jar: &PrivateCookieJar, name: &str) -> Option<SessionArtifact> {
    let cookie = jar.get(name)?;
    let artifact = SessionArtifact::decode(cookie.value());
    if artifact.is_none() {
        tracing::debug!("Ignoring unreadable session cookie");
    }
    artifact
}

pub(super) fn get_pkce_verifier(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(PKCE_COOKIE_NAME).map(|c| c.value().to_string())
}

pub(super) fn get_state(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string())
}
