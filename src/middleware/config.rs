use axum_extra::extract::cookie::Key;
use url::Url;

use super::error::AuthError;
use crate::client::{ApiClient, ApiConfig};
use crate::provider::{GoogleClient, GoogleConfig};
use crate::session::RouteTable;

/// Settings shared by the auth routes and the route guard.
#[derive(Clone)]
pub(crate) struct GateSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) sign_in_page: String,
    pub(crate) sign_up_page: String,
    pub(crate) error_page: String,
    pub(crate) unauthorized_page: String,
    pub(crate) login_redirect: String,
    pub(crate) logout_redirect: String,
}

impl GateSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "__ms_auth_session".into(),
            secure_cookies: true,
            auth_path: "/api/auth".into(),
            sign_in_page: "/auth/signin".into(),
            sign_up_page: "/auth/signup".into(),
            error_page: "/auth/error".into(),
            unauthorized_page: "/unauthorized".into(),
            login_redirect: "/dashboard".into(),
            logout_redirect: "/".into(),
        }
    }
}

/// Session gate configuration.
///
/// The API client is the only required piece. Everything else has a default
/// that can be overridden with the `with_*` methods. Built once at startup and
/// never mutated afterwards.
pub struct SessionGateConfig {
    pub(super) api: ApiClient,
    pub(super) google: Option<GoogleClient>,
    pub(super) routes: RouteTable,
    pub(super) settings: GateSettings,
}

impl SessionGateConfig {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            google: None,
            routes: RouteTable::default(),
            settings: GateSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `API_URL`: base URL of the auth API
    ///
    /// # Optional env vars
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`: enable
    ///   Google sign-in (all three or none)
    /// - `COOKIE_KEY`: cookie encryption key bytes (at least 64)
    /// - `DEV_MODE`: `"1"` or `"true"` drops the `Secure` cookie attribute
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if a required var is missing, a URL is
    /// invalid, the Google vars are only partly set, or `COOKIE_KEY` is too short.
    pub fn from_env() -> Result<Self, AuthError> {
        let api_url: Url = std::env::var("API_URL")
            .map_err(|_| AuthError::Config("API_URL is required".into()))?
            .parse()
            .map_err(|e| AuthError::Config(format!("API_URL: {e}")))?;

        let mut config = Self::new(ApiClient::new(ApiConfig::new(api_url)));

        let google_vars = (
            std::env::var("GOOGLE_CLIENT_ID").ok(),
            std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            std::env::var("GOOGLE_REDIRECT_URI").ok(),
        );
        match google_vars {
            (Some(id), Some(secret), Some(redirect)) => {
                let redirect: Url = redirect
                    .parse()
                    .map_err(|e| AuthError::Config(format!("GOOGLE_REDIRECT_URI: {e}")))?;
                config = config.with_google(GoogleClient::new(GoogleConfig::new(id, secret, redirect)));
            }
            (None, None, None) => {}
            _ => {
                return Err(AuthError::Config(
                    "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URI must be set together"
                        .into(),
                ));
            }
        }

        let dev_mode = matches!(std::env::var("DEV_MODE").as_deref(), Ok("1") | Ok("true"));

        if let Ok(k) = std::env::var("COOKIE_KEY") {
            let key = Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?;
            config = config.with_cookie_key(key);
        }

        Ok(config.with_secure_cookies(!dev_mode))
    }

    /// Enable Google sign-in.
    #[must_use]
    pub fn with_google(mut self, google: GoogleClient) -> Self {
        self.google = Some(google);
        self
    }

    #[must_use]
    pub fn with_route_table(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    #[must_use]
    pub fn with_sign_in_page(mut self, path: impl Into<String>) -> Self {
        self.settings.sign_in_page = path.into();
        self
    }

    #[must_use]
    pub fn with_sign_up_page(mut self, path: impl Into<String>) -> Self {
        self.settings.sign_up_page = path.into();
        self
    }

    #[must_use]
    pub fn with_error_page(mut self, path: impl Into<String>) -> Self {
        self.settings.error_page = path.into();
        self
    }

    #[must_use]
    pub fn with_unauthorized_page(mut self, path: impl Into<String>) -> Self {
        self.settings.unauthorized_page = path.into();
        self
    }

    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_redirect = path.into();
        self
    }
}
