use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::{GateSettings, SessionGateConfig};
use crate::client::ApiClient;
use crate::provider::GoogleClient;
use crate::session::{CredentialExchange, RouteTable, SessionLifecycle};

/// Shared state for the auth routes and the route guard.
#[derive(Clone)]
pub(super) struct AuthState {
    pub(super) api: Arc<ApiClient>,
    pub(super) exchange: CredentialExchange,
    pub(super) lifecycle: Arc<SessionLifecycle>,
    pub(super) google: Option<Arc<GoogleClient>>,
    pub(super) routes: Arc<RouteTable>,
    pub(super) settings: GateSettings,
}

impl AuthState {
    pub(super) fn new(config: SessionGateConfig) -> Self {
        let api = Arc::new(config.api);
        Self {
            exchange: CredentialExchange::new(api.clone()),
            lifecycle: Arc::new(SessionLifecycle::new(api.clone())),
            api,
            google: config.google.map(Arc::new),
            routes: Arc::new(config.routes),
            settings: config.settings,
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.settings.cookie_key.clone()
    }
}
