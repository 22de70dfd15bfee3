//! Axum integration: auth routes, the route guard layer and session extractors.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ms_auth_session::middleware::{CurrentSession, SessionGate, SessionGateConfig};
//!
//! // 1. Configure from environment (or SessionGateConfig::new + with_*)
//! let gate = SessionGate::new(SessionGateConfig::from_env()?);
//!
//! // 2. Guard the app's pages, then mount the auth routes next to them
//! let pages = axum::Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .route("/admin/users", get(admin_users));
//! let app = gate.protect(pages).merge(gate.routes());
//!
//! // 3. Read the session in guarded handlers
//! async fn dashboard(CurrentSession(session): CurrentSession) -> String {
//!     format!("Hello, {}", session.id)
//! }
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod guard;
mod routes;
mod state;
mod types;

pub use config::SessionGateConfig;
pub use error::AuthError;
pub use extractor::{AdminSession, CurrentSession};
pub use types::MIN_PASSWORD_LEN;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;

use axum::Router;

use state::AuthState;

/// Assembled session layer: one immutable state shared by the auth routes
/// and the route guard.
#[derive(Clone)]
pub struct SessionGate {
    state: AuthState,
}

impl SessionGate {
    #[must_use]
    pub fn new(config: SessionGateConfig) -> Self {
        Self {
            state: AuthState::new(config),
        }
    }

    /// Sign-in, sign-up, Google, sign-out and session endpoints under the auth path.
    #[must_use]
    pub fn routes(&self) -> Router {
        routes::auth_routes(self.state.clone())
    }

    /// Put `router` behind the route guard.
    ///
    /// Only paths covered by the route table are checked; everything else in
    /// `router` is served as if the guard weren't there.
    #[must_use]
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            guard::route_guard,
        ))
    }
}
