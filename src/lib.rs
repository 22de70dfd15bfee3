#![doc = include_str!("../README.md")]

#[cfg(feature = "client")]
pub mod client;
pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;
#[cfg(feature = "client")]
pub mod provider;
pub mod session;
pub mod token;
pub mod types;

// Re-exports for convenient access
#[cfg(feature = "client")]
pub use client::{ApiClient, ApiConfig, FederatedLogin, Provider};
pub use error::Error;
#[cfg(feature = "client")]
pub use provider::{AuthorizationRequest, GoogleClient, GoogleConfig};
#[cfg(feature = "client")]
pub use session::{CredentialExchange, Credentials, Refresher, SessionLifecycle, SignIn};
pub use session::{
    Access, GuardState, RoutePolicy, RouteTable, SessionArtifact, SessionError, SessionView,
    project, require_admin,
};
pub use token::{ACCESS_TOKEN_TTL_SECS, TokenPair, TokenResponse};
pub use types::{ADMIN_ROLE, NewAccount, Principal, PrincipalId, Roles};
