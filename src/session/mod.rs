//! Session lifecycle: artifact, projection and route guarding are plain data;
//! exchange, refresh and revalidation talk to the API.

mod artifact;
#[cfg(feature = "client")]
mod exchange;
mod guard;
#[cfg(feature = "client")]
mod lifecycle;
mod projection;
#[cfg(feature = "client")]
mod refresh;

pub use artifact::{SessionArtifact, SessionError};
#[cfg(feature = "client")]
pub use exchange::{CredentialExchange, Credentials, SignIn};
pub use guard::{Access, GuardState, RoutePolicy, RouteTable, require_admin};
#[cfg(feature = "client")]
pub use lifecycle::{Revalidated, SessionLifecycle};
pub use projection::{SessionView, project};
#[cfg(feature = "client")]
pub use refresh::Refresher;
