use std::fmt;
use std::sync::Arc;

use super::artifact::SessionArtifact;
use crate::client::{ApiClient, Provider};
use crate::error::Error;
use crate::token::{TokenPair, unix_now};
use crate::types::Principal;

/// What the user signs in with.
#[derive(Clone)]
pub enum Credentials {
    Password { email: String, password: String },
    Federated { provider: Provider, access_token: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Federated { provider, .. } => f
                .debug_struct("Federated")
                .field("provider", provider)
                .finish_non_exhaustive(),
        }
    }
}

/// Result of a successful credential exchange.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub tokens: TokenPair,
    pub principal: Principal,
}

impl SignIn {
    /// Session artifact to persist for this sign-in.
    #[must_use]
    pub fn into_artifact(self) -> SessionArtifact {
        SessionArtifact::mint(self.principal.id, self.principal.roles, self.tokens)
    }
}

/// Trades credentials for a token pair and principal. Stores nothing itself.
#[derive(Debug, Clone)]
pub struct CredentialExchange {
    api: Arc<ApiClient>,
}

impl CredentialExchange {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// [`Error::InvalidCredentials`] when the API rejects the credentials (or
    /// they are blank), [`Error::UpstreamUnavailable`] on transport failure.
    /// Other upstream errors pass through unchanged. Nothing is retried.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<SignIn, Error> {
        match credentials {
            Credentials::Password { email, password } => {
                if email.trim().is_empty() || password.is_empty() {
                    return Err(Error::InvalidCredentials);
                }
                let response = self
                    .api
                    .password_token(email, password)
                    .await
                    .map_err(reject_as_invalid)?;
                let tokens = TokenPair::issue(response, unix_now());
                let principal = self
                    .api
                    .current_user(&tokens.access_token)
                    .await
                    .map_err(reject_as_invalid)?;
                Ok(SignIn { tokens, principal })
            }
            Credentials::Federated {
                provider,
                access_token,
            } => {
                let login = self
                    .api
                    .federated_token(*provider, access_token)
                    .await
                    .map_err(reject_as_invalid)?;
                Ok(SignIn {
                    tokens: TokenPair::issue(login.tokens, unix_now()),
                    principal: login.user,
                })
            }
        }
    }
}

fn reject_as_invalid(e: Error) -> Error {
    if e.is_rejection() {
        Error::InvalidCredentials
    } else {
        e
    }
}
