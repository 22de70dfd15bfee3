//! Google authorization-code flow, up to the point where we hold Google's
//! access token and can hand it to the API's federated exchange.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::Error;

/// Google `OAuth2` client settings.
///
/// ```rust,ignore
/// let google = GoogleConfig::new(id, secret, "https://app.example.com/api/auth/callback/google".parse()?);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GoogleConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: Url,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) scopes: Vec<String>,
}

impl GoogleConfig {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth"
                .parse()
                .expect("valid default URL"),
            token_url: "https://oauth2.googleapis.com/token"
                .parse()
                .expect("valid default URL"),
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
        }
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the scopes (default: `openid email profile`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }
}

/// Authorization redirect plus the values to keep until the callback.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

/// Client for Google's authorize and token endpoints.
pub struct GoogleClient {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleClient {
    #[must_use]
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Authorization URL carrying a fresh `state` and S256 PKCE challenge.
    #[must_use]
    pub fn authorization_url(&self) -> AuthorizationRequest {
        let state = random_urlsafe::<16>();
        let code_verifier = random_urlsafe::<48>();
        let challenge = code_challenge(&code_verifier);

        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256");

        AuthorizationRequest {
            url: url.into(),
            state,
            code_verifier,
        }
    }

    /// Exchange an authorization code for Google's access token.
    ///
    /// # Errors
    ///
    /// [`Error::UpstreamUnavailable`] on transport failure, [`Error::Upstream`]
    /// when Google rejects the code.
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<String, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(Error::UpstreamUnavailable)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                operation: "google code exchange",
                status: Some(status.as_u16()),
                detail,
            });
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map(|t| t.access_token)
            .map_err(|e| Error::Upstream {
                operation: "google code exchange",
                status: None,
                detail: format!("malformed response: {e}"),
            })
    }
}

/// `N` random bytes, base64url without padding.
fn random_urlsafe<const N: usize>() -> String {
    let bytes: [u8; N] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `BASE64URL(SHA256(verifier))`
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config() -> GoogleConfig {
        GoogleConfig::new(
            "google-client",
            "google-secret",
            "https://app.example.com/api/auth/callback/google".parse().unwrap(),
        )
    }

    #[test]
    fn authorization_url_carries_pkce_and_state() {
        let req = GoogleClient::new(config()).authorization_url();
        let url: Url = req.url.parse().unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "google-client");
        assert_eq!(pairs["scope"], "openid email profile");
        assert_eq!(pairs["state"], req.state);
        assert_eq!(pairs["code_challenge"], code_challenge(&req.code_verifier));
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert!(!pairs.contains_key("client_secret"));
    }

    #[test]
    fn verifier_and_state_lengths() {
        let req = GoogleClient::new(config()).authorization_url();
        // 48 bytes -> 64 chars, 16 bytes -> 22 chars
        assert_eq!(req.code_verifier.len(), 64);
        assert_eq!(req.state.len(), 22);
        assert!(
            req.code_verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn each_request_is_fresh() {
        let client = GoogleClient::new(config());
        let a = client.authorization_url();
        let b = client.authorization_url();
        assert_ne!(a.state, b.state);
        assert_ne!(a.code_verifier, b.code_verifier);
    }

    #[tokio::test]
    async fn exchange_code_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("code_verifier=verifier"))
            .and(body_string_contains("client_secret=google-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "g-access",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let client = GoogleClient::new(
            config().with_token_url(format!("{}/token", server.uri()).parse().unwrap()),
        );
        let token = client.exchange_code("auth-code", "verifier").await.unwrap();
        assert_eq!(token, "g-access");
    }

    #[tokio::test]
    async fn exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let client = GoogleClient::new(
            config().with_token_url(format!("{}/token", server.uri()).parse().unwrap()),
        );
        let err = client.exchange_code("stale", "verifier").await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: Some(400), .. }));
    }
}
