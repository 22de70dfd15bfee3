use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::token::TokenResponse;
use crate::types::{NewAccount, Principal};

/// Location of the auth API.
///
/// ```rust,ignore
/// use ms_auth_session::ApiConfig;
///
/// let config = ApiConfig::new("https://api.example.com".parse()?);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) api_url: Url,
}

impl ApiConfig {
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self { api_url }
    }

    /// Base URL of the API.
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url.as_str().trim_end_matches('/'))
    }
}

/// Federated identity providers the API can exchange tokens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Provider {
    Google,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

/// Body of `/auth/<provider>/token` responses: tokens plus the user.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct FederatedLogin {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub user: Principal,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    detail: serde_json::Value,
}

#[derive(Serialize)]
struct RefreshTokenBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct ProviderTokenBody<'a> {
    access_token: &'a str,
}

/// HTTP client for the auth API.
///
/// Every method maps transport failures to [`Error::UpstreamUnavailable`] and
/// non-success statuses to [`Error::Upstream`] (or [`Error::NotFound`] for 404).
/// Deciding what a 401 means is left to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (timeouts, connection pool reuse, testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `POST /token` with form-encoded `username`/`password`.
    ///
    /// # Errors
    ///
    /// See the type-level docs.
    pub async fn password_token(&self, email: &str, password: &str) -> Result<TokenResponse, Error> {
        let params = [("username", email), ("password", password)];
        let response = self
            .http
            .post(self.config.endpoint("/token"))
            .form(&params)
            .send()
            .await
            .map_err(Error::UpstreamUnavailable)?;

        let response = Self::ensure_success(response, "token").await?;
        Self::read_json(response, "token").await
    }

    /// `GET /users/me` with the bearer access token.
    ///
    /// # Errors
    ///
    /// See the type-level docs.
    pub async fn current_user(&self, access_token: &str) -> Result<Principal, Error> {
        let response = self
            .http
            .get(self.config.endpoint("/users/me"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Error::UpstreamUnavailable)?;

        let response = Self::ensure_success(response, "users/me").await?;
        Self::read_json(response, "users/me").await
    }

    /// `POST /auth/<provider>/token` with the provider's access token.
    ///
    /// # Errors
    ///
    /// See the type-level docs.
    pub async fn federated_token(
        &self,
        provider: Provider,
        provider_access_token: &str,
    ) -> Result<FederatedLogin, Error> {
        let response = self
            .http
            .post(self.config.endpoint(&format!("/auth/{}/token", provider.as_str())))
            .json(&ProviderTokenBody {
                access_token: provider_access_token,
            })
            .send()
            .await
            .map_err(Error::UpstreamUnavailable)?;

        let response = Self::ensure_success(response, "federated token").await?;
        Self::read_json(response, "federated token").await
    }

    /// `POST /token/refresh`.
    ///
    /// # Errors
    ///
    /// See the type-level docs.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let response = self
            .http
            .post(self.config.endpoint("/token/refresh"))
            .json(&RefreshTokenBody { refresh_token })
            .send()
            .await
            .map_err(Error::UpstreamUnavailable)?;

        let response = Self::ensure_success(response, "token refresh").await?;
        Self::read_json(response, "token refresh").await
    }

    /// `POST /logout`, revoking the refresh token server-side.
    ///
    /// # Errors
    ///
    /// See the type-level docs.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<(), Error> {
        let response = self
            .http
            .post(self.config.endpoint("/logout"))
            .bearer_auth(access_token)
            .json(&RefreshTokenBody { refresh_token })
            .send()
            .await
            .map_err(Error::UpstreamUnavailable)?;

        Self::ensure_success(response, "logout").await?;
        Ok(())
    }

    /// `POST /register`.
    ///
    /// # Errors
    ///
    /// See the type-level docs. A duplicate email comes back as
    /// [`Error::Upstream`] with status 400 and the API's detail message.
    pub async fn register(&self, account: &NewAccount) -> Result<Principal, Error> {
        let response = self
            .http
            .post(self.config.endpoint("/register"))
            .json(account)
            .send()
            .await
            .map_err(Error::UpstreamUnavailable)?;

        let response = Self::ensure_success(response, "register").await?;
        Self::read_json(response, "register").await
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(operation));
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Upstream {
            operation,
            status: Some(status.as_u16()),
            detail: error_detail(body),
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<T, Error> {
        response.json::<T>().await.map_err(|e| Error::Upstream {
            operation,
            status: None,
            detail: format!("malformed response: {e}"),
        })
    }
}

/// Pulls FastAPI's `{"detail": ..}` out of an error body, falling back to the raw text.
fn error_detail(body: String) -> String {
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(ApiErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ApiErrorBody { detail }) => detail.to_string(),
        Err(_) => body,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(ApiConfig::new(server.uri().parse().unwrap()))
    }

    fn user_json() -> serde_json::Value {
        serde_json::json!({
            "id": "u-1",
            "email": "ada@example.com",
            "full_name": "Ada",
            "roles": ["user"],
            "is_active": true,
            "created_at": "2024-03-01T10:30:00"
        })
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let config = ApiConfig::new("https://api.example.com/v1/".parse().unwrap());
        assert_eq!(config.endpoint("/token"), "https://api.example.com/v1/token");
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"Email already registered"}"#.into()),
            "Email already registered"
        );
        assert_eq!(error_detail("gateway timeout".into()), "gateway timeout");
    }

    #[tokio::test]
    async fn password_token_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("username=ada%40example.com"))
            .and(body_string_contains("password=hunter22"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "acc",
                "refresh_token": "ref",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = client_for(&server)
            .password_token("ada@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(tokens.access_token, "acc");
        assert_eq!(tokens.refresh_token, "ref");
    }

    #[tokio::test]
    async fn current_user_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("Authorization", "Bearer acc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .mount(&server)
            .await;

        let user = client_for(&server).current_user("acc").await.unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn federated_token_reads_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/google/token"))
            .and(body_json(serde_json::json!({ "access_token": "g-token" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "acc",
                "refresh_token": "ref",
                "token_type": "bearer",
                "user": user_json()
            })))
            .mount(&server)
            .await;

        let login = client_for(&server)
            .federated_token(Provider::Google, "g-token")
            .await
            .unwrap();
        assert_eq!(login.tokens.access_token, "acc");
        assert_eq!(login.user.id.to_string(), "u-1");
    }

    #[tokio::test]
    async fn rejection_carries_status_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "detail": "Email already registered" })),
            )
            .mount(&server)
            .await;

        let account = NewAccount {
            email: "ada@example.com".into(),
            password: "hunter22".into(),
            full_name: "Ada".into(),
        };
        let err = client_for(&server).register(&account).await.unwrap_err();
        match err {
            Error::Upstream { status, detail, .. } => {
                assert_eq!(status, Some(400));
                assert_eq!(detail, "Email already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_route_is_not_found() {
        let server = MockServer::start().await;
        let err = client_for(&server).current_user("acc").await.unwrap_err();
        assert!(matches!(err, Error::NotFound("users/me")));
    }

    #[tokio::test]
    async fn unreachable_api_is_upstream_unavailable() {
        let client = ApiClient::new(ApiConfig::new("http://127.0.0.1:9".parse().unwrap()));
        let err = client.refresh_token("ref").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
