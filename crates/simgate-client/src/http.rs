//! reqwest-backed [`AuthApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use simgate_core::config::ApiConfig;
use simgate_core::error::{AppError, ErrorKind};
use simgate_core::result::AppResult;
use simgate_core::traits::AuthApi;
use simgate_core::types::{AuthTokens, LoginRequest, LoginResponse, RefreshRequest, UserRecord};

/// Maximum number of error body characters carried into an error message.
const MAX_ERROR_CHARS: usize = 200;

/// Auth API client against a configured base URL.
///
/// Every call is bounded by the configured timeout; an expired timeout
/// surfaces as [`ErrorKind::Timeout`] so a hung server cannot hold a
/// refresh in flight forever.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAuthApi {
    /// Create a client from configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        Self::with_timeout(&config.base_url, config.request_timeout())
    }

    /// Create a client for `base_url` with an explicit timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        build_url(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| AppError::timeout("Request timed out. Please try again."))?
            .map_err(map_request_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Auth API response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::from_status(status.as_u16(), error_message(&body)))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = self.send(builder).await?;
        tokio::time::timeout(self.timeout, response.json::<T>())
            .await
            .map_err(|_| AppError::timeout("Response body timed out"))?
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Serialization,
                    format!("Failed to decode response: {e}"),
                    e,
                )
            })
    }

    async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> AppResult<()> {
        self.send(self.request(Method::POST, path, bearer).json(body))
            .await
            .map(|_| ())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetConfirmBody<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        self.send_json(self.request(Method::POST, "/auth/login", None).json(request))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.send_json(self.request(Method::POST, "/auth/refresh", None).json(&body))
            .await
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        self.send(self.request(Method::POST, "/auth/logout", Some(token)))
            .await
            .map(|_| ())
    }

    async fn validate(&self, token: &str) -> AppResult<bool> {
        match self
            .send(self.request(Method::GET, "/auth/validate", Some(token)))
            .await
        {
            Ok(response) => {
                let body = response.text().await.unwrap_or_default();
                Ok(serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("valid").and_then(serde_json::Value::as_bool))
                    .unwrap_or(true))
            }
            Err(e) if e.status == Some(401) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn me(&self, token: &str) -> AppResult<UserRecord> {
        self.send_json(self.request(Method::GET, "/auth/me", Some(token)))
            .await
    }

    async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        self.post_empty("/auth/password-reset", None, &EmailBody { email })
            .await
    }

    async fn confirm_password_reset(&self, reset_token: &str, new_password: &str) -> AppResult<()> {
        let body = ResetConfirmBody {
            token: reset_token,
            new_password,
        };
        self.post_empty("/auth/password-reset/confirm", None, &body)
            .await
    }

    async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let body = ChangePasswordBody {
            current_password,
            new_password,
        };
        self.post_empty("/auth/change-password", Some(token), &body)
            .await
    }
}

/// Join a base URL and a path with exactly one slash.
fn build_url(base: &str, path: &str) -> String {
    let path = path.trim();
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Map transport failures, distinguishing timeouts.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::with_source(ErrorKind::Timeout, "Request timed out. Please try again.", err)
    } else {
        let message = format!("Unable to reach the server: {err}");
        AppError::with_source(ErrorKind::Network, message, err)
    }
}

/// Prefer a JSON `message` field, else the trimmed, truncated body.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));
    let text = from_json.unwrap_or_else(|| body.trim().to_string());
    if text.is_empty() {
        "Request failed.".to_string()
    } else {
        text.chars().take(MAX_ERROR_CHARS).collect()
    }
}
