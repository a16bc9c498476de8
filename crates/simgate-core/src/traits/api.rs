//! Transport seam for the authentication REST endpoints.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{AuthTokens, LoginRequest, LoginResponse, UserRecord};

/// The token-bearing request contract against the auth backend.
///
/// Failures carry the HTTP status where one was received; the caller
/// decides from [`AppError::counts_toward_lockout`](crate::AppError::counts_toward_lockout)
/// whether a login failure is charged to the throttle.
#[async_trait]
pub trait AuthApi: Send + Sync + std::fmt::Debug + 'static {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse>;

    /// `POST /auth/refresh`
    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthTokens>;

    /// `POST /auth/logout` with the bearer token.
    async fn logout(&self, token: &str) -> AppResult<()>;

    /// `GET /auth/validate`
    async fn validate(&self, token: &str) -> AppResult<bool>;

    /// `GET /auth/me`
    async fn me(&self, token: &str) -> AppResult<UserRecord>;

    /// `POST /auth/password-reset`
    async fn request_password_reset(&self, email: &str) -> AppResult<()>;

    /// `POST /auth/password-reset/confirm`
    async fn confirm_password_reset(&self, reset_token: &str, new_password: &str)
    -> AppResult<()>;

    /// `POST /auth/change-password` with the bearer token.
    async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()>;
}
