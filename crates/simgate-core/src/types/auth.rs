//! Request and response bodies of the `/auth/*` endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::UserRecord;

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email address.
    #[validate(length(min = 1, message = "identifier is required"))]
    pub identifier: String,
    /// Plain-text password; never logged.
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    /// Whether the server should issue a long-lived refresh token.
    #[serde(default)]
    pub remember_me: bool,
}

impl LoginRequest {
    /// Create a login request without "remember me".
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
            remember_me: false,
        }
    }
}

/// Successful body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Access token.
    pub token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// The authenticated user.
    pub user: UserRecord,
}

impl LoginResponse {
    /// Split off the token pair.
    pub fn tokens(&self) -> AuthTokens {
        AuthTokens {
            token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token being exchanged.
    pub refresh_token: String,
}

/// An access/refresh token pair, the result of a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    /// Access token.
    pub token: String,
    /// Refresh token.
    pub refresh_token: String,
}

/// Body of `POST /auth/password-reset`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordResetRequest {
    /// Account email address.
    #[validate(email)]
    pub email: String,
}

/// Body of `POST /auth/password-reset/confirm`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirmRequest {
    /// One-time reset token from the email.
    #[validate(length(min = 1))]
    pub token: String,
    /// The new password.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

/// Body of `POST /auth/change-password`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// The password being replaced.
    #[validate(length(min = 1))]
    pub current_password: String,
    /// The new password.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}
