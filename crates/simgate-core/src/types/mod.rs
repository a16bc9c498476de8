//! Shared domain types: user identity and the auth wire contract.

pub mod auth;
pub mod user;

pub use auth::{
    AuthTokens, ChangePasswordRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
    PasswordResetRequest, RefreshRequest,
};
pub use user::{ProfileUpdate, UserId, UserRecord};
