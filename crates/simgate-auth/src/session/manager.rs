//! Session lifecycle manager: login, logout, restore and account flows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use simgate_core::config::{AuthConfig, ThrottleConfig};
use simgate_core::error::AppError;
use simgate_core::events::{AuthEvent, EventBus};
use simgate_core::result::AppResult;
use simgate_core::traits::{AuthApi, Clock};
use simgate_core::types::{
    AuthTokens, ChangePasswordRequest, LoginRequest, PasswordResetConfirmRequest,
    PasswordResetRequest, ProfileUpdate, UserRecord,
};
use simgate_store::KvManager;

use super::store::SessionStore;
use super::vault::CredentialVault;
use crate::refresh::RefreshScheduler;
use crate::throttle::{LoginThrottle, ThrottleState};
use crate::token::TokenCodec;

/// Generic message for rejected credentials.
const INVALID_CREDENTIALS: &str = "Invalid email/username or password";

/// Decoded view of the current token, for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// When the token was issued.
    pub issued_at: Option<DateTime<Utc>>,
    /// When the token expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Time left before expiry.
    pub time_until_expiry: Duration,
    /// Inside the "expiring soon" window.
    pub is_expiring_soon: bool,
    /// The signed-in user.
    pub user: Option<UserRecord>,
}

/// Manages the complete client session lifecycle.
///
/// Wires the throttle, the auth API, the session store, persisted
/// credentials and the refresh scheduler together. Construct one per
/// client session and share it.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: Arc<dyn AuthApi>,
    codec: TokenCodec,
    store: Arc<SessionStore>,
    vault: CredentialVault,
    throttle: LoginThrottle,
    scheduler: RefreshScheduler,
    events: EventBus,
    config: AuthConfig,
}

impl AuthService {
    /// Creates the service and restores persisted throttle counters.
    pub fn new(
        api: Arc<dyn AuthApi>,
        kv: KvManager,
        store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        auth_config: AuthConfig,
        throttle_config: ThrottleConfig,
    ) -> Self {
        let codec = TokenCodec::new(Arc::clone(&clock));
        let vault = CredentialVault::new(kv.clone());
        let throttle = LoginThrottle::new(kv, Arc::clone(&store), clock, throttle_config);
        let scheduler = RefreshScheduler::new(
            Arc::clone(&api),
            codec.clone(),
            Arc::clone(&store),
            vault.clone(),
            events.clone(),
            &auth_config,
        );
        Self {
            api,
            codec,
            store,
            vault,
            throttle,
            scheduler,
            events,
            config: auth_config,
        }
    }

    /// Performs the login flow:
    ///
    /// 1. Refuse locally while locked out, without a network call
    /// 2. Submit credentials
    /// 3. On rejection, charge the throttle
    /// 4. On success, reset the throttle, persist, populate the session
    ///    and arm the refresh timer
    ///
    /// Only a credential rejection counts toward the lockout.
    pub async fn login(&self, request: LoginRequest) -> AppResult<UserRecord> {
        request.validate()?;

        if self.throttle.is_locked() {
            return Err(self.lockout_error());
        }

        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(e) if e.counts_toward_lockout() => {
                let status = e.status.unwrap_or(401);
                return Err(match self.throttle.record_failure() {
                    ThrottleState::Locked { until, .. } => {
                        self.events.publish(AuthEvent::LockedOut { until });
                        self.lockout_error().with_status(status)
                    }
                    ThrottleState::Open { attempts, .. } => {
                        warn!(attempts, "Login rejected");
                        AppError::invalid_credentials(INVALID_CREDENTIALS).with_status(status)
                    }
                });
            }
            Err(e) => {
                if e.is_transient() {
                    warn!(error = %e, "Login could not reach a credential decision, not counted");
                } else {
                    warn!(error = %e, "Login failed without a credential decision");
                }
                return Err(e);
            }
        };

        let Some(expiry) = self.codec.expiry_millis(&response.token) else {
            return Err(AppError::malformed_token(
                "Server returned an undecodable access token",
            ));
        };

        self.throttle.record_success();
        let tokens = response.tokens();
        let user = response.user;
        self.vault.save_login(&tokens, &user)?;
        self.populate(&tokens, &user, Some(expiry));
        self.scheduler.arm(&tokens.token);

        info!(user_id = %user.id, username = %user.username, "Login successful");
        self.events.publish(AuthEvent::LoggedIn {
            user_id: user.id.clone(),
            username: user.username.clone(),
        });
        Ok(user)
    }

    /// Ends the session. The server call is best-effort; local state is
    /// always cleared.
    pub async fn logout(&self) {
        self.scheduler.disarm();
        if let Some(token) = self.store.token() {
            if let Err(e) = self.api.logout(&token).await {
                warn!(error = %e, "Logout request failed, clearing local session anyway");
            }
        }
        self.store.clear();
        self.vault.clear();
        info!("Logged out");
        self.events.publish(AuthEvent::LoggedOut);
    }

    /// Restores a persisted session.
    ///
    /// Returns `true` when a decodable, unexpired token and a user were
    /// found; the session is then populated and the refresh timer armed.
    /// Anything else stored is discarded. Must be called within a tokio
    /// runtime.
    pub fn initialize_from_storage(&self) -> bool {
        let stored = match self.vault.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                return false;
            }
        };

        match (stored.token, stored.user) {
            (Some(token), Some(user))
                if !self.codec.is_expired(&token, self.config.expiry_buffer_seconds) =>
            {
                let tokens = AuthTokens {
                    refresh_token: stored.refresh_token.unwrap_or_default(),
                    token,
                };
                self.populate(&tokens, &user, self.codec.expiry_millis(&tokens.token));
                self.scheduler.arm(&tokens.token);
                info!(user_id = %user.id, "Session restored from storage");
                true
            }
            (None, None) if stored.refresh_token.is_none() => false,
            _ => {
                info!("Stored session is expired or incomplete, clearing");
                self.vault.clear();
                false
            }
        }
    }

    fn populate(&self, tokens: &AuthTokens, user: &UserRecord, expiry: Option<i64>) {
        self.store.set_user(Some(user.clone()));
        self.store.set_token(Some(tokens.token.clone()));
        let refresh = Some(tokens.refresh_token.clone()).filter(|r| !r.is_empty());
        self.store.set_refresh_token(refresh);
        self.store.set_token_expiry(expiry);
        self.store.set_authenticated(true);
    }

    fn lockout_error(&self) -> AppError {
        AppError::account_locked(format!(
            "Account temporarily locked due to too many failed attempts. Try again in {} minutes.",
            self.throttle.remaining_lockout_minutes()
        ))
    }

    /// Renews the token pair, joining any renewal already running.
    pub async fn refresh_token(&self) -> AppResult<AuthTokens> {
        self.scheduler.refresh_now().await
    }

    /// Signed in with an unexpired token.
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// A decodable token outside the expiry buffer and a user are present.
    pub fn is_session_valid(&self) -> bool {
        let token_ok = self
            .store
            .token()
            .is_some_and(|t| !self.codec.is_expired(&t, self.config.expiry_buffer_seconds));
        token_ok && self.store.user().is_some()
    }

    /// Decoded view of the current token.
    pub fn session_info(&self) -> Option<SessionInfo> {
        let token = self.store.token()?;
        let payload = self.codec.decode(&token)?;
        Some(SessionInfo {
            issued_at: payload.issued_at_utc(),
            expires_at: payload.expires_at_utc(),
            time_until_expiry: self.codec.time_until_expiry(&token),
            is_expiring_soon: self
                .codec
                .is_expiring_soon(&token, self.config.expiring_soon_minutes),
            user: self.store.user(),
        })
    }

    /// `Authorization: Bearer …` for the current token.
    pub fn auth_header(&self) -> Option<(&'static str, String)> {
        self.store
            .token()
            .map(|token| ("Authorization", format!("Bearer {token}")))
    }

    /// Asks the server whether the current token is still accepted.
    /// Any failure counts as "no".
    pub async fn validate_token(&self) -> bool {
        let Some(token) = self.store.token() else {
            return false;
        };
        match self.api.validate(&token).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                false
            }
        }
    }

    /// Fetches the user record from the server and replaces the local one.
    pub async fn current_user(&self) -> AppResult<UserRecord> {
        let token = self.require_token()?;
        let user = self.api.me(&token).await?;
        self.store.set_user(Some(user.clone()));
        self.vault.save_user(&user)?;
        Ok(user)
    }

    /// Merges `update` into the current user and persists it.
    pub fn update_profile(&self, update: ProfileUpdate) -> AppResult<UserRecord> {
        let mut user = self
            .store
            .user()
            .ok_or_else(|| AppError::authorization("Not signed in"))?;
        user.merge(update);
        self.store.set_user(Some(user.clone()));
        self.vault.save_user(&user)?;
        Ok(user)
    }

    /// Starts the password reset flow for `email`.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let request = PasswordResetRequest {
            email: email.to_string(),
        };
        request.validate()?;
        self.api.request_password_reset(&request.email).await
    }

    /// Completes a password reset with the emailed token.
    pub async fn confirm_password_reset(&self, reset_token: &str, new_password: &str) -> AppResult<()> {
        let request = PasswordResetConfirmRequest {
            token: reset_token.to_string(),
            new_password: new_password.to_string(),
        };
        request.validate()?;
        self.api
            .confirm_password_reset(&request.token, &request.new_password)
            .await
    }

    /// Changes the signed-in user's password.
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> AppResult<()> {
        let request = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        request.validate()?;
        let token = self.require_token()?;
        self.api
            .change_password(&token, &request.current_password, &request.new_password)
            .await
    }

    fn require_token(&self) -> AppResult<String> {
        self.store
            .token()
            .ok_or_else(|| AppError::authorization("Not signed in"))
    }

    /// The session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The refresh scheduler.
    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    /// The login throttle.
    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    /// The token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// The event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
