//! Renews the access token shortly before it expires, never twice at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use simgate_core::config::AuthConfig;
use simgate_core::error::{AppError, ErrorKind};
use simgate_core::events::{AuthEvent, EventBus};
use simgate_core::result::AppResult;
use simgate_core::traits::AuthApi;
use simgate_core::types::AuthTokens;

use super::flight::{FlightState, RefreshTrigger, SharedRefresh};
use crate::session::{CredentialVault, SessionStore};
use crate::token::TokenCodec;

/// Keeps the session's access token fresh.
///
/// `arm` schedules one timer `refresh_lead` before expiry. When it fires,
/// or when anyone calls [`refresh_now`](Self::refresh_now), a single
/// refresh request runs on its own task and every concurrent caller
/// receives its outcome. Success persists the new pair, updates the
/// session and re-arms. Failure is terminal: the session is cleared and
/// [`AuthEvent::TokenExpired`] is published.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    api: Arc<dyn AuthApi>,
    codec: TokenCodec,
    store: Arc<SessionStore>,
    vault: CredentialVault,
    events: EventBus,
    lead: Duration,
    cooldown: Duration,
    flight: Mutex<FlightState>,
    timer: Mutex<Option<AbortHandle>>,
    /// Bumped by `disarm`; a refresh started under an older value does
    /// not write back its result.
    generation: AtomicU64,
}

impl RefreshScheduler {
    /// Create an unarmed scheduler.
    pub fn new(
        api: Arc<dyn AuthApi>,
        codec: TokenCodec,
        store: Arc<SessionStore>,
        vault: CredentialVault,
        events: EventBus,
        config: &AuthConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                codec,
                store,
                vault,
                events,
                lead: config.refresh_lead(),
                cooldown: config.refresh_cooldown(),
                flight: Mutex::new(FlightState::Idle),
                timer: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Schedule renewal `refresh_lead` before `token` expires.
    ///
    /// Replaces any pending timer. A token already inside the lead window
    /// is renewed right away, or once the post-refresh cooldown has
    /// elapsed. Must be called within a tokio runtime.
    pub fn arm(&self, token: &str) {
        let until_window = self
            .inner
            .codec
            .time_until_expiry(token)
            .saturating_sub(self.inner.lead);
        let cooldown_left = match &*self.inner.flight.lock() {
            FlightState::Cooldown { until, .. } => until.saturating_duration_since(Instant::now()),
            _ => Duration::ZERO,
        };
        let delay = until_window.max(cooldown_left);

        if until_window.is_zero() {
            info!(
                delay_ms = delay.as_millis() as u64,
                "Token is inside the refresh window, renewing"
            );
        } else {
            debug!(delay_ms = delay.as_millis() as u64, "Arming refresh timer");
        }

        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = scheduler.start(RefreshTrigger::Timer).await {
                debug!(error = %e, "Scheduled refresh did not complete");
            }
        })
        .abort_handle();

        if let Some(previous) = self.inner.timer.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the pending timer. Idempotent.
    ///
    /// A refresh already in flight still settles for its callers, but its
    /// result is neither persisted nor used to re-arm. Tokens held for the
    /// cooldown are dropped.
    pub fn disarm(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut flight = self.inner.flight.lock();
            if matches!(*flight, FlightState::Cooldown { .. }) {
                *flight = FlightState::Idle;
            }
        }
        if let Some(handle) = self.inner.timer.lock().take() {
            handle.abort();
            debug!("Refresh timer disarmed");
        }
    }

    /// Renew now, or join the renewal already running.
    pub async fn refresh_now(&self) -> AppResult<AuthTokens> {
        self.start(RefreshTrigger::Explicit).await
    }

    /// Whether a timer is pending.
    pub fn is_armed(&self) -> bool {
        self.inner
            .timer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Whether a refresh request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(*self.inner.flight.lock(), FlightState::InFlight(_))
    }

    async fn start(&self, trigger: RefreshTrigger) -> AppResult<AuthTokens> {
        let shared: SharedRefresh = {
            let mut flight = self.inner.flight.lock();
            match &*flight {
                FlightState::InFlight(shared) => {
                    debug!("Joining in-flight refresh");
                    shared.clone()
                }
                FlightState::Cooldown { tokens, until } if Instant::now() < *until => {
                    debug!("Reusing just-refreshed tokens");
                    return Ok(tokens.clone());
                }
                _ => {
                    let generation = self.inner.generation.load(Ordering::SeqCst);
                    let scheduler = self.clone();
                    let task =
                        tokio::spawn(async move { scheduler.perform(trigger, generation).await });
                    let shared = async move {
                        task.await.unwrap_or_else(|e| {
                            Err(AppError::internal(format!("Refresh task aborted: {e}")))
                        })
                    }
                    .boxed()
                    .shared();
                    *flight = FlightState::InFlight(shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    async fn perform(&self, trigger: RefreshTrigger, generation: u64) -> AppResult<AuthTokens> {
        let result = match self.inner.store.refresh_token() {
            Some(refresh_token) => self.inner.api.refresh(&refresh_token).await,
            None => Err(AppError::refresh_failure("No refresh token available")),
        };
        let current = self.inner.generation.load(Ordering::SeqCst) == generation;

        match result {
            Ok(tokens) => {
                if current {
                    *self.inner.flight.lock() = FlightState::Cooldown {
                        tokens: tokens.clone(),
                        until: Instant::now() + self.inner.cooldown,
                    };
                    self.apply(&tokens);
                } else {
                    *self.inner.flight.lock() = FlightState::Idle;
                    debug!("Scheduler disarmed during refresh, discarding result");
                }
                Ok(tokens)
            }
            Err(e) => {
                *self.inner.flight.lock() = FlightState::Idle;
                let err = into_refresh_failure(e);
                if current {
                    warn!(error = %err, "Token refresh failed, clearing session");
                    if trigger == RefreshTrigger::Timer {
                        self.inner.events.publish(AuthEvent::TokenRefreshFailed {
                            reason: err.message.clone(),
                        });
                    }
                    self.disarm();
                    self.inner.store.clear();
                    self.inner.vault.clear();
                    self.inner.events.publish(AuthEvent::TokenExpired);
                }
                Err(err)
            }
        }
    }

    fn apply(&self, tokens: &AuthTokens) {
        if let Err(e) = self.inner.vault.save_tokens(tokens) {
            warn!(error = %e, "Failed to persist refreshed tokens");
        }
        let expiry = self.inner.codec.expiry_millis(&tokens.token);
        self.inner.store.set_token(Some(tokens.token.clone()));
        self.inner
            .store
            .set_refresh_token(Some(tokens.refresh_token.clone()));
        self.inner.store.set_token_expiry(expiry);
        self.arm(&tokens.token);

        let expires_at = expiry
            .and_then(chrono::DateTime::from_timestamp_millis)
            .unwrap_or_else(|| self.inner.codec.clock().now());
        info!(expires_at = %expires_at, "Token refreshed");
        self.inner
            .events
            .publish(AuthEvent::TokenRefreshed { expires_at });
    }
}

fn into_refresh_failure(err: AppError) -> AppError {
    if err.kind == ErrorKind::RefreshFailure {
        return err;
    }
    let status = err.status;
    let message = format!("Token refresh failed: {}", err.message);
    let mut wrapped = AppError::with_source(ErrorKind::RefreshFailure, message, err);
    wrapped.status = status;
    wrapped
}
