//! simgate agent
//!
//! Long-running session holder: restores the persisted session, keeps the
//! access token renewed ahead of expiry and logs lifecycle events until
//! shut down.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt};

use simgate_auth::{AuthService, SessionStore};
use simgate_client::HttpAuthApi;
use simgate_core::config::AppConfig;
use simgate_core::error::AppError;
use simgate_core::events::{AuthEvent, EventBus};
use simgate_core::traits::{Clock, SystemClock};
use simgate_store::KvManager;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Agent error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("SIMGATE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("SIMGATE_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting simgate agent v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    tracing::info!(provider = %config.storage.provider, "Opening credential storage");
    let kv = KvManager::new(&config.storage)?;
    let store = Arc::new(SessionStore::with_clock(Arc::clone(&clock)));
    let events = EventBus::default();
    let api = Arc::new(HttpAuthApi::new(&config.api)?);
    tracing::info!(base_url = %config.api.base_url, "Auth API client ready");

    let auth = AuthService::new(
        api,
        kv,
        store,
        clock,
        events.clone(),
        config.auth.clone(),
        config.throttle.clone(),
    );

    let mut rx = events.subscribe();

    if auth.initialize_from_storage() {
        if let Some(info) = auth.session_info() {
            tracing::info!(
                user = info.user.as_ref().map(|u| u.username.as_str()).unwrap_or("-"),
                expires_in_secs = info.time_until_expiry.as_secs(),
                "Session restored"
            );
        }
    } else {
        tracing::warn!("No valid stored session; sign in with `simgate login` and restart");
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
            received = rx.recv() => match received {
                Ok(event) => match &event.payload {
                    AuthEvent::TokenRefreshFailed { reason } => {
                        tracing::warn!(event_id = %event.id, %reason, "Token refresh failed");
                    }
                    AuthEvent::TokenExpired => {
                        tracing::warn!(event_id = %event.id, "Session expired");
                    }
                    payload => {
                        tracing::info!(event_id = %event.id, event = payload.name(), "Session event");
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    auth.scheduler().disarm();
    tracing::info!("simgate agent stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
