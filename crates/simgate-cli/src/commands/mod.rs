//! CLI command definitions and dispatch.

pub mod access;
pub mod password;
pub mod session;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use simgate_auth::{AuthService, RbacEvaluator, RoleCatalog, RouteGuard, RouteTable, SessionStore};
use simgate_client::HttpAuthApi;
use simgate_core::config::AppConfig;
use simgate_core::error::AppError;
use simgate_core::events::EventBus;
use simgate_core::traits::{Clock, SystemClock};
use simgate_store::KvManager;

/// simgate — sign in to SIM and inspect what the session may do
#[derive(Debug, Parser)]
#[command(name = "simgate", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and persist the session
    Login(session::LoginArgs),
    /// Sign out and forget stored credentials
    Logout,
    /// Show the stored session and token timing
    Status,
    /// Show the signed-in user, roles and effective permissions
    Whoami,
    /// Renew the access token now
    Refresh,
    /// Clear the failed-login counter and any lockout
    Unlock,
    /// Check permissions, roles or actions for the current session
    Can(access::CanArgs),
    /// Show what the route guard decides for a navigation target
    Route(access::RouteArgs),
    /// List the role catalog and what each role grants
    Roles(access::RolesArgs),
    /// Password reset and change
    Password(password::PasswordArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let ctx = Context::load(&self.config)?;
        match &self.command {
            Commands::Login(args) => session::login(&ctx, args, self.format).await,
            Commands::Logout => session::logout(&ctx).await,
            Commands::Status => session::status(&ctx, self.format),
            Commands::Whoami => session::whoami(&ctx, self.format),
            Commands::Refresh => session::refresh(&ctx).await,
            Commands::Unlock => session::unlock(&ctx),
            Commands::Can(args) => access::can(&ctx, args, self.format),
            Commands::Route(args) => access::route(&ctx, args, self.format),
            Commands::Roles(args) => access::roles(&ctx, args, self.format),
            Commands::Password(args) => password::execute(&ctx, args).await,
        }
    }
}

/// Everything a command needs, restored from persistent storage.
pub struct Context {
    /// Session lifecycle.
    pub auth: AuthService,
    /// Permission checks for the stored user.
    pub rbac: Arc<RbacEvaluator>,
    /// Navigation decisions.
    pub guard: RouteGuard,
}

impl Context {
    /// Build the engine from configuration and restore the last session.
    pub fn load(config_path: &str) -> Result<Self, AppError> {
        let env = std::env::var("SIMGATE_ENV").unwrap_or_else(|_| "development".to_string());
        let config = AppConfig::load(config_path, &env)?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let kv = KvManager::new(&config.storage)?;
        let store = Arc::new(SessionStore::with_clock(Arc::clone(&clock)));
        let api = Arc::new(HttpAuthApi::new(&config.api)?);

        let auth = AuthService::new(
            api,
            kv,
            Arc::clone(&store),
            clock,
            EventBus::default(),
            config.auth.clone(),
            config.throttle.clone(),
        );
        auth.initialize_from_storage();

        let rbac = Arc::new(RbacEvaluator::new(
            Arc::new(RoleCatalog::standard()),
            Arc::clone(&store),
        ));
        let guard = RouteGuard::new(RouteTable::standard(), store, Arc::clone(&rbac));

        Ok(Self { auth, rbac, guard })
    }

    /// Fail unless a valid session is present.
    pub fn require_session(&self) -> Result<(), AppError> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::authorization(
                "Not signed in. Run `simgate login` first.",
            ))
        }
    }
}
