//! Login, logout and session inspection commands.

use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use simgate_core::error::AppError;
use simgate_core::types::LoginRequest;

use super::Context;

/// Arguments for login
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Email or username (will prompt if not provided)
    #[arg(short, long)]
    pub identifier: Option<String>,
    /// Password (will prompt if not provided)
    #[arg(short, long)]
    pub password: Option<String>,
    /// Ask the server for a long-lived session
    #[arg(long)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize)]
struct StatusView {
    authenticated: bool,
    username: Option<String>,
    issued_at: Option<String>,
    expires_at: Option<String>,
    expires_in: Option<String>,
    expiring_soon: bool,
    failed_attempts: u32,
    locked_for_minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WhoamiView {
    id: String,
    username: String,
    email: Option<String>,
    role: String,
    roles: Vec<String>,
    permissions: Vec<String>,
}

/// Prompt for anything missing and sign in
pub async fn login(ctx: &Context, args: &LoginArgs, format: OutputFormat) -> Result<(), AppError> {
    let identifier = match &args.identifier {
        Some(i) => i.clone(),
        None => dialoguer::Input::<String>::new()
            .with_prompt("Email or username")
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };
    let password = match &args.password {
        Some(p) => p.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };

    let mut request = LoginRequest::new(identifier, password);
    request.remember_me = args.remember_me;

    match ctx.auth.login(request).await {
        Ok(user) => {
            output::print_success(&format!("Signed in as {}", user.username));
            whoami(ctx, format)
        }
        Err(e) => {
            let throttle = ctx.auth.throttle();
            if !throttle.is_locked() && throttle.attempts() > 0 {
                output::print_warning(&format!(
                    "{} of {} attempts used",
                    throttle.attempts(),
                    throttle.max_attempts()
                ));
            }
            Err(e)
        }
    }
}

/// Sign out
pub async fn logout(ctx: &Context) -> Result<(), AppError> {
    ctx.auth.logout().await;
    output::print_success("Signed out");
    Ok(())
}

/// Print session and throttle state
pub fn status(ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let throttle = ctx.auth.throttle();
    let info = ctx.auth.session_info();
    let view = StatusView {
        authenticated: ctx.auth.is_authenticated(),
        username: ctx.auth.store().user().map(|u| u.username),
        issued_at: info.as_ref().and_then(|i| i.issued_at).map(|t| t.to_rfc3339()),
        expires_at: info.as_ref().and_then(|i| i.expires_at).map(|t| t.to_rfc3339()),
        expires_in: info
            .as_ref()
            .map(|i| format!("{}s", i.time_until_expiry.as_secs())),
        expiring_soon: info.as_ref().is_some_and(|i| i.is_expiring_soon),
        failed_attempts: throttle.attempts(),
        locked_for_minutes: throttle
            .is_locked()
            .then(|| throttle.remaining_lockout_minutes()),
    };
    output::print_item(&view, format);
    Ok(())
}

/// Print the signed-in user
pub fn whoami(ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    ctx.require_session()?;
    let user = ctx
        .auth
        .store()
        .user()
        .ok_or_else(|| AppError::internal("Session has no user"))?;

    let view = WhoamiView {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: ctx.rbac.role_display_name(),
        roles: user.roles.clone(),
        permissions: ctx.rbac.effective_permissions(),
    };
    output::print_item(&view, format);
    Ok(())
}

/// Renew the access token through the single-flight path
pub async fn refresh(ctx: &Context) -> Result<(), AppError> {
    ctx.require_session()?;
    ctx.auth.refresh_token().await?;
    let expires = ctx
        .auth
        .session_info()
        .and_then(|i| i.expires_at)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    output::print_success(&format!("Token renewed, expires {expires}"));
    Ok(())
}

/// Reset the failed-login counter
pub fn unlock(ctx: &Context) -> Result<(), AppError> {
    let throttle = ctx.auth.throttle();
    let was_locked = throttle.is_locked();
    throttle.record_success();
    if was_locked {
        output::print_success("Lockout cleared");
    } else {
        output::print_success("Failed-login counter reset");
    }
    Ok(())
}
