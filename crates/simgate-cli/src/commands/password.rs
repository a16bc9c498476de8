//! Password reset and change commands.

use clap::{Args, Subcommand};

use crate::output;
use simgate_core::error::AppError;

use super::Context;

/// Arguments for password commands
#[derive(Debug, Args)]
pub struct PasswordArgs {
    /// Password subcommand
    #[command(subcommand)]
    pub command: PasswordCommand,
}

/// Password subcommands
#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Email a reset link
    Reset {
        /// Account email
        email: String,
    },
    /// Set a new password with a reset token
    Confirm {
        /// Token from the reset email
        token: String,
    },
    /// Change the signed-in user's password
    Change,
}

fn prompt_new_password() -> Result<String, AppError> {
    dialoguer::Password::new()
        .with_prompt("New password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Execute password commands
pub async fn execute(ctx: &Context, args: &PasswordArgs) -> Result<(), AppError> {
    match &args.command {
        PasswordCommand::Reset { email } => {
            ctx.auth.request_password_reset(email).await?;
            output::print_success("If the account exists, a reset email is on its way");
        }
        PasswordCommand::Confirm { token } => {
            let new_password = prompt_new_password()?;
            ctx.auth.confirm_password_reset(token, &new_password).await?;
            output::print_success("Password updated, sign in with the new password");
        }
        PasswordCommand::Change => {
            ctx.require_session()?;
            let current = dialoguer::Password::new()
                .with_prompt("Current password")
                .interact()
                .map_err(|e| AppError::internal(format!("Input error: {e}")))?;
            let new_password = prompt_new_password()?;
            ctx.auth.change_password(&current, &new_password).await?;
            output::print_success("Password changed");
        }
    }
    Ok(())
}
