//! Permission, role and route inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use simgate_auth::GuardDecision;
use simgate_core::error::AppError;

use super::Context;

/// Arguments for `can`
#[derive(Debug, Args)]
pub struct CanArgs {
    /// What to check
    #[command(subcommand)]
    pub check: CanCheck,
}

/// Kinds of access checks
#[derive(Debug, Subcommand)]
pub enum CanCheck {
    /// Holds any (or all) of these permissions
    Permission {
        /// Permission keys
        #[arg(required = true)]
        keys: Vec<String>,
        /// Require every key instead of any
        #[arg(long)]
        all: bool,
    },
    /// Holds any of these roles
    Role {
        /// Role keys
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// May perform an action on a resource
    Action {
        /// Action, e.g. `edit`
        action: String,
        /// Resource, e.g. `grade`
        resource: String,
        /// Owner of the resource, for own-resource rules
        #[arg(long)]
        owner: Option<String>,
    },
}

/// Arguments for `route`
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Navigation target, e.g. `students` or `#/grades?term=2`
    pub target: Option<String>,
}

/// Arguments for `roles`
#[derive(Debug, Args)]
pub struct RolesArgs {
    /// Show the resolved permissions of a single role
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    check: String,
    allowed: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct RouteRow {
    /// Route
    route: String,
    /// Decision
    decision: String,
}

#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    /// Key
    key: String,
    /// Inherits
    inherits: String,
    /// Permissions
    permissions: usize,
}

#[derive(Debug, Serialize, Tabled)]
struct PermissionRow {
    /// Permission
    permission: String,
}

fn describe(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Proceed => "proceed".to_string(),
        GuardDecision::RedirectToLogin { return_to } => {
            format!("redirect to login (return to {return_to})")
        }
        GuardDecision::AccessDenied { required } => format!("denied, needs {required}"),
    }
}

/// Evaluate an access check against the stored session
pub fn can(ctx: &Context, args: &CanArgs, format: OutputFormat) -> Result<(), AppError> {
    let result = match &args.check {
        CanCheck::Permission { keys, all } => CheckResult {
            check: format!("{} of [{}]", if *all { "all" } else { "any" }, keys.join(", ")),
            allowed: if *all {
                ctx.rbac.has_all_permissions(keys)
            } else {
                ctx.rbac.has_any_permission(keys)
            },
        },
        CanCheck::Role { keys } => CheckResult {
            check: format!("any role of [{}]", keys.join(", ")),
            allowed: ctx.rbac.has_any_role(keys),
        },
        CanCheck::Action {
            action,
            resource,
            owner,
        } => CheckResult {
            check: format!("{action} {resource}"),
            allowed: ctx
                .rbac
                .can_perform_action(action, resource, owner.as_deref()),
        },
    };
    output::print_item(&result, format);
    Ok(())
}

/// Show guard decisions for one target or every known route
pub fn route(ctx: &Context, args: &RouteArgs, format: OutputFormat) -> Result<(), AppError> {
    match &args.target {
        Some(target) => {
            let decision = ctx.guard.decide(target);
            match format {
                OutputFormat::Json => output::print_item(&decision, format),
                OutputFormat::Table => output::print_kv(target, &describe(&decision)),
            }
        }
        None => {
            let rows: Vec<RouteRow> = ctx
                .guard
                .routes()
                .names()
                .into_iter()
                .map(|name| RouteRow {
                    route: name.to_string(),
                    decision: describe(&ctx.guard.decide(name)),
                })
                .collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}

/// List catalog roles, or one role's resolved permissions
pub fn roles(ctx: &Context, args: &RolesArgs, format: OutputFormat) -> Result<(), AppError> {
    match &args.role {
        Some(role) => {
            if ctx.rbac.catalog().role(role).is_none() {
                return Err(AppError::validation(format!("Unknown role: {role}")));
            }
            let rows: Vec<PermissionRow> = ctx
                .rbac
                .role_permissions(role)
                .into_iter()
                .map(|permission| PermissionRow { permission })
                .collect();
            output::print_list(&rows, format);
        }
        None => {
            let rows: Vec<RoleRow> = ctx
                .rbac
                .available_roles()
                .iter()
                .map(|role| RoleRow {
                    key: role.key.clone(),
                    inherits: role.parents.join(", "),
                    permissions: ctx.rbac.role_permissions(&role.key).len(),
                })
                .collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}
