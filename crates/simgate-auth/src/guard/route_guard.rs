//! Per-navigation access decisions.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::routes::RouteTable;
use crate::rbac::{MenuItem, RbacEvaluator};
use crate::session::SessionStore;

/// What the caller was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Requirement {
    /// Any of these permissions.
    Permissions(Vec<String>),
    /// Any of these roles.
    Roles(Vec<String>),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissions(p) => write!(f, "any permission of [{}]", p.join(", ")),
            Self::Roles(r) => write!(f, "any role of [{}]", r.join(", ")),
        }
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Enter the route.
    Proceed,
    /// Sign in first, then come back to `return_to`.
    RedirectToLogin {
        /// The original target.
        return_to: String,
    },
    /// Signed in but not allowed.
    AccessDenied {
        /// What would have been needed.
        required: Requirement,
    },
}

/// Decides whether a route may be entered, from the session as it is now.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    routes: RouteTable,
    store: Arc<SessionStore>,
    rbac: Arc<RbacEvaluator>,
}

impl RouteGuard {
    /// Create a guard over `routes`.
    pub fn new(routes: RouteTable, store: Arc<SessionStore>, rbac: Arc<RbacEvaluator>) -> Self {
        Self {
            routes,
            store,
            rbac,
        }
    }

    /// Decide for `target`: authentication first, then permissions, then roles.
    pub fn decide(&self, target: &str) -> GuardDecision {
        let Some(requirement) = self.routes.lookup(target) else {
            return GuardDecision::Proceed;
        };

        let decision = if requirement.requires_auth && !self.store.is_authenticated() {
            GuardDecision::RedirectToLogin {
                return_to: target.to_string(),
            }
        } else if !requirement.permissions.is_empty()
            && !self.rbac.has_any_permission(&requirement.permissions)
        {
            GuardDecision::AccessDenied {
                required: Requirement::Permissions(requirement.permissions.clone()),
            }
        } else if !requirement.roles.is_empty() && !self.rbac.has_any_role(&requirement.roles) {
            GuardDecision::AccessDenied {
                required: Requirement::Roles(requirement.roles.clone()),
            }
        } else {
            GuardDecision::Proceed
        };

        debug!(target, decision = ?decision, "Route guard decision");
        decision
    }

    /// Whether `target` would be entered.
    pub fn can_access(&self, target: &str) -> bool {
        self.decide(target) == GuardDecision::Proceed
    }

    /// Menu entries the current user may see.
    pub fn filter_menu(&self, items: &[MenuItem]) -> Vec<MenuItem> {
        self.rbac.filter_menu(items, &|route| self.can_access(route))
    }

    /// The route table in use.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}
