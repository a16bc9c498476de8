//! Declared access requirements per route.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// What a route needs before it may be entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequirement {
    /// Only signed-in users.
    #[serde(default)]
    pub requires_auth: bool,
    /// Any of these permissions.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Any of these roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl RouteRequirement {
    /// Open to everyone.
    pub fn public() -> Self {
        Self::default()
    }

    /// Signed-in users only.
    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    /// Signed-in users holding any of `permissions`.
    pub fn with_permissions(permissions: &[&str]) -> Self {
        Self {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            ..Self::authenticated()
        }
    }

    /// Signed-in users holding any of `roles`.
    pub fn with_roles(roles: &[&str]) -> Self {
        Self {
            roles: roles.iter().map(|r| r.to_string()).collect(),
            ..Self::authenticated()
        }
    }
}

/// Route name to requirement. Unlisted routes are unrestricted.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteRequirement>,
}

impl RouteTable {
    /// A table with no routes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The application's routes.
    pub fn standard() -> Self {
        Self::empty()
            .route("login", RouteRequirement::public())
            .route("profile", RouteRequirement::authenticated())
            .route("dashboard", RouteRequirement::with_permissions(&["VIEW_DASHBOARD"]))
            .route(
                "students",
                RouteRequirement::with_permissions(&["VIEW_STUDENTS", "MANAGE_STUDENTS"]),
            )
            .route(
                "users",
                RouteRequirement::with_permissions(&["VIEW_USERS", "MANAGE_USERS"]),
            )
            .route(
                "grades",
                RouteRequirement::with_permissions(&["VIEW_GRADES", "MANAGE_GRADES"]),
            )
            .route(
                "reports",
                RouteRequirement::with_permissions(&["VIEW_REPORTS", "VIEW_BASIC_REPORTS"]),
            )
            .route("settings", RouteRequirement::with_roles(&["ADMIN", "SUPER_ADMIN"]))
    }

    /// Add or replace a route.
    pub fn route(mut self, name: &str, requirement: RouteRequirement) -> Self {
        self.routes.insert(name.to_string(), requirement);
        self
    }

    /// Requirement for a navigation target.
    ///
    /// Accepts bare names (`students`), paths (`/students/12`) and hash
    /// fragments (`#/students?page=2`); an exact match wins over the
    /// first path segment.
    pub fn lookup(&self, target: &str) -> Option<&RouteRequirement> {
        let path = normalize(target);
        self.routes.get(path).or_else(|| {
            path.split('/')
                .next()
                .and_then(|segment| self.routes.get(segment))
        })
    }

    /// Route names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Strip the fragment marker, leading slashes and any query string.
pub fn normalize(target: &str) -> &str {
    let target = target.trim_start_matches('#').trim_start_matches('/');
    target.split(['?', '#']).next().unwrap_or(target)
}
