//! Navigation menu trees filtered by access.

use serde::{Deserialize, Serialize};

/// A navigation entry, possibly with children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Display label.
    pub label: String,
    /// Route the entry navigates to.
    #[serde(default)]
    pub route: Option<String>,
    /// Any of these permissions shows the entry. Empty means no requirement.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Any of these roles shows the entry. Empty means no requirement.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Nested entries.
    #[serde(default)]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// An entry pointing at `route`.
    pub fn new(label: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            route: Some(route.into()),
            ..Self::default()
        }
    }

    /// Require any of `permissions`.
    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = permissions.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Require any of `roles`.
    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Nest `children` under this entry.
    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }
}
