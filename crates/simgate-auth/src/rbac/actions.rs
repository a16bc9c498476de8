//! Action/resource to permission tables.

use std::collections::HashMap;

/// Which permissions allow an action on a resource type.
///
/// Two tiers: the general table, and a table consulted first when the
/// caller owns the resource. Pairs in neither table are denied.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    general: HashMap<(String, String), Vec<String>>,
    own: HashMap<(String, String), Vec<String>>,
}

impl ActionTable {
    /// An empty table that denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The school administration tables.
    pub fn standard() -> Self {
        Self::new()
            .allow("view", "student", &["VIEW_STUDENTS", "MANAGE_STUDENTS"])
            .allow("view", "user", &["VIEW_USERS", "MANAGE_USERS"])
            .allow("view", "grade", &["VIEW_GRADES", "MANAGE_GRADES"])
            .allow("view", "report", &["VIEW_REPORTS", "VIEW_BASIC_REPORTS"])
            .allow("create", "student", &["CREATE_STUDENT", "MANAGE_STUDENTS"])
            .allow("create", "user", &["CREATE_USER", "MANAGE_USERS"])
            .allow("create", "grade", &["EDIT_GRADES", "MANAGE_GRADES"])
            .allow("edit", "student", &["EDIT_STUDENT", "MANAGE_STUDENTS"])
            .allow("edit", "user", &["EDIT_USER", "MANAGE_USERS"])
            .allow("edit", "grade", &["EDIT_GRADES", "MANAGE_GRADES"])
            .allow("delete", "student", &["DELETE_STUDENT", "MANAGE_STUDENTS"])
            .allow("delete", "user", &["DELETE_USER", "MANAGE_USERS"])
            .allow_own("view", "profile", &["VIEW_OWN_PROFILE"])
            .allow_own("view", "grade", &["VIEW_OWN_GRADES"])
            .allow_own("view", "schedule", &["VIEW_OWN_SCHEDULE"])
    }

    /// Any of `permissions` allows `action` on `resource`.
    pub fn allow(mut self, action: &str, resource: &str, permissions: &[&str]) -> Self {
        self.general.insert(key(action, resource), owned(permissions));
        self
    }

    /// Any of `permissions` allows `action` on a `resource` the caller owns.
    pub fn allow_own(mut self, action: &str, resource: &str, permissions: &[&str]) -> Self {
        self.own.insert(key(action, resource), owned(permissions));
        self
    }

    /// General requirement for the pair.
    pub fn general(&self, action: &str, resource: &str) -> Option<&[String]> {
        self.general.get(&key(action, resource)).map(Vec::as_slice)
    }

    /// Owner requirement for the pair.
    pub fn own(&self, action: &str, resource: &str) -> Option<&[String]> {
        self.own.get(&key(action, resource)).map(Vec::as_slice)
    }
}

fn key(action: &str, resource: &str) -> (String, String) {
    (action.to_string(), resource.to_string())
}

fn owned(permissions: &[&str]) -> Vec<String> {
    permissions.iter().map(|p| p.to_string()).collect()
}
