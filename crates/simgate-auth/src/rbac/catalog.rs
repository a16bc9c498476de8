//! Role hierarchy and permission catalog.
//!
//! A role inherits every permission of the roles it lists as parents,
//! transitively. The `*` permission on any role in that closure grants
//! everything.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use simgate_core::error::AppError;
use simgate_core::result::AppResult;

/// Grants every permission.
pub const WILDCARD: &str = "*";

/// One role of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    /// Role key as it appears in user records, e.g. `TEACHER`.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Roles whose permissions this role inherits.
    pub parents: Vec<String>,
    /// Permissions granted by this role itself.
    pub permissions: Vec<String>,
}

/// One permission of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    /// Permission key, e.g. `VIEW_REPORTS`.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Display group.
    pub group: String,
}

/// Permissions sharing a display group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGroup {
    /// Group name.
    pub name: String,
    /// Members in catalog order.
    pub permissions: Vec<PermissionDefinition>,
}

/// Immutable, validated role and permission catalog.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    roles: Vec<RoleDefinition>,
    index: HashMap<String, usize>,
    permissions: Vec<PermissionDefinition>,
    precedence: Vec<String>,
}

impl RoleCatalog {
    /// Start an empty catalog.
    pub fn builder() -> RoleCatalogBuilder {
        RoleCatalogBuilder::default()
    }

    /// The school administration catalog.
    ///
    /// `SUPER_ADMIN` inherits `ADMIN`, which inherits `TEACHER`, which
    /// inherits `STAFF`. `STUDENT` stands alone.
    pub fn standard() -> Self {
        let mut builder = Self::builder()
            .role(
                "SUPER_ADMIN",
                "Super Administrator",
                "Full system access",
                &["ADMIN"],
                &[WILDCARD],
            )
            .role(
                "ADMIN",
                "Administrator",
                "Administrative access",
                &["TEACHER"],
                &[
                    "VIEW_DASHBOARD",
                    "MANAGE_USERS",
                    "MANAGE_STUDENTS",
                    "MANAGE_GRADES",
                    "VIEW_REPORTS",
                    "EXPORT_DATA",
                    "MANAGE_SYSTEM_SETTINGS",
                ],
            )
            .role(
                "TEACHER",
                "Teacher",
                "Teaching staff access",
                &["STAFF"],
                &[
                    "VIEW_DASHBOARD",
                    "VIEW_STUDENTS",
                    "MANAGE_GRADES",
                    "VIEW_REPORTS",
                    "EXPORT_STUDENT_DATA",
                ],
            )
            .role(
                "STAFF",
                "Staff",
                "General staff access",
                &[],
                &["VIEW_DASHBOARD", "VIEW_STUDENTS", "VIEW_BASIC_REPORTS"],
            )
            .role(
                "STUDENT",
                "Student",
                "Student access",
                &[],
                &["VIEW_OWN_PROFILE", "VIEW_OWN_GRADES", "VIEW_OWN_SCHEDULE"],
            );

        let groups: [(&str, &[(&str, &str, &str)]); 7] = [
            (
                "Dashboard",
                &[("VIEW_DASHBOARD", "View Dashboard", "Access to main dashboard")],
            ),
            (
                "User Management",
                &[
                    ("VIEW_USERS", "View Users", "View user list"),
                    ("CREATE_USER", "Create User", "Create new users"),
                    ("EDIT_USER", "Edit User", "Edit user information"),
                    ("DELETE_USER", "Delete User", "Delete users"),
                    ("MANAGE_USERS", "Manage Users", "Full user management"),
                ],
            ),
            (
                "Student Management",
                &[
                    ("VIEW_STUDENTS", "View Students", "View student list"),
                    ("CREATE_STUDENT", "Create Student", "Create new students"),
                    ("EDIT_STUDENT", "Edit Student", "Edit student information"),
                    ("DELETE_STUDENT", "Delete Student", "Delete students"),
                    ("MANAGE_STUDENTS", "Manage Students", "Full student management"),
                ],
            ),
            (
                "Grade Management",
                &[
                    ("VIEW_GRADES", "View Grades", "View grade information"),
                    ("EDIT_GRADES", "Edit Grades", "Edit grade information"),
                    ("MANAGE_GRADES", "Manage Grades", "Full grade management"),
                ],
            ),
            (
                "Reports",
                &[
                    ("VIEW_REPORTS", "View Reports", "Access to reports"),
                    ("VIEW_BASIC_REPORTS", "View Basic Reports", "Access to basic reports"),
                    ("EXPORT_DATA", "Export Data", "Export system data"),
                    ("EXPORT_STUDENT_DATA", "Export Student Data", "Export student data"),
                ],
            ),
            (
                "System",
                &[(
                    "MANAGE_SYSTEM_SETTINGS",
                    "Manage System Settings",
                    "Access to system settings",
                )],
            ),
            (
                "Personal",
                &[
                    ("VIEW_OWN_PROFILE", "View Own Profile", "View own profile"),
                    ("VIEW_OWN_GRADES", "View Own Grades", "View own grades"),
                    ("VIEW_OWN_SCHEDULE", "View Own Schedule", "View own schedule"),
                ],
            ),
        ];
        for (group, entries) in groups {
            for (key, name, description) in entries {
                builder = builder.permission(group, key, name, description);
            }
        }

        builder
            .precedence(&["SUPER_ADMIN", "ADMIN", "TEACHER", "STAFF", "STUDENT"])
            .assemble()
    }

    /// Reject hierarchies with unknown parents or cycles.
    pub fn validate(&self) -> AppResult<()> {
        for role in &self.roles {
            for parent in &role.parents {
                if !self.index.contains_key(parent) {
                    return Err(AppError::configuration(format!(
                        "Role '{}' lists unknown parent '{parent}'",
                        role.key
                    )));
                }
            }
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(catalog: &RoleCatalog, i: usize, marks: &mut [Mark]) -> AppResult<()> {
            match marks[i] {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    return Err(AppError::configuration(format!(
                        "Role hierarchy has a cycle through '{}'",
                        catalog.roles[i].key
                    )));
                }
                Mark::Unvisited => {}
            }
            marks[i] = Mark::InProgress;
            for parent in &catalog.roles[i].parents {
                if let Some(&p) = catalog.index.get(parent) {
                    visit(catalog, p, marks)?;
                }
            }
            marks[i] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.roles.len()];
        for i in 0..self.roles.len() {
            visit(self, i, &mut marks)?;
        }
        Ok(())
    }

    /// Look up a role.
    pub fn role(&self, key: &str) -> Option<&RoleDefinition> {
        self.index.get(key).map(|&i| &self.roles[i])
    }

    /// All roles in declaration order.
    pub fn roles(&self) -> &[RoleDefinition] {
        &self.roles
    }

    /// Own and inherited permissions of `role`, `*` included verbatim.
    ///
    /// Unknown roles resolve to nothing. Each role is visited once, so a
    /// cycle cannot recurse forever.
    pub fn resolve(&self, role: &str) -> HashSet<String> {
        let mut visited = HashSet::new();
        let mut out = HashSet::new();
        self.collect(role, &mut visited, &mut out);
        out
    }

    fn collect(&self, role: &str, visited: &mut HashSet<String>, out: &mut HashSet<String>) {
        if !visited.insert(role.to_string()) {
            return;
        }
        let Some(def) = self.role(role) else {
            return;
        };
        out.extend(def.permissions.iter().cloned());
        for parent in &def.parents {
            self.collect(parent, visited, out);
        }
    }

    /// Whether `role` resolves to `permission` or to the wildcard.
    pub fn grants(&self, role: &str, permission: &str) -> bool {
        let resolved = self.resolve(role);
        resolved.contains(WILDCARD) || resolved.contains(permission)
    }

    /// Permissions of `role` with the wildcard expanded, sorted.
    pub fn role_permissions(&self, role: &str) -> Vec<String> {
        let resolved = self.resolve(role);
        let mut permissions: Vec<String> = if resolved.contains(WILDCARD) {
            self.all_permissions()
        } else {
            resolved.into_iter().collect()
        };
        permissions.sort();
        permissions
    }

    /// Every concrete permission the catalog knows of.
    pub fn all_permissions(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let defined = self.permissions.iter().map(|p| p.key.as_str());
        let granted = self.roles.iter().flat_map(|r| r.permissions.iter().map(String::as_str));
        defined
            .chain(granted)
            .filter(|p| *p != WILDCARD && seen.insert(*p))
            .map(String::from)
            .collect()
    }

    /// Permission definitions grouped for display, in catalog order.
    pub fn permission_groups(&self) -> Vec<PermissionGroup> {
        let mut groups: Vec<PermissionGroup> = Vec::new();
        for permission in &self.permissions {
            match groups.iter_mut().find(|g| g.name == permission.group) {
                Some(group) => group.permissions.push(permission.clone()),
                None => groups.push(PermissionGroup {
                    name: permission.group.clone(),
                    permissions: vec![permission.clone()],
                }),
            }
        }
        groups
    }

    /// Role keys from most to least privileged, for display.
    pub fn precedence(&self) -> &[String] {
        &self.precedence
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Incrementally defines a [`RoleCatalog`].
#[derive(Debug, Default)]
pub struct RoleCatalogBuilder {
    roles: Vec<RoleDefinition>,
    permissions: Vec<PermissionDefinition>,
    precedence: Vec<String>,
}

impl RoleCatalogBuilder {
    /// Add or replace a role.
    pub fn role(
        mut self,
        key: &str,
        name: &str,
        description: &str,
        parents: &[&str],
        permissions: &[&str],
    ) -> Self {
        self.roles.retain(|r| r.key != key);
        self.roles.push(RoleDefinition {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    /// Describe a permission for display.
    pub fn permission(mut self, group: &str, key: &str, name: &str, description: &str) -> Self {
        self.permissions.retain(|p| p.key != key);
        self.permissions.push(PermissionDefinition {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            group: group.to_string(),
        });
        self
    }

    /// Display precedence, most privileged first.
    pub fn precedence(mut self, roles: &[&str]) -> Self {
        self.precedence = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Finish and validate.
    pub fn build(self) -> AppResult<RoleCatalog> {
        let catalog = self.assemble();
        catalog.validate()?;
        Ok(catalog)
    }

    fn assemble(self) -> RoleCatalog {
        let index = self
            .roles
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key.clone(), i))
            .collect();
        RoleCatalog {
            roles: self.roles,
            index,
            permissions: self.permissions,
            precedence: self.precedence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simgate_core::ErrorKind;

    #[test]
    fn test_standard_catalog_is_valid() {
        RoleCatalog::standard().validate().unwrap();
    }

    #[test]
    fn test_inheritance_is_transitive() {
        let catalog = RoleCatalog::standard();
        assert!(catalog.grants("ADMIN", "VIEW_BASIC_REPORTS"));
        assert!(catalog.grants("TEACHER", "VIEW_BASIC_REPORTS"));
        assert!(!catalog.grants("TEACHER", "MANAGE_USERS"));
        assert!(!catalog.grants("STAFF", "MANAGE_GRADES"));
        assert!(!catalog.grants("STUDENT", "VIEW_DASHBOARD"));
    }

    #[test]
    fn test_wildcard_from_parent() {
        let catalog = RoleCatalog::builder()
            .role("ROOT", "Root", "", &[], &[WILDCARD])
            .role("DELEGATE", "Delegate", "", &["ROOT"], &[])
            .build()
            .unwrap();
        assert!(catalog.grants("DELEGATE", "ANYTHING_AT_ALL"));
        assert!(!catalog.grants("UNKNOWN", "ANYTHING_AT_ALL"));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = RoleCatalog::builder()
            .role("A", "A", "", &["B"], &["P1"])
            .role("B", "B", "", &["A"], &["P2"])
            .build()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = RoleCatalog::builder()
            .role("A", "A", "", &["GHOST"], &[])
            .build()
            .unwrap_err();
        assert!(err.message.contains("GHOST"));
    }

    #[test]
    fn test_resolve_terminates_on_cycle() {
        let catalog = RoleCatalog::builder()
            .role("A", "A", "", &["B"], &["P1"])
            .role("B", "B", "", &["A"], &["P2"])
            .assemble();
        let resolved = catalog.resolve("A");
        assert!(resolved.contains("P1") && resolved.contains("P2"));
    }

    #[test]
    fn test_wildcard_expands_to_catalog() {
        let catalog = RoleCatalog::standard();
        let all = catalog.role_permissions("SUPER_ADMIN");
        assert!(all.contains(&"DELETE_USER".to_string()));
        assert!(!all.contains(&WILDCARD.to_string()));
        assert_eq!(all.len(), catalog.all_permissions().len());
    }

    #[test]
    fn test_permission_groups_keep_order() {
        let groups = RoleCatalog::standard().permission_groups();
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Dashboard",
                "User Management",
                "Student Management",
                "Grade Management",
                "Reports",
                "System",
                "Personal"
            ]
        );
        assert_eq!(groups[1].permissions.len(), 5);
    }
}
