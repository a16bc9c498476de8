//! Answers permission and role questions for the signed-in user.

use std::collections::BTreeSet;
use std::sync::Arc;

use simgate_core::types::UserRecord;

use super::actions::ActionTable;
use super::catalog::{PermissionGroup, RoleCatalog, RoleDefinition};
use super::menu::MenuItem;
use crate::session::SessionStore;

/// Role/permission checks against the current session user.
///
/// Every query reads the user from the session store at call time and
/// fails closed: with no user, everything is denied. Permissions are
/// hierarchy-expanded; roles are matched exactly.
#[derive(Debug, Clone)]
pub struct RbacEvaluator {
    catalog: Arc<RoleCatalog>,
    actions: ActionTable,
    store: Arc<SessionStore>,
}

impl RbacEvaluator {
    /// Evaluator with the standard action tables.
    pub fn new(catalog: Arc<RoleCatalog>, store: Arc<SessionStore>) -> Self {
        Self::with_actions(catalog, ActionTable::standard(), store)
    }

    /// Evaluator with custom action tables.
    pub fn with_actions(
        catalog: Arc<RoleCatalog>,
        actions: ActionTable,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            catalog,
            actions,
            store,
        }
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    fn user(&self) -> Option<UserRecord> {
        self.store.user()
    }

    fn user_has_permission(&self, user: &UserRecord, permission: &str) -> bool {
        user.permissions.iter().any(|p| p == permission)
            || user
                .roles
                .iter()
                .any(|role| self.catalog.grants(role, permission))
    }

    /// Direct grant, role grant, or wildcard.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.user()
            .is_some_and(|user| self.user_has_permission(&user, permission))
    }

    /// At least one of `permissions`. False for an empty list.
    pub fn has_any_permission<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        let Some(user) = self.user() else {
            return false;
        };
        permissions
            .iter()
            .any(|p| self.user_has_permission(&user, p.as_ref()))
    }

    /// Every one of `permissions`.
    pub fn has_all_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        let Some(user) = self.user() else {
            return false;
        };
        permissions
            .iter()
            .all(|p| self.user_has_permission(&user, p.as_ref()))
    }

    /// Exact role membership; parents are not considered.
    pub fn has_role(&self, role: &str) -> bool {
        self.user().is_some_and(|user| user.roles.iter().any(|r| r == role))
    }

    /// At least one of `roles`.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        let Some(user) = self.user() else {
            return false;
        };
        roles
            .iter()
            .any(|role| user.roles.iter().any(|r| r == role.as_ref()))
    }

    /// Whether the user may perform `action` on a `resource`.
    ///
    /// When `owner_id` is the user's own id, the owner table is tried
    /// first. Pairs absent from both tables are denied.
    pub fn can_perform_action(&self, action: &str, resource: &str, owner_id: Option<&str>) -> bool {
        let Some(user) = self.user() else {
            return false;
        };

        let is_owner = owner_id.is_some_and(|id| id == user.id.as_str());
        if is_owner {
            if let Some(required) = self.actions.own(action, resource) {
                if required.iter().any(|p| self.user_has_permission(&user, p)) {
                    return true;
                }
            }
        }

        self.actions
            .general(action, resource)
            .is_some_and(|required| required.iter().any(|p| self.user_has_permission(&user, p)))
    }

    /// Direct and role permissions of the user, wildcard expanded, sorted.
    pub fn effective_permissions(&self) -> Vec<String> {
        let Some(user) = self.user() else {
            return Vec::new();
        };
        let mut all: BTreeSet<String> = user.permissions.iter().cloned().collect();
        for role in &user.roles {
            all.extend(self.catalog.role_permissions(role));
        }
        all.into_iter().collect()
    }

    /// Permissions of one role, wildcard expanded.
    pub fn role_permissions(&self, role: &str) -> Vec<String> {
        self.catalog.role_permissions(role)
    }

    /// Name of the user's most privileged role.
    ///
    /// `Guest` without a user, `User` for a user with no roles, and the
    /// first role key when none is in the catalog's precedence list.
    pub fn role_display_name(&self) -> String {
        let Some(user) = self.user() else {
            return "Guest".to_string();
        };
        let Some(first) = user.roles.first() else {
            return "User".to_string();
        };
        self.catalog
            .precedence()
            .iter()
            .find(|role| user.roles.contains(role))
            .map(|role| {
                self.catalog
                    .role(role)
                    .map_or_else(|| role.clone(), |def| def.name.clone())
            })
            .unwrap_or_else(|| first.clone())
    }

    /// Catalog permissions grouped for display.
    pub fn permission_groups(&self) -> Vec<PermissionGroup> {
        self.catalog.permission_groups()
    }

    /// All catalog roles.
    pub fn available_roles(&self) -> &[RoleDefinition] {
        self.catalog.roles()
    }

    /// Keep the entries the user may see, recursively.
    ///
    /// An entry survives when `route_allowed` accepts its route and the
    /// user holds any of its permissions and any of its roles. Children
    /// are filtered independently; a parent is kept even if all its
    /// children are removed.
    pub fn filter_menu(
        &self,
        items: &[MenuItem],
        route_allowed: &dyn Fn(&str) -> bool,
    ) -> Vec<MenuItem> {
        items
            .iter()
            .filter(|item| item.route.as_deref().is_none_or(route_allowed))
            .filter(|item| item.permissions.is_empty() || self.has_any_permission(&item.permissions))
            .filter(|item| item.roles.is_empty() || self.has_any_role(&item.roles))
            .map(|item| MenuItem {
                children: self.filter_menu(&item.children, route_allowed),
                ..item.clone()
            })
            .collect()
    }
}
