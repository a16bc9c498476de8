//! Role-based access control over a static role hierarchy.

pub mod actions;
pub mod catalog;
pub mod evaluator;
pub mod menu;

pub use actions::ActionTable;
pub use catalog::{PermissionDefinition, PermissionGroup, RoleCatalog, RoleCatalogBuilder, RoleDefinition, WILDCARD};
pub use evaluator::RbacEvaluator;
pub use menu::MenuItem;
