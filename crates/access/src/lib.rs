//! Role based access control for the SPK platform.
//!
//! Permissions are dotted `module.action` keys granted to roles; users hold
//! roles. [`Viewer`] answers authorization questions for one signed-in user,
//! and [`AccessService`] enforces the rules for managing roles.

pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod key;
pub mod service;
pub mod store;
pub mod viewer;

#[cfg(test)]
mod mock_store;

pub use entity::{group_by_module, ModuleGroup, PermissionEntity, PermissionView, RoleEntity, RoleView};
pub use error::{AccessError, AccessResult};
pub use hierarchy::{is_super_admin, is_system_role, role_badge, role_level, SYSTEM_ROLES};
pub use key::{level_for_action, parse_permission_key, PermissionKey, PermissionLevel};
pub use service::AccessService;
pub use store::{RoleStore, SqlRoleStore};
pub use viewer::{MemberScope, Viewer};
