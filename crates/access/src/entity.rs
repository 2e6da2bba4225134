//! Role and permission entities with their derived views.

use once_cell::sync::OnceCell;
use serde::Serialize;
use spk_database::{Permission, Role};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::AccessResult;
use crate::hierarchy::{is_super_admin, is_system_role, role_badge, role_level};
use crate::key::{module_icon, module_label, parse_permission_key, PermissionKey, PermissionLevel};
use crate::store::RoleStore;

/// A permission row together with its parsed key.
#[derive(Debug)]
pub struct PermissionEntity {
    permission: Permission,
    key: PermissionKey,
    roles: OnceCell<Vec<Role>>,
}

impl PermissionEntity {
    pub fn new(permission: Permission) -> AccessResult<Self> {
        let key = parse_permission_key(&permission.key)?;
        Ok(Self {
            permission,
            key,
            roles: OnceCell::new(),
        })
    }

    pub fn id(&self) -> i64 {
        self.permission.id
    }

    pub fn key(&self) -> &PermissionKey {
        &self.key
    }

    pub fn level(&self) -> PermissionLevel {
        self.key.level()
    }

    /// Roles holding this permission, fetched once per entity.
    pub async fn roles<S: RoleStore>(&self, store: &S) -> AccessResult<&[Role]> {
        if let Some(cached) = self.roles.get() {
            return Ok(cached);
        }
        let fetched = store.permission_roles(self.permission.id).await?;
        Ok(self.roles.get_or_init(|| fetched))
    }

    pub fn view(&self) -> PermissionView {
        let level = self.level();
        PermissionView {
            id: self.permission.id,
            key: self.permission.key.clone(),
            description: self.permission.description.clone(),
            module: self.key.module.clone(),
            action: self.key.action.clone(),
            module_label: self.key.module_label(),
            level,
            level_value: level.value(),
            level_label: level.label(),
            badge: level.badge(),
            icon: self.key.action_icon(),
            roles: self.roles.get().map(|roles| roles.iter().map(|r| r.title.clone()).collect()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionView {
    pub id: i64,
    pub key: String,
    pub description: Option<String>,
    pub module: String,
    pub action: Option<String>,
    pub module_label: String,
    pub level: PermissionLevel,
    pub level_value: u8,
    pub level_label: &'static str,
    pub badge: &'static str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// Permissions of one module, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleGroup {
    pub module: String,
    pub label: String,
    pub icon: &'static str,
    pub permissions: Vec<PermissionView>,
}

/// Groups permissions by module. Groups are sorted by label and each group
/// by level then action. Rows with malformed keys are skipped.
pub fn group_by_module(permissions: &[Permission]) -> Vec<ModuleGroup> {
    let mut modules: BTreeMap<String, Vec<PermissionView>> = BTreeMap::new();

    for permission in permissions {
        match PermissionEntity::new(permission.clone()) {
            Ok(entity) => {
                let view = entity.view();
                modules.entry(view.module.clone()).or_default().push(view);
            }
            Err(error) => warn!(key = %permission.key, %error, "skipping malformed permission key"),
        }
    }

    let mut groups: Vec<ModuleGroup> = modules
        .into_iter()
        .map(|(module, mut permissions)| {
            permissions.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.action.cmp(&b.action)));
            ModuleGroup {
                label: module_label(&module),
                icon: module_icon(&module),
                module,
                permissions,
            }
        })
        .collect();

    groups.sort_by(|a, b| a.label.cmp(&b.label));
    groups
}

/// A role row with a lazily loaded permission list.
#[derive(Debug)]
pub struct RoleEntity {
    role: Role,
    permissions: OnceCell<Vec<Permission>>,
}

impl RoleEntity {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            permissions: OnceCell::new(),
        }
    }

    pub fn with_permissions(role: Role, permissions: Vec<Permission>) -> Self {
        let entity = Self::new(role);
        let _ = entity.permissions.set(permissions);
        entity
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn id(&self) -> i64 {
        self.role.id
    }

    pub fn title(&self) -> &str {
        &self.role.title
    }

    pub fn level(&self) -> u8 {
        role_level(&self.role.title)
    }

    pub fn badge(&self) -> &'static str {
        role_badge(&self.role.title)
    }

    pub fn is_system(&self) -> bool {
        is_system_role(&self.role.title)
    }

    pub fn is_super_admin(&self) -> bool {
        is_super_admin(&self.role.title)
    }

    pub fn user_count(&self) -> i64 {
        self.role.user_count
    }

    pub async fn load_permissions<S: RoleStore>(&self, store: &S) -> AccessResult<&[Permission]> {
        if let Some(cached) = self.permissions.get() {
            return Ok(cached);
        }
        let fetched = store.role_permissions(self.role.id).await?;
        Ok(self.permissions.get_or_init(|| fetched))
    }

    /// Cached permissions; empty until loaded.
    pub fn permissions(&self) -> &[Permission] {
        self.permissions.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_permission(&self, key: &str) -> bool {
        self.is_super_admin() || self.permissions().iter().any(|p| p.key == key)
    }

    /// Sum of the levels of every granted permission.
    pub fn permission_score(&self) -> u32 {
        self.permissions()
            .iter()
            .filter_map(|p| parse_permission_key(&p.key).ok())
            .map(|key| u32::from(key.level().value()))
            .sum()
    }

    pub fn modules(&self) -> Vec<ModuleGroup> {
        group_by_module(self.permissions())
    }

    pub fn view(&self) -> RoleView {
        RoleView {
            id: self.role.id,
            title: self.role.title.clone(),
            description: self.role.description.clone(),
            level: self.level(),
            badge: self.badge(),
            is_system: self.is_system(),
            is_super_admin: self.is_super_admin(),
            user_count: self.role.user_count,
            permission_count: self.permissions().len(),
            permission_score: self.permission_score(),
            modules: self.modules(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub level: u8,
    pub badge: &'static str,
    pub is_system: bool,
    pub is_super_admin: bool,
    pub user_count: i64,
    pub permission_count: usize,
    pub permission_score: u32,
    pub modules: Vec<ModuleGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn permission(id: i64, key: &str) -> Permission {
        Permission {
            id,
            key: key.to_string(),
            description: None,
        }
    }

    fn role(title: &str) -> Role {
        Role {
            id: 7,
            title: title.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_count: 3,
        }
    }

    #[test]
    fn groups_sorted_by_label_then_level() {
        let groups = group_by_module(&[
            permission(1, "member.delete"),
            permission(2, "blog.view"),
            permission(3, "member.view"),
            permission(4, "member.create"),
            permission(5, "broken."),
        ]);

        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Anggota", "Blog"]);

        let member_keys: Vec<&str> = groups[0].permissions.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(member_keys, vec!["member.view", "member.create", "member.delete"]);
        assert_eq!(groups[0].icon, "fa-users");
    }

    #[test]
    fn role_score_and_flags() {
        let entity = RoleEntity::with_permissions(
            role("Pengurus"),
            vec![
                permission(1, "member.view"),
                permission(2, "member.verify"),
                permission(3, "blog.delete"),
            ],
        );

        assert_eq!(entity.permission_score(), 1 + 3 + 4);
        assert_eq!(entity.level(), 60);
        assert!(entity.is_system());
        assert!(entity.has_permission("member.verify"));
        assert!(!entity.has_permission("member.delete"));

        let view = entity.view();
        assert_eq!(view.permission_count, 3);
        assert_eq!(view.badge, "primary");
        assert_eq!(view.modules.len(), 2);
    }

    #[test]
    fn unloaded_role_has_no_permissions_but_super_admin_bypasses() {
        let entity = RoleEntity::new(role("Super Admin"));
        assert!(entity.permissions().is_empty());
        assert_eq!(entity.permission_score(), 0);
        assert!(entity.has_permission("anything.at_all"));
    }

    #[test]
    fn permission_view_exposes_derived_fields() {
        let entity = PermissionEntity::new(permission(9, "ticket.assign")).unwrap();
        let view = entity.view();
        assert_eq!(view.module_label, "Pengaduan");
        assert_eq!(view.level, PermissionLevel::Modify);
        assert_eq!(view.badge, "warning");
        assert_eq!(view.icon, "fa-user-tag");
        assert!(view.roles.is_none());
    }
}
