//! Role management rules.

use spk_database::{CreateRoleRequest, UpdateRoleRequest};
use std::collections::HashMap;
use tracing::info;

use crate::entity::{group_by_module, ModuleGroup, PermissionEntity, RoleEntity};
use crate::error::{AccessError, AccessResult};
use crate::hierarchy::{is_system_role, same_role, CUSTOM_ROLE_LEVEL};
use crate::key::parse_permission_key;
use crate::store::{RoleStore, SqlRoleStore};
use crate::viewer::Viewer;

#[derive(Clone)]
pub struct AccessService<S> {
    store: S,
}

impl AccessService<SqlRoleStore> {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            store: SqlRoleStore::new(pool),
        }
    }
}

impl<S> AccessService<S>
where
    S: RoleStore,
{
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builds the authorization context of a signed-in user.
    pub async fn viewer(&self, user_id: i64) -> AccessResult<Viewer> {
        let roles = self.store.user_roles(user_id).await?;
        let keys = self.store.user_permission_keys(user_id).await?;
        let province_id = self.store.user_province(user_id).await?;

        Ok(Viewer::new(
            user_id,
            roles.into_iter().map(|role| role.title).collect(),
            keys,
            province_id,
        ))
    }

    pub async fn list_roles(&self, actor: &Viewer) -> AccessResult<Vec<RoleEntity>> {
        actor.require("role.view")?;

        let mut entities = Vec::new();
        for role in self.store.roles().await? {
            let entity = RoleEntity::new(role);
            entity.load_permissions(&self.store).await?;
            entities.push(entity);
        }
        Ok(entities)
    }

    pub async fn get_role(&self, actor: &Viewer, id: i64) -> AccessResult<RoleEntity> {
        actor.require("role.view")?;
        self.load_role(id).await
    }

    pub async fn create_role(&self, actor: &Viewer, request: CreateRoleRequest) -> AccessResult<RoleEntity> {
        actor.require("role.create")?;

        let title = validate_title(&request.title)?;
        if is_system_role(title) {
            return Err(AccessError::Duplicate(format!("role '{title}'")));
        }
        if actor.highest_level() <= CUSTOM_ROLE_LEVEL && !actor.is_super_admin() {
            return Err(AccessError::Forbidden("your role cannot create roles".into()));
        }

        let role = self.store.create_role(&request).await?;
        info!(actor = actor.user_id, role = %role.title, "role created");
        Ok(RoleEntity::with_permissions(role, Vec::new()))
    }

    pub async fn update_role(
        &self,
        actor: &Viewer,
        id: i64,
        request: UpdateRoleRequest,
    ) -> AccessResult<RoleEntity> {
        actor.require("role.edit")?;
        let current = self.managed_role(actor, id).await?;

        if let Some(title) = request.title.as_deref() {
            let title = validate_title(title)?;
            if current.is_system() {
                // Titles are the hierarchy keys, so even a case change is a rename.
                if title != current.title() {
                    return Err(AccessError::SystemRole(current.title().to_string()));
                }
            } else if is_system_role(title) {
                return Err(AccessError::Duplicate(format!("role '{title}'")));
            }
        }

        let role = self.store.update_role(id, &request).await?;
        info!(actor = actor.user_id, role_id = id, "role updated");
        let entity = RoleEntity::new(role);
        entity.load_permissions(&self.store).await?;
        Ok(entity)
    }

    pub async fn delete_role(&self, actor: &Viewer, id: i64) -> AccessResult<()> {
        actor.require("role.delete")?;
        let role = self.managed_role(actor, id).await?;

        if role.is_system() {
            return Err(AccessError::SystemRole(role.title().to_string()));
        }

        self.store.delete_role(id).await?;
        info!(actor = actor.user_id, role = %role.title(), "role deleted");
        Ok(())
    }

    /// Replaces the permissions of a role with `keys`.
    ///
    /// Actors other than Super Admin may only grant keys they hold themselves.
    pub async fn set_role_permissions(
        &self,
        actor: &Viewer,
        id: i64,
        keys: &[String],
    ) -> AccessResult<RoleEntity> {
        actor.require("role.edit")?;
        let role = self.managed_role(actor, id).await?;

        if role.is_super_admin() {
            return Err(AccessError::SuperAdminImmutable);
        }

        let catalogue: HashMap<String, i64> = self
            .store
            .permissions()
            .await?
            .into_iter()
            .map(|permission| (permission.key, permission.id))
            .collect();

        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            let parsed = parse_permission_key(key)?.to_string();
            let id = catalogue
                .get(&parsed)
                .copied()
                .ok_or_else(|| AccessError::InvalidKey(format!("unknown permission '{parsed}'")))?;
            if !actor.can(&parsed) {
                return Err(AccessError::Forbidden(format!(
                    "cannot grant '{parsed}' without holding it"
                )));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        self.store.set_role_permissions(id, &ids).await?;
        info!(actor = actor.user_id, role = %role.title(), permissions = ids.len(), "role permissions set");
        self.load_role(id).await
    }

    pub async fn list_permissions(&self, actor: &Viewer) -> AccessResult<Vec<PermissionEntity>> {
        actor.require("permission.view")?;
        self.store
            .permissions()
            .await?
            .into_iter()
            .map(PermissionEntity::new)
            .collect()
    }

    pub async fn grouped_permissions(&self, actor: &Viewer) -> AccessResult<Vec<ModuleGroup>> {
        actor.require("permission.view")?;
        Ok(group_by_module(&self.store.permissions().await?))
    }

    /// A permission with the roles holding it loaded.
    pub async fn permission(&self, actor: &Viewer, id: i64) -> AccessResult<PermissionEntity> {
        actor.require("permission.view")?;
        let permission = self
            .store
            .permissions()
            .await?
            .into_iter()
            .find(|permission| permission.id == id)
            .ok_or_else(|| AccessError::NotFound(format!("permission {id}")))?;

        let entity = PermissionEntity::new(permission)?;
        entity.roles(&self.store).await?;
        Ok(entity)
    }

    pub async fn assign_role(&self, actor: &Viewer, user_id: i64, role_id: i64) -> AccessResult<bool> {
        actor.require("role.assign")?;
        let role = self.managed_role(actor, role_id).await?;

        if !self.store.user_exists(user_id).await? {
            return Err(AccessError::NotFound(format!("user {user_id}")));
        }

        let assigned = self.store.assign_role(user_id, role_id).await?;
        info!(actor = actor.user_id, user_id, role = %role.title(), assigned, "role assignment");
        Ok(assigned)
    }

    pub async fn revoke_role(&self, actor: &Viewer, user_id: i64, role_id: i64) -> AccessResult<()> {
        actor.require("role.assign")?;
        let role = self.managed_role(actor, role_id).await?;

        let held = self
            .store
            .user_roles(user_id)
            .await?
            .iter()
            .any(|held| held.id == role_id);
        if !held {
            return Err(AccessError::NotFound(format!("role {} on user {user_id}", role.title())));
        }

        if role.is_super_admin() && self.store.role_user_count(role_id).await? <= 1 {
            return Err(AccessError::LastSuperAdmin);
        }

        self.store.revoke_role(user_id, role_id).await?;
        info!(actor = actor.user_id, user_id, role = %role.title(), "role revoked");
        Ok(())
    }

    /// Grants a role by title without an acting user. Used for self-registration
    /// and for bootstrapping the first administrator.
    pub async fn grant_system_role(&self, user_id: i64, title: &str) -> AccessResult<()> {
        let role = self
            .store
            .roles()
            .await?
            .into_iter()
            .find(|role| same_role(&role.title, title))
            .ok_or_else(|| AccessError::NotFound(format!("role '{title}'")))?;

        self.store.assign_role(user_id, role.id).await?;
        info!(user_id, role = %role.title, "system role granted");
        Ok(())
    }

    async fn load_role(&self, id: i64) -> AccessResult<RoleEntity> {
        let role = self
            .store
            .role(id)
            .await?
            .ok_or_else(|| AccessError::NotFound(format!("role {id}")))?;
        let entity = RoleEntity::new(role);
        entity.load_permissions(&self.store).await?;
        Ok(entity)
    }

    async fn managed_role(&self, actor: &Viewer, id: i64) -> AccessResult<RoleEntity> {
        let role = self.load_role(id).await?;
        if !actor.can_manage_role(role.title()) {
            return Err(AccessError::Forbidden(format!(
                "role '{}' is above your level",
                role.title()
            )));
        }
        Ok(role)
    }
}

fn validate_title(title: &str) -> AccessResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AccessError::Validation("role title is required".into()));
    }
    if title.chars().count() > 60 {
        return Err(AccessError::Validation("role title is too long".into()));
    }
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_store::MockRoleStore;

    fn actor(user_id: i64, roles: &[&str], keys: &[&str]) -> Viewer {
        Viewer::new(
            user_id,
            roles.iter().map(|r| r.to_string()).collect(),
            keys.iter().map(|k| k.to_string()),
            None,
        )
    }

    fn admin() -> Viewer {
        actor(
            1,
            &["Admin"],
            &["role.view", "role.create", "role.edit", "role.delete", "role.assign", "member.view", "member.edit"],
        )
    }

    fn root() -> Viewer {
        actor(99, &["Super Admin"], &[])
    }

    async fn service() -> AccessService<MockRoleStore> {
        AccessService::with_store(MockRoleStore::seeded().await)
    }

    #[tokio::test]
    async fn system_roles_cannot_be_deleted_or_renamed() {
        let service = service().await;
        let anggota = service.store().role_id("Anggota").await;

        let err = service.delete_role(&root(), anggota).await.unwrap_err();
        assert!(matches!(err, AccessError::SystemRole(_)));

        let err = service
            .update_role(
                &root(),
                anggota,
                UpdateRoleRequest {
                    title: Some("Member".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::SystemRole(_)));

        let updated = service
            .update_role(
                &root(),
                anggota,
                UpdateRoleRequest {
                    title: Some(" Anggota ".into()),
                    description: Some("Anggota biasa".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role().title, "Anggota");
        assert_eq!(updated.role().description.as_deref(), Some("Anggota biasa"));
    }

    #[tokio::test]
    async fn system_role_titles_keep_their_exact_spelling() {
        let service = service().await;
        let admin_role = service.store().role_id("Admin").await;

        for spelling in ["ADMIN", "admin", " aDmIn "] {
            let err = service
                .update_role(
                    &root(),
                    admin_role,
                    UpdateRoleRequest {
                        title: Some(spelling.into()),
                        description: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AccessError::SystemRole(_)), "{spelling}: {err:?}");
        }

        let role = service.get_role(&root(), admin_role).await.unwrap();
        assert_eq!(role.title(), "Admin");
    }

    #[tokio::test]
    async fn super_admin_permissions_are_immutable() {
        let service = service().await;
        let super_admin = service.store().role_id("Super Admin").await;

        let err = service
            .set_role_permissions(&root(), super_admin, &["member.view".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::SuperAdminImmutable));
    }

    #[tokio::test]
    async fn admin_cannot_touch_equal_or_higher_roles() {
        let service = service().await;
        let admin_role = service.store().role_id("Admin").await;

        let err = service
            .set_role_permissions(&admin(), admin_role, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }

    #[tokio::test]
    async fn grants_are_limited_to_held_keys() {
        let service = service().await;
        let role = service
            .create_role(
                &admin(),
                CreateRoleRequest {
                    title: "Bendahara".into(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let updated = service
            .set_role_permissions(&admin(), role.id(), &["member.view".to_string(), "Member.View".to_string()])
            .await
            .unwrap();
        assert_eq!(updated.permissions().len(), 1);

        let err = service
            .set_role_permissions(&admin(), role.id(), &["blog.delete".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));

        let err = service
            .set_role_permissions(&admin(), role.id(), &["member.fly".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn creating_a_system_title_is_a_duplicate() {
        let service = service().await;
        let err = service
            .create_role(
                &root(),
                CreateRoleRequest {
                    title: "  pengurus".into(),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Duplicate(_)));
    }

    #[tokio::test]
    async fn last_super_admin_cannot_be_revoked() {
        let service = service().await;
        let super_admin = service.store().role_id("Super Admin").await;
        service.store().add_user(7).await;
        service.store().add_user(8).await;

        service.assign_role(&root(), 7, super_admin).await.unwrap();
        let err = service.revoke_role(&root(), 7, super_admin).await.unwrap_err();
        assert!(matches!(err, AccessError::LastSuperAdmin));

        service.assign_role(&root(), 8, super_admin).await.unwrap();
        service.revoke_role(&root(), 7, super_admin).await.unwrap();
    }

    #[tokio::test]
    async fn assigning_requires_an_existing_user_and_permission() {
        let service = service().await;
        let anggota = service.store().role_id("Anggota").await;

        let err = service.assign_role(&admin(), 404, anggota).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound(_)));

        let err = service
            .assign_role(&actor(5, &["Pengurus"], &[]), 404, anggota)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::MissingPermission(_)));
    }

    #[tokio::test]
    async fn viewer_collects_roles_keys_and_province() {
        let service = service().await;
        let anggota = service.store().role_id("Anggota").await;
        service.store().add_user(3).await;
        service.store().set_province(3, 12).await;
        service.grant_system_role(3, "anggota").await.unwrap();

        let viewer = service.viewer(3).await.unwrap();
        assert!(viewer.in_group("Anggota"));
        assert_eq!(viewer.province_id, Some(12));
        assert_eq!(service.store().role_user_count(anggota).await.unwrap(), 1);
    }
}
