//! Storage seam for the access service.

use spk_database::{
    CreateRoleRequest, DatabaseResult, MemberRepository, Permission, PermissionRepository, Role,
    RoleRepository, UpdateRoleRequest, UserRepository,
};
use sqlx::SqlitePool;

#[allow(async_fn_in_trait)]
pub trait RoleStore {
    async fn roles(&self) -> DatabaseResult<Vec<Role>>;
    async fn role(&self, id: i64) -> DatabaseResult<Option<Role>>;
    async fn create_role(&self, request: &CreateRoleRequest) -> DatabaseResult<Role>;
    async fn update_role(&self, id: i64, request: &UpdateRoleRequest) -> DatabaseResult<Role>;
    async fn delete_role(&self, id: i64) -> DatabaseResult<bool>;
    async fn role_permissions(&self, role_id: i64) -> DatabaseResult<Vec<Permission>>;
    async fn set_role_permissions(&self, role_id: i64, permission_ids: &[i64]) -> DatabaseResult<()>;
    async fn permissions(&self) -> DatabaseResult<Vec<Permission>>;
    async fn permission_roles(&self, permission_id: i64) -> DatabaseResult<Vec<Role>>;
    async fn user_exists(&self, user_id: i64) -> DatabaseResult<bool>;
    async fn user_roles(&self, user_id: i64) -> DatabaseResult<Vec<Role>>;
    async fn user_permission_keys(&self, user_id: i64) -> DatabaseResult<Vec<String>>;
    async fn user_province(&self, user_id: i64) -> DatabaseResult<Option<i64>>;
    async fn assign_role(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool>;
    async fn revoke_role(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool>;
    async fn role_user_count(&self, role_id: i64) -> DatabaseResult<i64>;
}

/// [`RoleStore`] backed by the SQLite repositories.
#[derive(Clone)]
pub struct SqlRoleStore {
    roles: RoleRepository,
    permissions: PermissionRepository,
    users: UserRepository,
    members: MemberRepository,
}

impl SqlRoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            roles: RoleRepository::new(pool.clone()),
            permissions: PermissionRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            members: MemberRepository::new(pool),
        }
    }
}

impl RoleStore for SqlRoleStore {
    async fn roles(&self) -> DatabaseResult<Vec<Role>> {
        self.roles.list().await
    }

    async fn role(&self, id: i64) -> DatabaseResult<Option<Role>> {
        self.roles.find_by_id(id).await
    }

    async fn create_role(&self, request: &CreateRoleRequest) -> DatabaseResult<Role> {
        self.roles.create(request).await
    }

    async fn update_role(&self, id: i64, request: &UpdateRoleRequest) -> DatabaseResult<Role> {
        self.roles.update(id, request).await
    }

    async fn delete_role(&self, id: i64) -> DatabaseResult<bool> {
        self.roles.delete(id).await
    }

    async fn role_permissions(&self, role_id: i64) -> DatabaseResult<Vec<Permission>> {
        self.roles.permissions_for_role(role_id).await
    }

    async fn set_role_permissions(&self, role_id: i64, permission_ids: &[i64]) -> DatabaseResult<()> {
        self.roles.set_permissions(role_id, permission_ids).await
    }

    async fn permissions(&self) -> DatabaseResult<Vec<Permission>> {
        self.permissions.list().await
    }

    async fn permission_roles(&self, permission_id: i64) -> DatabaseResult<Vec<Role>> {
        self.permissions.roles_for_permission(permission_id).await
    }

    async fn user_exists(&self, user_id: i64) -> DatabaseResult<bool> {
        Ok(self.users.find_by_id(user_id).await?.is_some())
    }

    async fn user_roles(&self, user_id: i64) -> DatabaseResult<Vec<Role>> {
        self.roles.roles_for_user(user_id).await
    }

    async fn user_permission_keys(&self, user_id: i64) -> DatabaseResult<Vec<String>> {
        self.roles.permission_keys_for_user(user_id).await
    }

    async fn user_province(&self, user_id: i64) -> DatabaseResult<Option<i64>> {
        Ok(self
            .members
            .find_by_user_id(user_id)
            .await?
            .and_then(|member| member.province_id))
    }

    async fn assign_role(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool> {
        self.roles.assign(user_id, role_id).await
    }

    async fn revoke_role(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool> {
        self.roles.revoke(user_id, role_id).await
    }

    async fn role_user_count(&self, role_id: i64) -> DatabaseResult<i64> {
        self.roles.user_count(role_id).await
    }
}
