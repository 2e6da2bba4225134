//! Role, permission and role assignment repository

use crate::entities::{CreateRoleRequest, Permission, Role, UpdateRoleRequest};
use crate::types::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

const ROLE_SELECT: &str = "SELECT r.id, r.title, r.description, r.created_at, r.updated_at, \
     (SELECT COUNT(*) FROM user_roles ur WHERE ur.role_id = r.id) AS user_count FROM roles r";

/// Repository for roles and their permission grants
#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> DatabaseResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!("{ROLE_SELECT} ORDER BY r.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!("{ROLE_SELECT} WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn create(&self, request: &CreateRoleRequest) -> DatabaseResult<Role> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO roles (title, description, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(role_id = id, title = %request.title, "role created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("role {id}")))
    }

    pub async fn update(&self, id: i64, request: &UpdateRoleRequest) -> DatabaseResult<Role> {
        let result = sqlx::query(
            "UPDATE roles SET title = COALESCE(?, title), description = COALESCE(?, description), updated_at = ? WHERE id = ?",
        )
        .bind(request.title.as_deref().map(str::trim))
        .bind(&request.description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("role {id}")));
        }

        info!(role_id = id, "role updated");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("role {id}")))
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!(role_id = id, "role deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn permissions_for_role(&self, role_id: i64) -> DatabaseResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.key, p.description FROM permissions p \
             JOIN role_permissions rp ON rp.permission_id = p.id \
             WHERE rp.role_id = ? ORDER BY p.key",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    /// Replaces the permission set of a role in one transaction.
    pub async fn set_permissions(&self, role_id: i64, permission_ids: &[i64]) -> DatabaseResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        if !permission_ids.is_empty() {
            let mut insert =
                QueryBuilder::<Sqlite>::new("INSERT OR IGNORE INTO role_permissions (role_id, permission_id) ");
            insert.push_values(permission_ids, |mut row, permission_id| {
                row.push_bind(role_id).push_bind(*permission_id);
            });
            insert.build().execute(&mut *tx).await?;
        }

        sqlx::query("UPDATE roles SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(role_id, permissions = permission_ids.len(), "role permissions replaced");
        Ok(())
    }

    pub async fn roles_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "{ROLE_SELECT} JOIN user_roles mine ON mine.role_id = r.id WHERE mine.user_id = ? ORDER BY r.id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    /// Distinct permission keys granted to a user through any of their roles.
    pub async fn permission_keys_for_user(&self, user_id: i64) -> DatabaseResult<Vec<String>> {
        let keys = sqlx::query_scalar(
            "SELECT DISTINCT p.key FROM permissions p \
             JOIN role_permissions rp ON rp.permission_id = p.id \
             JOIN user_roles ur ON ur.role_id = rp.role_id \
             WHERE ur.user_id = ? ORDER BY p.key",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    /// Returns false when the user already held the role.
    pub async fn assign(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id, assigned_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let assigned = result.rows_affected() > 0;
        if assigned {
            info!(user_id, role_id, "role assigned");
        }
        Ok(assigned)
    }

    pub async fn revoke(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        let revoked = result.rows_affected() > 0;
        if revoked {
            info!(user_id, role_id, "role revoked");
        }
        Ok(revoked)
    }

    pub async fn user_count(&self, role_id: i64) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE role_id = ?")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Repository for the permission catalogue
#[derive(Clone)]
pub struct PermissionRepository {
    pool: SqlitePool,
}

impl PermissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> DatabaseResult<Vec<Permission>> {
        let permissions =
            sqlx::query_as::<_, Permission>("SELECT id, key, description FROM permissions ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
        Ok(permissions)
    }

    pub async fn roles_for_permission(&self, permission_id: i64) -> DatabaseResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "{ROLE_SELECT} JOIN role_permissions rp ON rp.role_id = r.id WHERE rp.permission_id = ? ORDER BY r.id"
        ))
        .bind(permission_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }
}
