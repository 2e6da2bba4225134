//! User account repository

use crate::entities::User;
use crate::types::DatabaseResult;
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, public_id, email, username, display_name, is_active, \
     created_at, updated_at, last_login_at FROM users";

/// Repository for user rows. Registration and credentials are handled by the auth crate.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
