//! Organizational structure repository

use crate::entities::{PositionFields, OrgPosition};
use crate::types::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use tracing::info;

const POSITION_SELECT: &str = "SELECT o.id, o.title, o.parent_id, o.member_id, \
     m.full_name AS member_name, m.photo_path AS member_photo, o.period, o.sort_order \
     FROM org_positions o LEFT JOIN members m ON m.id = o.member_id";

#[derive(Clone)]
pub struct OrgRepository {
    pool: SqlitePool,
}

impl OrgRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn positions(&self, period: &str) -> DatabaseResult<Vec<OrgPosition>> {
        let positions = sqlx::query_as::<_, OrgPosition>(&format!(
            "{POSITION_SELECT} WHERE o.period = ? ORDER BY o.sort_order, o.id"
        ))
        .bind(period)
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }

    /// Known periods, newest first.
    pub async fn periods(&self) -> DatabaseResult<Vec<String>> {
        let periods =
            sqlx::query_scalar("SELECT DISTINCT period FROM org_positions ORDER BY period DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(periods)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<OrgPosition>> {
        let position = sqlx::query_as::<_, OrgPosition>(&format!("{POSITION_SELECT} WHERE o.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(position)
    }

    pub async fn create(&self, fields: &PositionFields) -> DatabaseResult<OrgPosition> {
        let result = sqlx::query(
            "INSERT INTO org_positions (title, parent_id, member_id, period, sort_order) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(fields.title.trim())
        .bind(fields.parent_id)
        .bind(fields.member_id)
        .bind(fields.period.trim())
        .bind(fields.sort_order)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(position_id = id, period = %fields.period, "org position created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("org position {id}")))
    }

    pub async fn update(&self, id: i64, fields: &PositionFields) -> DatabaseResult<OrgPosition> {
        let result = sqlx::query(
            "UPDATE org_positions SET title = ?, parent_id = ?, member_id = ?, period = ?, sort_order = ? WHERE id = ?",
        )
        .bind(fields.title.trim())
        .bind(fields.parent_id)
        .bind(fields.member_id)
        .bind(fields.period.trim())
        .bind(fields.sort_order)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("org position {id}")));
        }
        info!(position_id = id, "org position updated");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("org position {id}")))
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM org_positions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!(position_id = id, "org position deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}
