//! Aggregation queries backing the statistics dashboard

use crate::types::DatabaseResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// One bucket of a GROUP BY aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LabeledCount {
    pub key: Option<String>,
    pub total: i64,
}

/// Member columns the dashboard groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberDimension {
    Status,
    Gender,
    EmploymentStatus,
    EducationLevel,
}

impl MemberDimension {
    fn column(&self) -> &'static str {
        match self {
            MemberDimension::Status => "status",
            MemberDimension::Gender => "gender",
            MemberDimension::EmploymentStatus => "employment_status",
            MemberDimension::EducationLevel => "education_level",
        }
    }
}

/// Which members the aggregations count. Unset fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberStatsFilter {
    pub province_id: Option<i64>,
    /// Restricts the figures to the profile linked to this user.
    pub user_id: Option<i64>,
}

const MEMBER_FILTER: &str = "(?1 IS NULL OR province_id = ?1) AND (?2 IS NULL OR user_id = ?2)";

#[derive(Clone)]
pub struct StatisticsRepository {
    pool: SqlitePool,
}

impl StatisticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn member_total(&self, filter: MemberStatsFilter) -> DatabaseResult<i64> {
        let total = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM members WHERE {MEMBER_FILTER}"))
            .bind(filter.province_id)
            .bind(filter.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn members_by(
        &self,
        dimension: MemberDimension,
        filter: MemberStatsFilter,
    ) -> DatabaseResult<Vec<LabeledCount>> {
        let column = dimension.column();
        let rows = sqlx::query_as::<_, LabeledCount>(&format!(
            "SELECT {column} AS key, COUNT(*) AS total FROM members \
             WHERE {MEMBER_FILTER} GROUP BY {column} ORDER BY total DESC, key"
        ))
        .bind(filter.province_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn members_by_province(&self, filter: MemberStatsFilter) -> DatabaseResult<Vec<LabeledCount>> {
        let rows = sqlx::query_as::<_, LabeledCount>(
            "SELECT p.name AS key, COUNT(*) AS total FROM members m \
             JOIN provinces p ON p.id = m.province_id \
             WHERE (?1 IS NULL OR m.province_id = ?1) AND (?2 IS NULL OR m.user_id = ?2) \
             GROUP BY p.id ORDER BY total DESC, p.name",
        )
        .bind(filter.province_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Registrations per `YYYY-MM` month from `since` onwards.
    pub async fn monthly_registrations(
        &self,
        since: DateTime<Utc>,
        filter: MemberStatsFilter,
    ) -> DatabaseResult<Vec<LabeledCount>> {
        let rows = sqlx::query_as::<_, LabeledCount>(
            "SELECT substr(joined_at, 1, 7) AS key, COUNT(*) AS total FROM members \
             WHERE joined_at >= ?3 AND (?1 IS NULL OR province_id = ?1) AND (?2 IS NULL OR user_id = ?2) \
             GROUP BY substr(joined_at, 1, 7) ORDER BY key",
        )
        .bind(filter.province_id)
        .bind(filter.user_id)
        .bind(since.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn tickets_by_status(&self) -> DatabaseResult<Vec<LabeledCount>> {
        let rows = sqlx::query_as::<_, LabeledCount>(
            "SELECT status AS key, COUNT(*) AS total FROM tickets GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn published_posts(&self) -> DatabaseResult<i64> {
        let total = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE status = 'published'")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
