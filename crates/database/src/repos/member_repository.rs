//! Member profile and province repository

use crate::entities::{Member, MemberFields, MemberFilter, MembershipStatus, Province};
use crate::types::{DatabaseError, DatabaseResult, Page, Paged};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

const MEMBER_SELECT: &str = "SELECT m.id, m.user_id, m.member_number, m.full_name, m.nik, m.gender, \
     m.birth_place, m.birth_date, m.phone, m.email, m.address, m.province_id, p.name AS province_name, \
     m.regency, m.campus, m.faculty, m.work_unit, m.employment_status, m.position, m.education_level, \
     m.status, m.photo_path, m.id_card_path, m.joined_at, m.verified_at, m.created_at, m.updated_at \
     FROM members m LEFT JOIN provinces p ON p.id = m.province_id";

/// Repository for member rows and the province reference table
#[derive(Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &MemberFilter, page: Page) -> DatabaseResult<Paged<Member>> {
        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM members m LEFT JOIN provinces p ON p.id = m.province_id",
        );
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(MEMBER_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY m.full_name COLLATE NOCASE, m.id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let items = query
            .build_query_as::<Member>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paged { items, total })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE m.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    pub async fn find_by_user_id(&self, user_id: i64) -> DatabaseResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!("{MEMBER_SELECT} WHERE m.user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    /// Whether another member already uses `nik`.
    pub async fn nik_taken(&self, nik: &str, except_id: Option<i64>) -> DatabaseResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE nik = ? AND id != COALESCE(?, -1)")
                .bind(nik)
                .bind(except_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, user_id: Option<i64>, fields: &MemberFields) -> DatabaseResult<Member> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO members (user_id, full_name, nik, gender, birth_place, birth_date, phone, email, \
             address, province_id, regency, campus, faculty, work_unit, employment_status, position, \
             education_level, status, joined_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&fields.full_name)
        .bind(&fields.nik)
        .bind(fields.gender)
        .bind(&fields.birth_place)
        .bind(fields.birth_date)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(fields.province_id)
        .bind(&fields.regency)
        .bind(&fields.campus)
        .bind(&fields.faculty)
        .bind(&fields.work_unit)
        .bind(fields.employment_status)
        .bind(&fields.position)
        .bind(fields.education_level)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(member_id = id, user_id = ?user_id, "member created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("member {id}")))
    }

    pub async fn update(&self, id: i64, fields: &MemberFields) -> DatabaseResult<Member> {
        let result = sqlx::query(
            "UPDATE members SET full_name = ?, nik = ?, gender = ?, birth_place = ?, birth_date = ?, \
             phone = ?, email = ?, address = ?, province_id = ?, regency = ?, campus = ?, faculty = ?, \
             work_unit = ?, employment_status = ?, position = ?, education_level = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&fields.full_name)
        .bind(&fields.nik)
        .bind(fields.gender)
        .bind(&fields.birth_place)
        .bind(fields.birth_date)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(fields.province_id)
        .bind(&fields.regency)
        .bind(&fields.campus)
        .bind(&fields.faculty)
        .bind(&fields.work_unit)
        .bind(fields.employment_status)
        .bind(&fields.position)
        .bind(fields.education_level)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("member {id}")));
        }

        info!(member_id = id, "member updated");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("member {id}")))
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!(member_id = id, "member deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_status(&self, id: i64, status: MembershipStatus) -> DatabaseResult<()> {
        sqlx::query("UPDATE members SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(member_id = id, status = status.as_str(), "member status changed");
        Ok(())
    }

    /// Marks a pending member active and stores the issued member number.
    ///
    /// Returns `false` when the member is no longer pending.
    pub async fn mark_verified(&self, id: i64, member_number: &str) -> DatabaseResult<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE members SET status = 'active', member_number = ?, verified_at = ?, updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(member_number)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        let verified = result.rows_affected() > 0;
        if verified {
            info!(member_id = id, member_number, "member verified");
        }
        Ok(verified)
    }

    /// Highest sequence already issued under `prefix` (e.g. `SPK-32-2026-`).
    pub async fn last_member_sequence(&self, prefix: &str) -> DatabaseResult<i64> {
        let sequence: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(CAST(substr(member_number, length(?) + 1) AS INTEGER)) FROM members WHERE member_number LIKE ? || '%'",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;
        Ok(sequence.unwrap_or(0))
    }

    pub async fn set_photo_path(&self, id: i64, path: &str) -> DatabaseResult<()> {
        sqlx::query("UPDATE members SET photo_path = ?, updated_at = ? WHERE id = ?")
            .bind(path)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(member_id = id, path, "member photo stored");
        Ok(())
    }

    pub async fn set_id_card_path(&self, id: i64, path: &str) -> DatabaseResult<()> {
        sqlx::query("UPDATE members SET id_card_path = ?, updated_at = ? WHERE id = ?")
            .bind(path)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(member_id = id, path, "member id card stored");
        Ok(())
    }

    pub async fn provinces(&self) -> DatabaseResult<Vec<Province>> {
        let provinces =
            sqlx::query_as::<_, Province>("SELECT id, code, name FROM provinces ORDER BY code")
                .fetch_all(&self.pool)
                .await?;
        Ok(provinces)
    }

    pub async fn find_province(&self, id: i64) -> DatabaseResult<Option<Province>> {
        let province =
            sqlx::query_as::<_, Province>("SELECT id, code, name FROM provinces WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(province)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &MemberFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(province_id) = filter.province_id {
        query.push(" AND m.province_id = ").push_bind(province_id);
    }
    if let Some(user_id) = filter.user_id {
        query.push(" AND m.user_id = ").push_bind(user_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND m.status = ").push_bind(status);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        query
            .push(" AND (m.full_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.nik LIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.member_number LIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.email LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
