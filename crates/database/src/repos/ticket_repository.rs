//! Complaint ticket repository

use crate::entities::{CreateTicketRequest, Ticket, TicketFilter, TicketReply, TicketStatus};
use crate::types::{DatabaseError, DatabaseResult, Page, Paged};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

const TICKET_SELECT: &str = "SELECT t.id, t.ticket_number, t.reporter_id, \
     COALESCE(reporter.display_name, reporter.username, reporter.email) AS reporter_name, \
     t.assignee_id, COALESCE(assignee.display_name, assignee.username, assignee.email) AS assignee_name, \
     t.subject, t.description, t.category, t.priority, t.status, \
     (SELECT COUNT(*) FROM ticket_replies r WHERE r.ticket_id = t.id) AS reply_count, \
     t.created_at, t.updated_at, t.resolved_at, t.closed_at \
     FROM tickets t \
     LEFT JOIN users reporter ON reporter.id = t.reporter_id \
     LEFT JOIN users assignee ON assignee.id = t.assignee_id";

#[derive(Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &TicketFilter, page: Page) -> DatabaseResult<Paged<Ticket>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tickets t");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(TICKET_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let items = query.build_query_as::<Ticket>().fetch_all(&self.pool).await?;
        Ok(Paged { items, total })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!("{TICKET_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ticket)
    }

    /// Highest sequence already issued under `prefix` (e.g. `TKT-20261019-`).
    pub async fn last_sequence(&self, prefix: &str) -> DatabaseResult<i64> {
        let sequence: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(CAST(substr(ticket_number, length(?) + 1) AS INTEGER)) FROM tickets WHERE ticket_number LIKE ? || '%'",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;
        Ok(sequence.unwrap_or(0))
    }

    pub async fn create(
        &self,
        ticket_number: &str,
        reporter_id: i64,
        request: &CreateTicketRequest,
    ) -> DatabaseResult<Ticket> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tickets (ticket_number, reporter_id, subject, description, category, priority, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 'open', ?, ?)",
        )
        .bind(ticket_number)
        .bind(reporter_id)
        .bind(request.subject.trim())
        .bind(request.description.trim())
        .bind(request.category)
        .bind(request.priority)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(ticket_id = id, ticket_number, reporter_id, "ticket created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("ticket {id}")))
    }

    /// Stores a status and stamps `resolved_at`/`closed_at` when entering those states.
    pub async fn set_status(&self, id: i64, status: TicketStatus) -> DatabaseResult<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE tickets SET status = ?, updated_at = ?, \
             resolved_at = CASE WHEN ? = 'resolved' THEN ? WHEN ? = 'open' THEN NULL ELSE resolved_at END, \
             closed_at = CASE WHEN ? = 'closed' THEN ? WHEN ? = 'open' THEN NULL ELSE closed_at END \
             WHERE id = ?",
        )
        .bind(status)
        .bind(now)
        .bind(status)
        .bind(now)
        .bind(status)
        .bind(status)
        .bind(now)
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;
        info!(ticket_id = id, status = status.as_str(), "ticket status changed");
        Ok(())
    }

    pub async fn assign(&self, id: i64, assignee_id: i64) -> DatabaseResult<()> {
        sqlx::query("UPDATE tickets SET assignee_id = ?, updated_at = ? WHERE id = ?")
            .bind(assignee_id)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(ticket_id = id, assignee_id, "ticket assigned");
        Ok(())
    }

    pub async fn replies(&self, ticket_id: i64, include_internal: bool) -> DatabaseResult<Vec<TicketReply>> {
        let replies = sqlx::query_as::<_, TicketReply>(
            "SELECT r.id, r.ticket_id, r.author_id, \
             COALESCE(u.display_name, u.username, u.email) AS author_name, \
             r.body, r.is_internal, r.created_at \
             FROM ticket_replies r LEFT JOIN users u ON u.id = r.author_id \
             WHERE r.ticket_id = ? AND (? OR r.is_internal = 0) \
             ORDER BY r.created_at, r.id",
        )
        .bind(ticket_id)
        .bind(include_internal)
        .fetch_all(&self.pool)
        .await?;
        Ok(replies)
    }

    pub async fn add_reply(
        &self,
        ticket_id: i64,
        author_id: i64,
        body: &str,
        is_internal: bool,
    ) -> DatabaseResult<TicketReply> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO ticket_replies (ticket_id, author_id, body, is_internal, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(ticket_id)
        .bind(author_id)
        .bind(body.trim())
        .bind(is_internal)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE tickets SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        let id = result.last_insert_rowid();
        let reply = sqlx::query_as::<_, TicketReply>(
            "SELECT r.id, r.ticket_id, r.author_id, \
             COALESCE(u.display_name, u.username, u.email) AS author_name, \
             r.body, r.is_internal, r.created_at \
             FROM ticket_replies r LEFT JOIN users u ON u.id = r.author_id WHERE r.id = ?",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(ticket_id, reply_id = id, author_id, is_internal, "ticket reply added");
        Ok(reply)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &TicketFilter) {
    query.push(" WHERE 1 = 1");
    if let Some(reporter_id) = filter.reporter_id {
        query.push(" AND t.reporter_id = ").push_bind(reporter_id);
    }
    if let Some(assignee_id) = filter.assignee_id {
        query.push(" AND t.assignee_id = ").push_bind(assignee_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND t.status = ").push_bind(status);
    }
}
