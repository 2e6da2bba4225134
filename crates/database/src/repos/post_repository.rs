//! Blog post and category repository

use crate::entities::{Post, PostCategory, PostFields, PostFilter, PostStatus};
use crate::types::{DatabaseError, DatabaseResult, Page, Paged};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

const POST_SELECT: &str = "SELECT p.id, p.title, p.slug, p.excerpt, p.body, p.category_id, \
     c.name AS category_name, p.author_id, COALESCE(u.display_name, u.username, u.email) AS author_name, \
     p.status, p.published_at, p.view_count, p.created_at, p.updated_at \
     FROM posts p \
     LEFT JOIN post_categories c ON c.id = p.category_id \
     LEFT JOIN users u ON u.id = p.author_id";

#[derive(Clone)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &PostFilter, page: Page) -> DatabaseResult<Paged<Post>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(POST_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY COALESCE(p.published_at, p.created_at) DESC, p.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let items = query.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(Paged { items, total })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    pub async fn find_published_by_slug(&self, slug: &str) -> DatabaseResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "{POST_SELECT} WHERE p.slug = ? AND p.status = 'published'"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// Slugs equal to `base` or starting with `base-`, used to pick a free suffix.
    pub async fn slugs_like(&self, base: &str, except_id: Option<i64>) -> DatabaseResult<Vec<String>> {
        let slugs = sqlx::query_scalar(
            "SELECT slug FROM posts WHERE (slug = ? OR slug LIKE ? || '-%') AND id != COALESCE(?, -1)",
        )
        .bind(base)
        .bind(base)
        .bind(except_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    pub async fn create(&self, author_id: i64, fields: &PostFields, status: PostStatus) -> DatabaseResult<Post> {
        let now = Utc::now();
        let published_at = (status == PostStatus::Published).then_some(now);
        let result = sqlx::query(
            "INSERT INTO posts (title, slug, excerpt, body, category_id, author_id, status, published_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fields.title.trim())
        .bind(&fields.slug)
        .bind(&fields.excerpt)
        .bind(&fields.body)
        .bind(fields.category_id)
        .bind(author_id)
        .bind(status)
        .bind(published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(post_id = id, slug = %fields.slug, "post created");

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("post {id}")))
    }

    pub async fn update(&self, id: i64, fields: &PostFields) -> DatabaseResult<Post> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, slug = ?, excerpt = ?, body = ?, category_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(fields.title.trim())
        .bind(&fields.slug)
        .bind(&fields.excerpt)
        .bind(&fields.body)
        .bind(fields.category_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("post {id}")));
        }

        info!(post_id = id, "post updated");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("post {id}")))
    }

    /// Sets the status of every listed post. Publishing keeps an existing `published_at`.
    pub async fn set_status_bulk(&self, ids: &[i64], status: PostStatus) -> DatabaseResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE posts SET status = ");
        query.push_bind(status).push(", updated_at = ").push_bind(now);
        if status == PostStatus::Published {
            query.push(", published_at = COALESCE(published_at, ").push_bind(now).push(")");
        }
        query.push(" WHERE status != ").push_bind(status).push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let affected = query.build().execute(&self.pool).await?.rows_affected();
        info!(requested = ids.len(), affected, status = status.as_str(), "bulk post status change");
        Ok(affected)
    }

    pub async fn delete_bulk(&self, ids: &[i64]) -> DatabaseResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM posts WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let affected = query.build().execute(&self.pool).await?.rows_affected();
        info!(requested = ids.len(), affected, "bulk post delete");
        Ok(affected)
    }

    pub async fn increment_views(&self, id: i64) -> DatabaseResult<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn categories(&self) -> DatabaseResult<Vec<PostCategory>> {
        let categories =
            sqlx::query_as::<_, PostCategory>("SELECT id, name, slug FROM post_categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn find_category(&self, id: i64) -> DatabaseResult<Option<PostCategory>> {
        let category =
            sqlx::query_as::<_, PostCategory>("SELECT id, name, slug FROM post_categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    pub async fn create_category(&self, name: &str, slug: &str) -> DatabaseResult<PostCategory> {
        let result = sqlx::query("INSERT INTO post_categories (name, slug) VALUES (?, ?)")
            .bind(name.trim())
            .bind(slug)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!(category_id = id, slug, "post category created");
        Ok(PostCategory {
            id,
            name: name.trim().to_string(),
            slug: slug.to_string(),
        })
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    query.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        query.push(" AND p.status = ").push_bind(status);
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        query
            .push(" AND (p.title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.excerpt LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
