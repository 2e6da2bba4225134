use serde::{Deserialize, Serialize};
use spk_access::Viewer;
use spk_database::{
    Page, Paged, Post, PostCategory, PostFields, PostFilter, PostRepository, PostStatus,
    ValidationErrors,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::content::{excerpt, reading_time_minutes};
use crate::error::{BlogError, BlogResult};
use crate::slug::{slugify, unique_slug};

/// What an author submits. The slug is always derived from the title.
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Publish,
    Unpublish,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkRequest {
    pub action: BulkAction,
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    pub affected: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub status_label: &'static str,
    pub summary: String,
    pub reading_minutes: usize,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            status_label: post.status.label(),
            summary: excerpt(post.excerpt.as_deref(), &post.body),
            reading_minutes: reading_time_minutes(&post.body),
            post,
        }
    }
}

fn views(posts: Paged<Post>) -> Paged<PostView> {
    Paged {
        items: posts.items.into_iter().map(PostView::from).collect(),
        total: posts.total,
    }
}

#[derive(Clone)]
pub struct BlogService {
    posts: PostRepository,
}

impl BlogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            posts: PostRepository::new(pool),
        }
    }

    /// Published posts, newest first.
    pub async fn public_list(&self, query: &PostQuery, page: Page) -> BlogResult<Paged<PostView>> {
        let filter = PostFilter {
            status: Some(PostStatus::Published),
            category_id: query.category_id,
            search: query.search.clone(),
        };
        Ok(views(self.posts.list(&filter, page).await?))
    }

    /// Looks up a published post and counts the visit.
    pub async fn read(&self, slug: &str) -> BlogResult<PostView> {
        let mut post = self
            .posts
            .find_published_by_slug(slug)
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("post '{slug}'")))?;
        self.posts.increment_views(post.id).await?;
        post.view_count += 1;
        Ok(post.into())
    }

    pub async fn admin_list(&self, viewer: &Viewer, query: &PostQuery, page: Page) -> BlogResult<Paged<PostView>> {
        viewer.require("blog.view")?;
        let filter = PostFilter {
            status: query.status,
            category_id: query.category_id,
            search: query.search.clone(),
        };
        Ok(views(self.posts.list(&filter, page).await?))
    }

    pub async fn get(&self, viewer: &Viewer, id: i64) -> BlogResult<PostView> {
        viewer.require("blog.view")?;
        self.load(id).await.map(PostView::from)
    }

    async fn load(&self, id: i64) -> BlogResult<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| BlogError::NotFound(format!("post {id}")))
    }

    async fn check_input(&self, input: &PostInput) -> BlogResult<()> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &input.title, "Judul");
        errors.max_len("title", input.title.trim(), 200, "Judul");
        errors.required("body", &input.body, "Isi artikel");
        if let Some(excerpt) = input.excerpt.as_deref() {
            errors.max_len("excerpt", excerpt.trim(), 300, "Ringkasan");
        }
        if let Some(category_id) = input.category_id {
            if self.posts.find_category(category_id).await?.is_none() {
                errors.add("category_id", "Kategori tidak ditemukan");
            }
        }
        Ok(errors.into_result()?)
    }

    async fn fields(&self, input: &PostInput, except_id: Option<i64>) -> BlogResult<PostFields> {
        let base = slugify(&input.title);
        let taken = self.posts.slugs_like(&base, except_id).await?;
        Ok(PostFields {
            title: input.title.trim().to_string(),
            slug: unique_slug(&base, &taken),
            excerpt: input
                .excerpt
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            body: input.body.clone(),
            category_id: input.category_id,
        })
    }

    pub async fn create(&self, viewer: &Viewer, input: PostInput) -> BlogResult<PostView> {
        viewer.require("blog.create")?;
        if input.publish {
            viewer.require("blog.publish")?;
        }
        self.check_input(&input).await?;

        let fields = self.fields(&input, None).await?;
        let status = if input.publish {
            PostStatus::Published
        } else {
            PostStatus::Draft
        };
        let post = self.posts.create(viewer.user_id, &fields, status).await?;
        Ok(post.into())
    }

    /// The slug only changes when the title does.
    pub async fn update(&self, viewer: &Viewer, id: i64, input: PostInput) -> BlogResult<PostView> {
        viewer.require("blog.edit")?;
        let current = self.load(id).await?;
        let publish = input.publish && current.status == PostStatus::Draft;
        if publish {
            viewer.require("blog.publish")?;
        }
        self.check_input(&input).await?;

        let mut fields = self.fields(&input, Some(id)).await?;
        if current.title.trim() == fields.title {
            fields.slug = current.slug;
        }
        self.posts.update(id, &fields).await?;

        if publish {
            self.posts.set_status_bulk(&[id], PostStatus::Published).await?;
        }
        self.load(id).await.map(PostView::from)
    }

    pub async fn bulk(&self, viewer: &Viewer, request: &BulkRequest) -> BlogResult<BulkOutcome> {
        let mut ids = request.ids.clone();
        ids.sort_unstable();
        ids.dedup();

        let affected = match request.action {
            BulkAction::Publish => {
                viewer.require("blog.publish")?;
                self.posts.set_status_bulk(&ids, PostStatus::Published).await?
            }
            BulkAction::Unpublish => {
                viewer.require("blog.publish")?;
                self.posts.set_status_bulk(&ids, PostStatus::Draft).await?
            }
            BulkAction::Delete => {
                viewer.require("blog.delete")?;
                self.posts.delete_bulk(&ids).await?
            }
        };
        info!(user_id = viewer.user_id, action = ?request.action, affected, "bulk post action");
        Ok(BulkOutcome { affected })
    }

    pub async fn categories(&self) -> BlogResult<Vec<PostCategory>> {
        Ok(self.posts.categories().await?)
    }

    pub async fn create_category(&self, viewer: &Viewer, name: &str) -> BlogResult<PostCategory> {
        viewer.require("blog.edit")?;
        let mut errors = ValidationErrors::new();
        errors.required("name", name, "Nama kategori");
        errors.max_len("name", name.trim(), 100, "Nama kategori");
        errors.into_result()?;

        Ok(self.posts.create_category(name, &slugify(name)).await?)
    }
}
