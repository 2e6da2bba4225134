//! Public blog and post administration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use spk_blog::{BulkOutcome, BulkRequest, PostInput, PostQuery, PostView};
use spk_database::{Paged, PostCategory, PostStatus};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::rest::PageParams;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsParams {
    pub status: Option<PostStatus>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListPostsParams {
    fn split(self) -> (PostQuery, PageParams) {
        (
            PostQuery {
                status: self.status,
                category_id: self.category_id,
                search: self.search.filter(|s| !s.trim().is_empty()),
            },
            PageParams { limit: self.limit, offset: self.offset },
        )
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
}

pub fn create_blog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_published_posts))
        .route("/api/posts/:slug", get(read_post))
        .route("/api/admin/posts", get(list_posts).post(create_post))
        .route("/api/admin/posts/bulk", post(bulk_posts))
        .route("/api/admin/posts/:post_id", get(get_post).put(update_post))
        .route("/api/categories", get(list_categories).post(create_category))
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Blog",
    params(
        ("category_id" = Option<i64>, Query, description = "Category filter"),
        ("search" = Option<String>, Query, description = "Title or body search"),
        PageParams
    ),
    responses((status = 200, description = "Published posts, newest first"))
)]
pub async fn list_published_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<Paged<PostView>>, ApiError> {
    let (query, page) = params.split();
    Ok(Json(state.blog().public_list(&query, page.page()).await?))
}

#[utoipa::path(
    get,
    path = "/api/posts/{slug}",
    tag = "Blog",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Published post; the view counter is incremented"),
        (status = 404, description = "No published post with that slug", body = crate::error::ErrorResponse)
    )
)]
pub async fn read_post(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.blog().read(&slug).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/posts",
    tag = "Blog",
    security(("bearerAuth" = [])),
    params(
        ("status" = Option<String>, Query, description = "draft or published"),
        ("category_id" = Option<i64>, Query, description = "Category filter"),
        ("search" = Option<String>, Query, description = "Title or body search"),
        PageParams
    ),
    responses(
        (status = 200, description = "Posts in any status"),
        (status = 403, description = "Missing blog.view", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<Paged<PostView>>, ApiError> {
    let (query, page) = params.split();
    Ok(Json(state.blog().admin_list(&current.viewer, &query, page.page()).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/posts",
    tag = "Blog",
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Post created as draft, or published with blog.publish"),
        (status = 422, description = "Invalid post", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let post = state.blog().create(&current.viewer, input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    get,
    path = "/api/admin/posts/{post_id}",
    tag = "Blog",
    security(("bearerAuth" = [])),
    params(("post_id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post in any status"),
        (status = 404, description = "Post not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.blog().get(&current.viewer, post_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/posts/{post_id}",
    tag = "Blog",
    security(("bearerAuth" = [])),
    params(("post_id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post updated"),
        (status = 422, description = "Invalid post", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<i64>,
    Json(input): Json<PostInput>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.blog().update(&current.viewer, post_id, input).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/posts/bulk",
    tag = "Blog",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Number of posts affected by publish, unpublish or delete"),
        (status = 403, description = "Missing blog.publish or blog.delete", body = crate::error::ErrorResponse)
    )
)]
pub async fn bulk_posts(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    Ok(Json(state.blog().bulk(&current.viewer, &req).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Blog",
    responses((status = 200, description = "Post categories"))
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<PostCategory>>, ApiError> {
    Ok(Json(state.blog().categories().await?))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Blog",
    security(("bearerAuth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created"),
        (status = 409, description = "Category already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<PostCategory>), ApiError> {
    let category = state.blog().create_category(&current.viewer, &req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
