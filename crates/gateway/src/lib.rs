//! # SPK Gateway Crate
//!
//! The JSON HTTP API of the SPK membership platform. Handlers authenticate the
//! bearer token, build the caller's [`spk_access::Viewer`] and delegate to the
//! domain services; domain errors become [`ApiError`] responses.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn run(pool: sqlx::SqlitePool) {
//! use spk_gateway::{create_router, AppState};
//!
//! let app = create_router(AppState::new(pool, spk_config::AppConfig::default()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

#[cfg(debug_assertions)]
mod docs;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod statistics;

pub use error::{ApiError, ErrorResponse};
pub use middleware::CurrentUser;
pub use state::AppState;
pub use statistics::{Dashboard, StatisticsError, StatisticsService};

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};

/// Multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the main application router with all routes
pub fn create_router(state: AppState) -> Router {
    let uploads = &state.config().uploads;
    let body_limit = uploads.max_photo_bytes.max(uploads.max_document_bytes) + MULTIPART_OVERHEAD;
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    #[allow(unused_mut)]
    let mut router = rest::create_rest_routes().with_state(state);

    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router = router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
