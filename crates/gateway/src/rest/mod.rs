//! REST API endpoints for the gateway

pub mod auth;
pub mod blog;
pub mod health;
pub mod members;
pub mod organization;
pub mod roles;
pub mod statistics;
pub mod surveys;
pub mod tickets;

use axum::Router;
use serde::Deserialize;
use spk_database::Page;
use utoipa::IntoParams;

use crate::state::AppState;

/// Create all REST API routes
pub fn create_rest_routes() -> Router<AppState> {
    Router::new()
        .merge(health::create_health_routes())
        .merge(auth::create_auth_routes())
        .merge(members::create_member_routes())
        .merge(roles::create_role_routes())
        .merge(tickets::create_ticket_routes())
        .merge(blog::create_blog_routes())
        .merge(surveys::create_survey_routes())
        .merge(organization::create_organization_routes())
        .merge(statistics::create_statistics_routes())
}

/// `?limit=&offset=` pagination shared by the listing endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}
