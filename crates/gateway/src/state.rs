//! Shared application state handed to every handler

use spk_access::{AccessService, SqlRoleStore, Viewer};
use spk_auth::{AuthSession, Authenticator, User};
use spk_blog::BlogService;
use spk_config::AppConfig;
use spk_members::MemberService;
use spk_surveys::SurveyService;
use spk_tickets::TicketService;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::error::ApiError;
use crate::statistics::StatisticsService;

/// Services are cheap to clone; each wraps the same pool.
#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    config: Arc<AppConfig>,
    authenticator: Authenticator,
    access: AccessService<SqlRoleStore>,
    members: MemberService,
    tickets: TicketService,
    blog: BlogService,
    surveys: SurveyService,
    statistics: StatisticsService,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            authenticator: Authenticator::new(pool.clone(), config.auth.clone()),
            access: AccessService::new(pool.clone()),
            members: MemberService::new(pool.clone(), &config.uploads),
            tickets: TicketService::new(pool.clone()),
            blog: BlogService::new(pool.clone()),
            surveys: SurveyService::new(pool.clone()),
            statistics: StatisticsService::new(pool.clone()),
            config: Arc::new(config),
            pool,
        }
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn access(&self) -> &AccessService<SqlRoleStore> {
        &self.access
    }

    pub fn members(&self) -> &MemberService {
        &self.members
    }

    pub fn tickets(&self) -> &TicketService {
        &self.tickets
    }

    pub fn blog(&self) -> &BlogService {
        &self.blog
    }

    pub fn surveys(&self) -> &SurveyService {
        &self.surveys
    }

    pub fn statistics(&self) -> &StatisticsService {
        &self.statistics
    }

    /// Resolves a bearer token to its user, session and permissions.
    pub async fn authenticate(&self, token: &str) -> Result<(User, AuthSession, Viewer), ApiError> {
        let (user, session) = self.authenticator.authenticate_token(token).await?;
        let viewer = self.access.viewer(user.id).await?;
        Ok((user, session, viewer))
    }
}
