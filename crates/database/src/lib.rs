//! SPK Database Crate
//!
//! Connection management, migrations, row entities and repositories for the
//! SPK membership platform.

use sqlx::SqlitePool;
use spk_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{
    LabeledCount, MemberDimension, MemberRepository, MemberStatsFilter, OrgRepository, PermissionRepository,
    PostRepository, RoleRepository, StatisticsRepository, SurveyRepository, TicketRepository,
    UserRepository,
};

pub use entities::*;

pub use types::{errors::DatabaseError, validation, DatabaseResult, Page, Paged, ValidationErrors};

/// Re-export commonly used types for convenience
pub use sqlx::Pool;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn initialize_database_runs_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("spk.db").display()),
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();
        let roles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(roles, 5);
    }
}
