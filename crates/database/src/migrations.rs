//! Database migrations

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::info;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("database migrations failed")?;
    info!("database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::prepare_database;
    use spk_config::DatabaseConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn migrations_seed_reference_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_migrations.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 1,
        };

        let pool = prepare_database(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let (provinces,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM provinces")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(provinces, 38);

        let (roles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(roles, 5);

        let (super_admin_grants,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM role_permissions rp JOIN roles r ON r.id = rp.role_id WHERE r.title = 'Super Admin'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(super_admin_grants, 0, "super admin relies on the bypass, not grants");
    }
}
