use std::{fs::File, path::Path, time::Duration};

use anyhow::{Context, Result};
use spk_config::AppConfig;
use spk_runtime::{self, BackendServices};
use sqlx::Row;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(database_url: String, max_connections: u32, uploads: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = database_url;
    config.database.max_connections = max_connections;
    config.uploads.directory = uploads.display().to_string();
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_migrations_and_seeds_roles() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(sqlite_url(&db_path), 4, &temp_dir.path().join("uploads"));

    let services = initialise(&config).await?;
    let table: String = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'members'",
    )
    .fetch_one(&services.db_pool)
    .await?;
    assert_eq!("members", table);

    let roles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
        .fetch_one(services.state.db_pool())
        .await?;
    assert_eq!(roles, 5);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_creates_upload_directories() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let uploads = temp_dir.path().join("storage/uploads");
    let config = build_config(sqlite_url(&temp_dir.path().join("spk.db")), 1, &uploads);

    assert!(!uploads.exists());
    let _services = initialise(&config).await?;

    assert!(uploads.join("photos").is_dir());
    assert!(uploads.join("documents").is_dir());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_fails_when_upload_root_is_a_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let blocker = temp_dir.path().join("uploads");
    File::create(&blocker)?;
    let config = build_config(sqlite_url(&temp_dir.path().join("spk.db")), 1, &blocker);

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected upload directory creation to fail"),
        Err(error) => error,
    };
    assert!(
        format!("{error:#}").contains("failed to create upload directory"),
        "unexpected error: {error:#}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_database_creates_sqlite_directory_if_missing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_dir = temp_dir.path().join("nested");
    let db_path = db_dir.join("prepared.db");
    let config = build_config(sqlite_url(&db_path), 2, &temp_dir.path().join("uploads"));

    assert!(!db_dir.exists());

    let _services = initialise(&config).await?;
    assert!(db_dir.exists(), "database directory should be created");
    assert!(db_path.exists(), "sqlite database file should be created");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_database_enables_sqlite_foreign_keys() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/foreign_keys.db");
    let config = build_config(sqlite_url(&db_path), 2, &temp_dir.path().join("uploads"));

    let services = initialise(&config).await?;

    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&services.db_pool)
        .await?;
    assert_eq!(1, enabled, "foreign key enforcement must be enabled");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_database_applies_max_connections_setting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/max_conn.db");
    let max_connections = 3;
    let config = build_config(sqlite_url(&db_path), max_connections, &temp_dir.path().join("uploads"));

    let services = initialise(&config).await?;
    assert_eq!(
        max_connections,
        services.db_pool.options().get_max_connections()
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn memory_database_leaves_no_file_behind() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config("sqlite://:memory:".into(), 1, &temp_dir.path().join("uploads"));
    let services = initialise(&config).await?;

    let databases = sqlx::query("PRAGMA database_list")
        .fetch_all(&services.db_pool)
        .await?;
    let main_db = databases
        .into_iter()
        .find(|row| {
            row.try_get::<String, _>("name")
                .map(|name| name == "main")
                .unwrap_or(false)
        })
        .context("expected main in PRAGMA database_list")?;
    let file: String = main_db.try_get("file")?;
    assert!(
        file.is_empty(),
        "in-memory sqlite database should not create filesystem entries"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn non_sqlite_urls_fail_without_touching_the_filesystem() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let target_dir = temp_dir.path().join("should_not_exist");
    let malformed_url = format!("postgres://{}/ignored.db", target_dir.to_string_lossy());
    let config = build_config(malformed_url, 1, &temp_dir.path().join("uploads"));

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected sqlite connection to fail for non-sqlite URL"),
        Err(error) => error,
    };
    assert!(
        !target_dir.exists(),
        "non-sqlite URLs must not create filesystem structures"
    );
    assert!(
        format!("{error:#}").contains("failed to connect to database"),
        "expected database connection failure, got {error:#}"
    );
    Ok(())
}

#[test]
fn telemetry_init_tracing_sets_global_subscriber() {
    spk_runtime::telemetry::init_tracing().expect("first initialisation should succeed");

    let second = spk_runtime::telemetry::init_tracing();
    assert!(
        second.is_err(),
        "initialising telemetry twice should fail with global subscriber already set"
    );
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(unix), ignore = "requires Unix signal handling")]
async fn shutdown_signal_completes_on_ctrl_c_notification() -> Result<()> {
    let shutdown_task = tokio::spawn(async { spk_runtime::shutdown_signal().await });

    sleep(Duration::from_millis(50)).await;
    #[cfg(unix)]
    unsafe {
        libc::raise(libc::SIGINT);
    }

    timeout(Duration::from_secs(2), shutdown_task).await??;
    Ok(())
}
