use std::path::Path;

use anyhow::{Context, Result};
use spk_config::AppConfig;
use spk_database::initialize_database;
use spk_gateway::AppState;
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    /// Installs the global fmt subscriber. `RUST_LOG` overrides the `info` default.
    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_target(true)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub state: AppState,
}

impl BackendServices {
    /// Opens and migrates the database, prepares the upload tree and wires every domain service.
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        ensure_upload_directories(&config.uploads.directory).await?;

        let state = AppState::new(db_pool.clone(), config.clone());
        info!(uploads = %config.uploads.directory, "backend services ready");

        Ok(Self { db_pool, state })
    }
}

async fn ensure_upload_directories(root: &str) -> Result<()> {
    for sub in ["photos", "documents"] {
        let dir = Path::new(root).join(sub);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create upload directory {}", dir.display()))?;
    }
    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
