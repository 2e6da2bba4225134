use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "spk.toml",
    "config/spk.toml",
    "crates/config/spk.toml",
    "../spk.toml",
    "../config/spk.toml",
    "../../spk.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            uploads: UploadConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://spk.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
            min_password_length: Self::default_min_password_length(),
        }
    }
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }

    const fn default_min_password_length() -> usize {
        8
    }
}

/// Where member photos and scanned documents are stored, and how large they may be.
///
/// ```
/// use spk_config::UploadConfig;
///
/// let uploads = UploadConfig::default();
/// assert_eq!(uploads.directory, "uploads");
/// assert_eq!(uploads.max_photo_bytes, 2 * 1024 * 1024);
/// assert_eq!(uploads.max_document_bytes, 5 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "UploadConfig::default_directory")]
    pub directory: String,
    #[serde(default = "UploadConfig::default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "UploadConfig::default_max_photo_bytes")]
    pub max_photo_bytes: u64,
    #[serde(default = "UploadConfig::default_max_document_bytes")]
    pub max_document_bytes: u64,
}

impl UploadConfig {
    fn default_directory() -> String {
        "uploads".to_string()
    }

    fn default_public_base_url() -> String {
        "/uploads".to_string()
    }

    const fn default_max_photo_bytes() -> u64 {
        2 * 1024 * 1024
    }

    const fn default_max_document_bytes() -> u64 {
        5 * 1024 * 1024
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
            public_base_url: Self::default_public_base_url(),
            max_photo_bytes: Self::default_max_photo_bytes(),
            max_document_bytes: Self::default_max_document_bytes(),
        }
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use spk_config::load;
///
/// std::env::remove_var("SPK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default(
            "auth.session_ttl_seconds",
            clamp_to_i64(defaults.auth.session_ttl_seconds),
        )?
        .set_default(
            "auth.min_password_length",
            clamp_to_i64(defaults.auth.min_password_length as u64),
        )?
        .set_default("uploads.directory", defaults.uploads.directory.clone())?
        .set_default(
            "uploads.public_base_url",
            defaults.uploads.public_base_url.clone(),
        )?
        .set_default(
            "uploads.max_photo_bytes",
            clamp_to_i64(defaults.uploads.max_photo_bytes),
        )?
        .set_default(
            "uploads.max_document_bytes",
            clamp_to_i64(defaults.uploads.max_document_bytes),
        )?;

    let environment_overrides = config::Environment::with_prefix("SPK").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("SPK_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via SPK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    debug!(?config, "loaded platform configuration");
    Ok(config)
}
