use crate::auth::{AdminCredentials, AuthError};
use crate::storage::S3Config;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4000";
const DEFAULT_TOTAL_SEATS: u32 = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Missing {0} (required for S3 storage)")]
    MissingS3Setting(&'static str),
    #[error("Could not determine home directory")]
    NoHomeDir,
    #[error("Failed to hash admin password: {0}")]
    AdminPassword(#[from] AuthError),
}

/// Server configuration
///
/// Debug builds read a `.env` file first; everything comes from `LECTERN_*`
/// environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub database_path: PathBuf,
    /// Admin login is disabled when unset
    pub admin: Option<AdminCredentials>,
    pub total_seats: u32,
    /// Whether to store uploads on the local filesystem instead of S3
    pub use_local_storage: bool,
    pub local_storage_path: Option<PathBuf>,
    /// Base URL under which locally stored uploads are served
    pub public_media_url: Option<String>,
    pub s3: Option<S3Config>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        #[cfg(debug_assertions)]
        {
            if dotenvy::dotenv().is_ok() {
                info!("Loaded .env file");
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the process environment in `load()`)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = get("LECTERN_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let database_path = match get("LECTERN_DATABASE_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_data_dir()?.join("lectern.db"),
        };

        let admin = match (get("LECTERN_ADMIN_EMAIL"), get("LECTERN_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminCredentials::new(email, &password)?),
            (None, None) => None,
            _ => {
                warn!("Only one of LECTERN_ADMIN_EMAIL/LECTERN_ADMIN_PASSWORD is set, admin login disabled");
                None
            }
        };

        let total_seats = match get("LECTERN_TOTAL_SEATS") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LECTERN_TOTAL_SEATS",
                value,
            })?,
            None => DEFAULT_TOTAL_SEATS,
        };

        let use_local_storage = match get("LECTERN_USE_LOCAL_STORAGE") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: "LECTERN_USE_LOCAL_STORAGE",
                value,
            })?,
            None => true,
        };

        let local_storage_path = get("LECTERN_LOCAL_STORAGE_PATH").map(PathBuf::from);
        let public_media_url = get("LECTERN_PUBLIC_MEDIA_URL");

        let s3 = if use_local_storage {
            None
        } else {
            let require = |key: &'static str| get(key).ok_or(ConfigError::MissingS3Setting(key));
            Some(S3Config {
                bucket_name: require("LECTERN_S3_BUCKET")?,
                region: require("LECTERN_S3_REGION")?,
                access_key_id: require("LECTERN_S3_ACCESS_KEY_ID")?,
                secret_access_key: require("LECTERN_S3_SECRET_ACCESS_KEY")?,
                endpoint_url: get("LECTERN_S3_ENDPOINT_URL"),
            })
        };

        if use_local_storage {
            info!("Using local storage for uploads");
        } else {
            info!("Using S3 storage for uploads");
        }

        Ok(Config {
            bind_addr,
            database_path,
            admin,
            total_seats,
            use_local_storage,
            local_storage_path,
            public_media_url,
            s3,
        })
    }

    /// Where uploads go when local storage is enabled
    pub fn media_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.local_storage_path {
            Some(path) => Ok(path.clone()),
            None => Ok(default_data_dir()?.join("media")),
        }
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home_dir.join(".lectern"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
