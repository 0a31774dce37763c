//! Environment-driven configuration.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

/// Development signing secret. Used only when `JWT_SECRET` is not set.
pub const DEV_JWT_SECRET: &str = "qalab-dev-secret-change-me";

/// Demo keys accepted by the legacy `X-API-Key` header when
/// `LEGACY_API_KEYS` is not set.
pub const DEFAULT_LEGACY_API_KEYS: [&str; 3] =
    ["qalab-api-key-2024", "student-demo-key", "test-api-key-123"];

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub legacy_api_keys: Vec<String>,
    pub upload_dir: PathBuf,
    pub production: bool,
    pub seed_on_start: bool,
    /// Server URL advertised in the OpenAPI document.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            legacy_api_keys: DEFAULT_LEGACY_API_KEYS.iter().map(|k| k.to_string()).collect(),
            upload_dir: PathBuf::from("public/uploads"),
            production: false,
            seed_on_start: false,
            public_base_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using the development secret");
            defaults.jwt_secret.clone()
        });

        let legacy_api_keys = match env::var("LEGACY_API_KEYS") {
            Ok(raw) => parse_key_list(&raw),
            Err(_) => {
                info!("LEGACY_API_KEYS not set, using the demo keys");
                defaults.legacy_api_keys.clone()
            }
        };

        Ok(Self {
            port: try_load("PORT", defaults.port)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret,
            legacy_api_keys,
            upload_dir: env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            production: env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
            seed_on_start: try_load("SEED_ON_START", defaults.seed_on_start)?,
            public_base_url: env::var("PUBLIC_BASE_URL").ok().filter(|url| !url.is_empty()),
        })
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
