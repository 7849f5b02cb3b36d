use config::{Config, ConfigError, Environment, File};
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE_URL: &str = "sqlite://scanner_log.db?mode=rwc";
const DEFAULT_TOKEN_EXPIRE_MINUTES: i64 = 30;
const CONFIG_DIR: &str = "config";
const EPHEMERAL_SECRET_LEN: usize = 64;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (PostgreSQL or SQLite)
    pub database_url: String,

    /// Server host address
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// HS256 signing secret. Required outside development.
    #[serde(default)]
    #[validate(length(min = 32))]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes (1min - 24h)
    #[serde(default = "default_token_expire_minutes")]
    #[validate(range(min = 1, max = 1440))]
    pub access_token_expire_minutes: i64,

    /// Whether to run database migrations on startup
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    /// Page size used when a list request omits `limit`
    #[serde(default = "default_api_page_size")]
    #[validate(range(min = 1))]
    pub api_default_page_size: u64,

    /// Upper bound applied to every list `limit`
    #[serde(default = "default_api_max_page_size")]
    #[validate(range(min = 1))]
    pub api_max_page_size: u64,
}

impl AppConfig {
    /// Builds a configuration with defaults for everything but the essentials.
    pub fn new(database_url: String, jwt_secret: Option<String>, environment: String) -> Self {
        Self {
            database_url,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            environment,
            log_level: default_log_level(),
            log_json: false,
            jwt_secret,
            access_token_expire_minutes: DEFAULT_TOKEN_EXPIRE_MINUTES,
            auto_migrate: true,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            api_default_page_size: default_api_page_size(),
            api_max_page_size: default_api_max_page_size(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Configured origins, trimmed, empty entries dropped
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns the configured signing secret.
    ///
    /// In development a missing secret is replaced by a random one generated
    /// per process, so tokens stop validating after a restart.
    pub fn signing_secret(&self) -> Result<String, AppConfigError> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
            _ if self.is_development() => {
                warn!(
                    "No JWT secret configured; generated an ephemeral one. Tokens will not survive a restart."
                );
                Ok(rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(EPHEMERAL_SECRET_LEN)
                    .map(char::from)
                    .collect())
            }
            _ => Err(AppConfigError::MissingSecret),
        }
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if self.api_default_page_size > self.api_max_page_size {
            let mut err = ValidationError::new("api_default_page_size");
            err.message = Some("api_default_page_size must not exceed api_max_page_size".into());
            errors.add("api_default_page_size", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("jwt_secret is required outside development. Set APP__JWT_SECRET or SECRET_KEY.")]
    MissingSecret,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_token_expire_minutes() -> i64 {
    DEFAULT_TOKEN_EXPIRE_MINUTES
}

fn default_true_bool() -> bool {
    true
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_api_page_size() -> u64 {
    100
}

fn default_api_max_page_size() -> u64 {
    1000
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("scanner_log_api={},tower_http=debug", level);
    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(default_directive));

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults (legacy `DATABASE_URL` / `SECRET_KEY` seed them)
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    let mut builder = Config::builder()
        .set_default("database_url", database_url)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?;

    if let Ok(secret) = env::var("SECRET_KEY") {
        builder = builder.set_default("jwt_secret", secret)?;
    }

    let config = builder
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    if app_config.jwt_secret.is_none() && !app_config.is_development() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET with a secure random string.");
        return Err(AppConfigError::MissingSecret);
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}


#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn short_secret_fails_validation() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            Some("too-short".into()),
            "development".into(),
        );
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn token_lifetime_must_be_in_range() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), None, "development".into());
        cfg.access_token_expire_minutes = 0;
        assert!(cfg.validate().is_err());
        cfg.access_token_expire_minutes = 30;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), None, "development".into());
        cfg.log_level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn development_generates_ephemeral_secret() {
        let cfg = AppConfig::new("sqlite::memory:".into(), None, "development".into());
        let first = cfg.signing_secret().unwrap();
        let second = cfg.signing_secret().unwrap();
        assert_eq!(first.len(), EPHEMERAL_SECRET_LEN);
        assert_ne!(first, second);
    }

    #[test]
    fn production_requires_secret() {
        let cfg = AppConfig::new("sqlite::memory:".into(), None, "production".into());
        assert_matches!(cfg.signing_secret(), Err(AppConfigError::MissingSecret));
    }

    #[test]
    fn configured_secret_is_used_verbatim() {
        let secret = "0123456789abcdefghijklmnopqrstuvwxyz";
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            Some(secret.into()),
            "production".into(),
        );
        assert_eq!(cfg.signing_secret().unwrap(), secret);
    }

    #[test]
    fn page_bounds_must_be_ordered() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), None, "development".into());
        cfg.api_default_page_size = 5000;
        assert!(cfg.validate_additional_constraints().is_err());
    }
}
