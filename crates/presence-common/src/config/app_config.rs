//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use presence_core::DEFAULT_OFFLINE_THRESHOLD_MINUTES;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Accepted poll interval range for status reconciliation (milliseconds)
const STATUS_CHECK_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 30_000..=60_000;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub presence: PresenceSettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Record store (PostgreSQL) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Change bus (Redis) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Presence tracking tunables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceSettings {
    /// Trailing debounce window for activity signals
    #[serde(default = "default_activity_debounce_ms")]
    pub activity_debounce_ms: u64,
    /// Staleness threshold for `last_activity_at`
    #[serde(default = "default_offline_threshold_minutes")]
    pub offline_threshold_minutes: u32,
    /// Reconciliation poll interval per subscription
    #[serde(default = "default_status_check_interval_ms")]
    pub status_check_interval_ms: u64,
    /// Per-subscription change event queue capacity
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,
    /// Subject acting on this node, if any
    #[serde(default)]
    pub subject_id: Option<String>,
}

impl PresenceSettings {
    #[must_use]
    pub fn activity_debounce(&self) -> Duration {
        Duration::from_millis(self.activity_debounce_ms)
    }

    #[must_use]
    pub fn status_check_interval(&self) -> Duration {
        Duration::from_millis(self.status_check_interval_ms)
    }
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            activity_debounce_ms: default_activity_debounce_ms(),
            offline_threshold_minutes: default_offline_threshold_minutes(),
            status_check_interval_ms: default_status_check_interval_ms(),
            change_buffer: default_change_buffer(),
            subject_id: None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "presence-agent".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_activity_debounce_ms() -> u64 {
    1000
}

fn default_offline_threshold_minutes() -> u32 {
    DEFAULT_OFFLINE_THRESHOLD_MINUTES
}

fn default_status_check_interval_ms() -> u64 {
    30_000
}

fn default_change_buffer() -> usize {
    64
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required variables are missing or hold invalid values
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            },
            redis: RedisConfig {
                url: lookup("REDIS_URL").ok_or(ConfigError::MissingVar("REDIS_URL"))?,
                max_connections: parse_or(
                    &lookup,
                    "REDIS_MAX_CONNECTIONS",
                    default_redis_max_connections,
                )?,
            },
            presence: PresenceSettings {
                activity_debounce_ms: parse_or(
                    &lookup,
                    "PRESENCE_ACTIVITY_DEBOUNCE_MS",
                    default_activity_debounce_ms,
                )?,
                offline_threshold_minutes: parse_or(
                    &lookup,
                    "PRESENCE_OFFLINE_THRESHOLD_MINUTES",
                    default_offline_threshold_minutes,
                )?,
                status_check_interval_ms: parse_or(
                    &lookup,
                    "PRESENCE_STATUS_CHECK_INTERVAL_MS",
                    default_status_check_interval_ms,
                )?,
                change_buffer: parse_or(&lookup, "PRESENCE_CHANGE_BUFFER", default_change_buffer)?,
                subject_id: lookup("PRESENCE_SUBJECT_ID").filter(|s| !s.trim().is_empty()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check endpoint schemes and presence tunables
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !has_scheme(&self.database.url, &["postgres://", "postgresql://"]) {
            return Err(ConfigError::InvalidValue(
                "DATABASE_URL",
                "expected a postgres:// or postgresql:// URL".to_string(),
            ));
        }
        if !has_scheme(&self.redis.url, &["redis://", "rediss://"]) {
            return Err(ConfigError::InvalidValue(
                "REDIS_URL",
                "expected a redis:// or rediss:// URL".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MIN_CONNECTIONS",
                format!("must not exceed {}", self.database.max_connections),
            ));
        }

        let presence = &self.presence;
        if presence.activity_debounce_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_ACTIVITY_DEBOUNCE_MS",
                "must be positive".to_string(),
            ));
        }
        if presence.offline_threshold_minutes == 0 {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_OFFLINE_THRESHOLD_MINUTES",
                "must be positive".to_string(),
            ));
        }
        if !STATUS_CHECK_INTERVAL_RANGE_MS.contains(&presence.status_check_interval_ms) {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_STATUS_CHECK_INTERVAL_MS",
                format!(
                    "must be between {} and {}",
                    STATUS_CHECK_INTERVAL_RANGE_MS.start(),
                    STATUS_CHECK_INTERVAL_RANGE_MS.end()
                ),
            ));
        }
        if presence.change_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_CHANGE_BUFFER",
                "must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
