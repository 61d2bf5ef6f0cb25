use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Prefix of the environment variables read by [`AppConfig::load`], e.g. `CLEANING_DB_HOST`.
pub const ENV_PREFIX: &str = "CLEANING";

/// `AppConfig` holds all configuration parameters required by the application.
///
/// The configuration is loaded from environment variables (optionally via a `.env` file)
/// or uses default values if the variable is not set. This struct is deserializable via Serde.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    // --- Database settings ---
    /// Database hostname ("localhost" for local runs, the service name in Docker Compose).
    pub db_host: String,
    /// Database port (default: 5432).
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    /// Maximum number of pooled connections.
    pub db_pool_size: usize,
    /// How long to wait for a free pooled connection (human-friendly format, e.g. "5s").
    #[serde(deserialize_with = "deserialize_duration")]
    pub db_wait_timeout: Duration,
    /// Folder with `.sql` migration files, applied in file-name order.
    pub migrations_dir: String,

    // --- Logging ---
    /// Default `tracing` filter, overridden by `RUST_LOG`.
    pub log_level: String,

    // --- Default manager account ---
    pub admin_email: String,
    pub admin_password: String,
}

/// Accepts human-readable formats like "5s", "1m", etc.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let val = String::deserialize(deserializer)?;
    humantime::parse_duration(&val)
        .map_err(|e| D::Error::custom(format!("Invalid duration '{val}': {e}")))
}

impl AppConfig {
    /// Loads configuration from `CLEANING_*` environment variables (and optionally from `.env` file).
    ///
    /// Fields not set via env will be filled with default values.
    ///
    /// # Errors
    /// Returns an error if environment variables are invalid.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            // Database
            .set_default("db_host", "localhost")?
            .set_default("db_port", 5432)?
            .set_default("db_user", "cleaning_user")?
            .set_default("db_password", "securepassword")?
            .set_default("db_name", "cleaning_db")?
            .set_default("db_pool_size", 16)?
            .set_default("db_wait_timeout", "5s")?
            .set_default("migrations_dir", "migrations")?
            // Logging
            .set_default("log_level", "info")?
            // Default manager
            .set_default("admin_email", "default@admin.com")?
            .set_default("admin_password", "admin123")?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        settings
            .try_deserialize()
            .context("Failed to load configuration")
    }

    /// libpq-style connection string for the configured database.
    pub fn database_dsn(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode=disable",
            self.db_host, self.db_port, self.db_user, self.db_password, self.db_name
        )
    }
}
