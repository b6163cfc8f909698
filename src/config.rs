//! Service configuration
//!
//! Loaded from the YAML file named by the `CONFIG` environment variable, then
//! overridden by `APP_*` variables. A `.env` file in the working directory is
//! read first.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::geo::RetryPolicy;

/// Environment variable holding the path to the YAML config file.
pub const CONFIG_ENV: &str = "CONFIG";

/// Prefix for environment overrides, e.g. `APP_DB_PORT`.
pub const ENV_PREFIX: &str = "APP_";

pub const EXAMPLE_CONFIG: &str = r#"server:
  url: "0.0.0.0:8080"
  prefixAPI: "/api"
loc:
  url: "https://ipapi.co"
  retryAttempt: 3
  allowedCountriesCodes: ["UA"]
  timeoutSecs: 10
db:
  url: "localhost"
  port: 5432
  login: "postgres"
  password: ""
  nameDB: "companies"
  maxConns: 10
  migrations: "migrations"
event:
  url: ""
  eventChannel: "companies"
  timeoutSecs: 5
logLevel: "info"
"#;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub loc: LocConfig,
    pub db: DbConfig,
    pub event: EventSinkConfig,
    #[serde(rename = "logLevel")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub url: String,
    /// Path prefix for every route. Empty serves at the root.
    #[serde(rename = "prefixAPI")]
    pub prefix_api: String,
}

/// Geolocation lookup settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocConfig {
    pub url: String,
    /// Retries after the first attempt.
    pub retry_attempt: u32,
    #[serde(alias = "allowedCountiesCodes")]
    pub allowed_countries_codes: Vec<String>,
    pub timeout_secs: u64,
}

/// PostgreSQL settings. An empty `url` selects the in-memory store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DbConfig {
    /// Database host.
    pub url: String,
    pub port: u16,
    pub login: String,
    pub password: String,
    #[serde(rename = "nameDB")]
    pub name_db: String,
    pub max_conns: u32,
    pub migrations: String,
}

/// Event sink settings. An empty `url` disables publishing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventSinkConfig {
    pub url: String,
    pub event_channel: String,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            loc: LocConfig::default(),
            db: DbConfig::default(),
            event: EventSinkConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "0.0.0.0:8080".to_string(),
            prefix_api: String::new(),
        }
    }
}

impl Default for LocConfig {
    fn default() -> Self {
        Self {
            url: "https://ipapi.co".to_string(),
            retry_attempt: 3,
            allowed_countries_codes: Vec::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            port: 5432,
            login: "postgres".to_string(),
            password: String::new(),
            name_db: "companies".to_string(),
            max_conns: 10,
            migrations: String::new(),
        }
    }
}

impl Default for EventSinkConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            event_channel: "companies".to_string(),
            timeout_secs: 5,
        }
    }
}

impl AppConfig {
    /// Load `.env`, read the file named by `CONFIG` and apply `APP_*`
    /// overrides from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_ENV).map_err(|_| {
            anyhow!(
                "{} environment variable is not set; point it at a YAML file like:\n\n{}",
                CONFIG_ENV,
                EXAMPLE_CONFIG
            )
        })?;

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Overwrite fields from `APP_*` variables returned by `lookup`.
    ///
    /// Fails when a numeric override does not parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("SERVER_URL") {
            self.server.url = v;
        }
        if let Some(v) = var("SERVER_PREFIXAPI") {
            self.server.prefix_api = v;
        }
        if let Some(v) = var("LOC_URL") {
            self.loc.url = v;
        }
        if let Some(v) = var("LOC_RETRYATTEMPT") {
            self.loc.retry_attempt = parse_override("LOC_RETRYATTEMPT", &v)?;
        }
        if let Some(v) = var("LOC_ALLOWEDCOUNTRIESCODES") {
            self.loc.allowed_countries_codes = v
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = var("DB_URL") {
            self.db.url = v;
        }
        if let Some(v) = var("DB_PORT") {
            self.db.port = parse_override("DB_PORT", &v)?;
        }
        if let Some(v) = var("DB_LOGIN") {
            self.db.login = v;
        }
        if let Some(v) = var("DB_PASSWORD") {
            self.db.password = v;
        }
        if let Some(v) = var("DB_NAMEDB") {
            self.db.name_db = v;
        }
        if let Some(v) = var("DB_MAXCONNS") {
            self.db.max_conns = parse_override("DB_MAXCONNS", &v)?;
        }
        if let Some(v) = var("DB_MIGRATIONS") {
            self.db.migrations = v;
        }
        if let Some(v) = var("EVENT_URL") {
            self.event.url = v;
        }
        if let Some(v) = var("EVENT_EVENTCHANNEL") {
            self.event.event_channel = v;
        }
        if let Some(v) = var("LOGLEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    /// Level for the service's own logging. Accepts the usual level names
    /// plus `warning`, `fatal` and `panic`; anything else falls back to `info`.
    pub fn log_level_filter(&self) -> LevelFilter {
        let level = self.log_level.trim().to_ascii_lowercase();
        match level.as_str() {
            "" => LevelFilter::INFO,
            "warning" => LevelFilter::WARN,
            "fatal" | "panic" => LevelFilter::ERROR,
            other => other.parse().unwrap_or(LevelFilter::INFO),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.loc.retry_attempt)
    }

    pub fn loc_timeout(&self) -> Duration {
        Duration::from_secs(self.loc.timeout_secs)
    }

    pub fn event_timeout(&self) -> Duration {
        Duration::from_secs(self.event.timeout_secs)
    }

    /// Whether change events should be published.
    pub fn events_enabled(&self) -> bool {
        !self.event.url.trim().is_empty()
    }

    /// Connection settings for PostgreSQL, or `None` for the in-memory store.
    #[cfg(feature = "database")]
    pub fn database_config(&self) -> Option<crate::database::DatabaseConfig> {
        let host = self.db.url.trim();
        if host.is_empty() {
            return None;
        }
        let migrations = self.db.migrations.trim();
        Some(crate::database::DatabaseConfig {
            host: host.to_string(),
            port: self.db.port,
            username: self.db.login.clone(),
            password: self.db.password.clone(),
            database: self.db.name_db.clone(),
            max_connections: self.db.max_conns,
            migrations: (!migrations.is_empty()).then(|| migrations.into()),
            ..Default::default()
        })
    }
}

fn parse_override<T>(name: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {ENV_PREFIX}{name}: '{value}'"))
}
