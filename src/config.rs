//! Runtime configuration.
//!
//! Layered, later wins:
//!
//! 1. built-in defaults,
//! 2. `config/settings.toml` (optional),
//! 3. `MENU__<SECTION>__<KEY>` environment variables, e.g. `MENU__SERVER__PORT=9000`.
//!
//! A `.env` file in the working directory is read first, so its entries behave like real
//! environment variables.

use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "MENU";
const DEFAULT_FILE: &str = "config/settings";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub orders: OrdersConfig,
    pub admin: AdminConfig,
    pub actors: ActorsConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the JSON file stores. In-memory only when unset.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrdersConfig {
    /// How long finished orders are kept.
    pub retention_hours: u64,
    pub maintenance_interval_secs: u64,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            retention_hours: 72,
            maintenance_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Secret required to register restaurants. Registration is disabled when unset.
    pub platform_key: Option<String>,
    pub session_ttl_minutes: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            platform_key: None,
            session_ttl_minutes: 12 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ActorsConfig {
    pub buffer: usize,
    pub event_buffer: usize,
}

impl Default for ActorsConfig {
    fn default() -> Self {
        Self {
            buffer: 64,
            event_buffer: resource_actor::DEFAULT_EVENT_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedConfig {
    /// JSON array of restaurants to create at startup when missing.
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Loads `.env`, `config/settings.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(File::with_name(DEFAULT_FILE).required(false))
    }

    /// Like [`Settings::load`] with an explicit settings file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.actors.buffer == 0 || self.actors.event_buffer == 0 {
            return Err(ConfigError::Message(
                "actors.buffer and actors.event_buffer must be positive".into(),
            ));
        }
        if self.orders.maintenance_interval_secs == 0 {
            return Err(ConfigError::Message(
                "orders.maintenance_interval_secs must be positive".into(),
            ));
        }
        if self.admin.session_ttl_minutes == 0 {
            return Err(ConfigError::Message(
                "admin.session_ttl_minutes must be positive".into(),
            ));
        }
        if matches!(&self.admin.platform_key, Some(key) if key.trim().is_empty()) {
            return Err(ConfigError::Message(
                "admin.platform_key must not be blank".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Message(format!("invalid server address: {e}")))
    }

    pub fn retention(&self) -> Duration {
        Duration::hours(self.orders.retention_hours as i64)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::minutes(self.admin.session_ttl_minutes as i64)
    }

    pub fn maintenance_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.orders.maintenance_interval_secs)
    }
}
