//! Client configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. `config/default` and `config/local` (optional, any format `config` reads)
//! 3. An explicit file passed on the command line
//! 4. Environment variables (`HORSE_ID__API__BASE_URL`, `HORSE_ID__API__ADMIN_TOKEN`, ...)

use super::api::AdminToken;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.horse-id-system.ru/api";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    /// Shared secret for the administrator console
    #[serde(default)]
    pub admin_token: Option<AdminToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON file remembering dropdown selections per application
    pub side_store_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log file; the terminal belongs to the UI
    pub file: PathBuf,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl ClientConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("storage.side_store_path", "horse-id-selections.json")?
            .set_default("logging.file", "horse-id.log")?
            .set_default("logging.filter", "horse_id=info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix("HORSE_ID").separator("__"))
            .build()?
            .try_deserialize()
    }
}
