//! For reading application configuration.

use config::{builder::DefaultState, ConfigBuilder};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Pagination configuration.
    #[validate(nested)]
    pub pagination: PaginationConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server address.
    pub http_address: String,
    /// Server http port.
    pub http_port: u16,
    /// How long a request may take before it is aborted.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Requests beyond this many in flight are shed.
    pub concurrency_limit: usize,
    /// Directory with the static front-end files.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_address: "127.0.0.1".to_string(),
            http_port: 8080,
            request_timeout: Duration::from_secs(10),
            concurrency_limit: 500,
            static_dir: "wwwroot".to_string(),
        }
    }
}

/// Pagination configuration.
#[derive(Clone, Copy, Debug, Deserialize, Validate)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the client does not ask for one.
    /// Held to the same bounds as a requested `pageSize`.
    #[validate(range(min = 1, max = 100))]
    pub default_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 5,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives, used when `RUST_LOG` is not set.
    pub filter: String,
    /// Write hourly JSON log files to this directory.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=debug,todo_api=debug".to_string(),
            directory: None,
        }
    }
}

/// Retrieve [`Config`] from the default configuration file.
#[tracing::instrument]
pub fn load_config() -> color_eyre::Result<Config> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("app").separator("__"));
    build_config(builder)
}

/// Deserializes and validates the configuration from `builder`'s sources.
fn build_config(builder: ConfigBuilder<DefaultState>) -> color_eyre::Result<Config> {
    let config: Config = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
