//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_TTL_SECS: u64 = 15 * 60;
const DEFAULT_CACHE_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_PAGE_SIZE: usize = 5;

/// Command-line arguments for the racconto binary.
#[derive(Debug, Parser)]
#[command(name = "racconto", version, about = "Racconto publishing server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "RACCONTO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Postgres connection URL.
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,

    /// Redis URL for the read-path cache; omit to run without a shared cache.
    #[arg(long = "cache-url", env = "RACCONTO_CACHE_URL", value_name = "URL")]
    pub cache_url: Option<String>,

    /// Listen host override.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Listen port override.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration could not be loaded: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid listen address `{address}`: {message}")]
    InvalidAddress { address: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub feed: FeedSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> Result<SocketAddr, SettingsError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::InvalidAddress {
                address: format!("{}:{}", self.host, self.port),
                message: err.to_string(),
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub enabled: bool,
    pub url: Option<String>,
    pub ttl_secs: u64,
    pub connect_timeout_secs: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

/// Parse the CLI and load settings with layered precedence.
pub fn load_with_cli() -> Result<(CliArgs, Settings), SettingsError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

pub fn load(cli: &CliArgs) -> Result<Settings, SettingsError> {
    let mut builder = default_builder()?
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false));

    if let Some(path) = &cli.config_file {
        builder = builder.add_source(File::from(path.clone()));
    }

    builder = builder.add_source(Environment::with_prefix("RACCONTO").separator("__"));

    if let Some(url) = &cli.database_url {
        builder = builder.set_override("database.url", url.as_str())?;
    }
    if let Some(url) = &cli.cache_url {
        builder = builder.set_override("cache.url", url.as_str())?;
    }
    if let Some(host) = &cli.host {
        builder = builder.set_override("server.host", host.as_str())?;
    }
    if let Some(port) = cli.port {
        builder = builder.set_override("server.port", port)?;
    }

    Ok(builder.build()?.try_deserialize()?)
}

fn default_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", DEFAULT_HOST)?
        .set_default("server.port", DEFAULT_PORT)?
        .set_default("database.url", "postgres://localhost/racconto")?
        .set_default("database.max_connections", DEFAULT_DB_MAX_CONNECTIONS)?
        .set_default("database.run_migrations", true)?
        .set_default("cache.enabled", true)?
        .set_default("cache.ttl_secs", DEFAULT_CACHE_TTL_SECS)?
        .set_default("cache.connect_timeout_secs", DEFAULT_CACHE_CONNECT_TIMEOUT_SECS)?
        .set_default("feed.page_size", DEFAULT_PAGE_SIZE as i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "compact")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_cli() -> CliArgs {
        CliArgs {
            config_file: None,
            database_url: None,
            cache_url: None,
            host: None,
            port: None,
        }
    }

    #[test]
    fn defaults_load_without_a_config_file() {
        let settings = load(&bare_cli()).expect("defaults");

        assert_eq!(settings.server.port, DEFAULT_PORT);
        assert_eq!(settings.cache.ttl_secs, 15 * 60);
        assert!(settings.cache.enabled);
        assert!(settings.cache.url.is_none());
        assert_eq!(settings.feed.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let mut cli = bare_cli();
        cli.port = Some(8080);
        cli.database_url = Some("postgres://db.internal/racconto".to_string());

        let settings = load(&cli).expect("settings");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.url, "postgres://db.internal/racconto");
    }

    #[test]
    fn server_addr_parses() {
        let settings = load(&bare_cli()).expect("defaults");
        let addr = settings.server.addr().expect("addr");
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn invalid_host_is_reported() {
        let mut cli = bare_cli();
        cli.host = Some("not a host".to_string());

        let settings = load(&cli).expect("settings");
        assert!(settings.server.addr().is_err());
    }
}
