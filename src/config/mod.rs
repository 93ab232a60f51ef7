//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;
use crate::navigation::NavigationConfig;

mod cli;

pub use cli::{CliArgs, Command, Overrides, ReplayArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "navcache";
const ENV_PREFIX: &str = "NAVCACHE";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheConfig,
    pub navigation: NavigationConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggingSettings {
    #[serde(serialize_with = "serialize_level")]
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSettings {
    /// Directory for file-backed session storage; in-memory when unset.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for
/// downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: CacheConfig,
    navigation: NavigationConfig,
    session: RawSessionSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    directory: Option<PathBuf>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(limit) = overrides.page_data_limit {
            self.cache.page_data_limit = limit;
        }
        if let Some(limit) = overrides.feed_limit {
            self.cache.feed_limit = limit;
        }
        if let Some(limit) = overrides.event_queue_limit {
            self.cache.event_queue_limit = limit;
        }
        if let Some(ttl) = overrides.handoff_ttl_ms {
            self.navigation.handoff_ttl_ms = ttl;
        }
        if let Some(attempts) = overrides.restore_max_attempts {
            self.navigation.restore_max_attempts = attempts;
        }
        if let Some(directory) = overrides.session_directory.as_ref() {
            self.session.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            navigation,
            session,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            cache: validate_cache(cache)?,
            navigation: validate_navigation(navigation)?,
            session: SessionSettings {
                directory: session.directory,
            },
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn validate_cache(cache: CacheConfig) -> Result<CacheConfig, LoadError> {
    positive(cache.page_data_limit as u64, "cache.page_data_limit")?;
    positive(cache.feed_limit as u64, "cache.feed_limit")?;
    positive(cache.message_history_limit as u64, "cache.message_history_limit")?;
    positive(cache.event_queue_limit as u64, "cache.event_queue_limit")?;
    positive(cache.consume_batch_limit as u64, "cache.consume_batch_limit")?;
    Ok(cache)
}

fn validate_navigation(navigation: NavigationConfig) -> Result<NavigationConfig, LoadError> {
    positive(navigation.handoff_ttl_ms, "navigation.handoff_ttl_ms")?;
    positive(
        u64::from(navigation.restore_max_attempts),
        "navigation.restore_max_attempts",
    )?;
    positive(navigation.reconcile_debounce_ms, "navigation.reconcile_debounce_ms")?;
    if navigation.reconcile_settle_ms < navigation.reconcile_debounce_ms {
        return Err(LoadError::invalid(
            "navigation.reconcile_settle_ms",
            "must not be shorter than navigation.reconcile_debounce_ms",
        ));
    }
    if navigation.route_scroll_storage_key.trim().is_empty() {
        return Err(LoadError::invalid(
            "navigation.route_scroll_storage_key",
            "must not be empty",
        ));
    }
    Ok(navigation)
}

fn positive(value: u64, key: &'static str) -> Result<(), LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(())
}

fn serialize_level<S: Serializer>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&level.to_string().to_lowercase())
}
