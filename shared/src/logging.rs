use serde::Deserialize;
use std::str::FromStr;
use tracing_subscriber::filter::{EnvFilter, LevelFilter, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),
    #[error("invalid sentry dsn: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

fn default_level() -> String {
    "info".into()
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
    /// Extra filter directives, e.g. `grouping=debug`
    pub filter: Option<String>,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            filter: None,
            sentry_dsn: None,
        }
    }
}

/// Keeps the Sentry client alive. Pending events are flushed on drop.
pub struct LoggingGuard {
    _sentry: Option<sentry::ClientInitGuard>,
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let level = LevelFilter::from_str(&config.level)
        .map_err(|_| LoggingError::InvalidLevel(config.level.clone()))?;
    let builder = EnvFilter::builder().with_default_directive(level.into());

    match &config.filter {
        Some(filter) => Ok(builder.parse(filter)?),
        None => Ok(builder.from_env_lossy()),
    }
}

/// Installs the global tracing subscriber, forwarding events to Sentry when
/// a DSN is configured.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = build_env_filter(config)?;

    let sentry_guard = match &config.sentry_dsn {
        Some(dsn) => Some(sentry::init(sentry::ClientOptions {
            dsn: Some(dsn.parse()?),
            release: sentry::release_name!(),
            ..Default::default()
        })),
        None => None,
    };
    let sentry_layer = sentry_guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .try_init()?;

    Ok(LoggingGuard {
        _sentry: sentry_guard,
    })
}
