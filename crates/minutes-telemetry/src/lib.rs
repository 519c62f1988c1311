//! Log subscriber setup shared by the `minutes` binary and its tests.
//!
//! Everything is written to stderr; stdout is reserved for summaries and
//! plans. `RUST_LOG`, when set, replaces the configured filter entirely.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// HTTP plumbing that is chatty at debug level.
const QUIET_TARGETS: [&str; 3] = ["hyper_util=warn", "h2=warn", "rustls=warn"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event, with the span stack attached.
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else if s.eq_ignore_ascii_case("pretty") || s.eq_ignore_ascii_case("text") {
            Ok(Self::Pretty)
        } else {
            Err(TelemetryError::InvalidFormat(s.to_owned()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("unknown log format {0:?} (expected pretty or json)")]
    InvalidFormat(String),
    #[error("unknown log level {0:?}")]
    InvalidLevel(String),
    #[error("a global subscriber is already installed: {0}")]
    Install(String),
}

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub level: Level,
    /// Extra `target=level` directives appended after the base level.
    pub directives: Vec<String>,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            directives: QUIET_TARGETS.iter().map(|d| (*d).to_owned()).collect(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Config for a level name such as `"debug"` (case-insensitive).
    pub fn from_level_name(level: &str, format: LogFormat) -> Result<Self, TelemetryError> {
        let level = level
            .parse::<Level>()
            .map_err(|_| TelemetryError::InvalidLevel(level.to_owned()))?;
        Ok(Self {
            level,
            format,
            ..Self::default()
        })
    }

    /// The filter in `EnvFilter` syntax.
    pub fn filter_directives(&self) -> String {
        std::iter::once(self.level.as_str().to_ascii_lowercase())
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(config.filter_directives()),
    };

    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let layer = match config.format {
        LogFormat::Json => layer.json().with_span_list(true).with_filter(filter).boxed(),
        LogFormat::Pretty => layer.with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))
}
