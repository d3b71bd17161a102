//! Logging setup for the Shibboleth/CAS bridge.
//!
//! Every bridge crate emits events through `tracing`. This crate installs the
//! subscriber that turns those events into output, configured from the
//! environment:
//!
//! - `SHIBCAS_DEBUG=1` - raise the level to at least `debug`
//! - `SHIBCAS_LOG_LEVEL=trace|debug|info|warn|error|off` - minimum level
//! - `SHIBCAS_LOG_FORMAT=pretty|compact|json` - output format
//! - `SHIBCAS_LOG_COLOR=1|0` - ANSI colors for the pretty/compact formats
//! - `RUST_LOG` - full env-filter directives, overrides the level when set
//!
//! ```rust,no_run
//! shibcas_log::init();
//! tracing::info!(target: "shibcas", "bridge ready");
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the subscriber.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Invalid filter directive: {0}")]
    InvalidFilter(String),
}

pub type Result<T> = std::result::Result<T, LogError>;

// ============================================================================
// Levels and formats
// ============================================================================

/// Minimum level for emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Filter directive understood by `EnvFilter`.
    pub fn directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive())
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable output
    Pretty,
    /// Single-line human readable output
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            _ => Err(()),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub color: bool,
    /// Include the event target (module path) in each line
    pub with_target: bool,
    /// Raw `RUST_LOG` directives, used instead of `level` when present
    pub directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            color: false,
            with_target: true,
            directives: None,
        }
    }
}

impl LogConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        };

        let debug = flag("SHIBCAS_DEBUG").unwrap_or(false);

        let mut level = lookup("SHIBCAS_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Level::Info);
        if debug && level > Level::Debug {
            level = Level::Debug;
        }

        let format = lookup("SHIBCAS_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Format::Json);

        let color = flag("SHIBCAS_LOG_COLOR")
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        let directives = lookup("RUST_LOG").filter(|s| !s.trim().is_empty());

        Self {
            level,
            format,
            color: color && format != Format::Json,
            with_target: true,
            directives,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Build the env filter for this configuration.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match &self.directives {
            Some(directives) => EnvFilter::try_new(directives)
                .map_err(|e| LogError::InvalidFilter(e.to_string())),
            None => Ok(EnvFilter::new(self.level.directive())),
        }
    }
}

// ============================================================================
// Installation
// ============================================================================

/// Install the global subscriber using [`LogConfig::from_env`].
///
/// Errors are swallowed; a host that already installed its own subscriber
/// keeps it.
pub fn init() {
    let _ = try_init(&LogConfig::from_env());
}

/// Install the global subscriber for the given configuration.
pub fn try_init(config: &LogConfig) -> Result<()> {
    use tracing_subscriber::fmt::layer;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    let installed = match config.format {
        Format::Json => registry
            .with(
                layer()
                    .json()
                    .flatten_event(true)
                    .with_target(config.with_target),
            )
            .try_init(),
        Format::Pretty => registry
            .with(
                layer()
                    .pretty()
                    .with_ansi(config.color)
                    .with_target(config.with_target),
            )
            .try_init(),
        Format::Compact => registry
            .with(
                layer()
                    .compact()
                    .with_ansi(config.color)
                    .with_target(config.with_target),
            )
            .try_init(),
    };

    installed.map_err(|e| LogError::AlreadyInitialized(e.to_string()))
}
