//! Structured logging setup.
//!
//! Events are emitted with the `tracing` macros throughout the crate. The
//! binary installs a global subscriber with [`init_logging`]; embedders may
//! instead attach a private [`Dispatch`] to a single server through
//! [`Diagnostics`], which is how tests observe fault reports.
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `PATHMUX_LOG_LEVEL` | `trace`, `debug`, `info`, `warn`, `error` | `info` |
//! | `PATHMUX_LOG_FORMAT` | `json`, `pretty` | `pretty` |
//!
//! `RUST_LOG`, when set, takes precedence over `PATHMUX_LOG_LEVEL`.

use anyhow::{Context as _, Result};
use std::env;
use tracing::{Dispatch, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable multi-line output
    Pretty,
}

impl LogFormat {
    /// `json` selects JSON; anything else is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    /// Output format of the fmt layer
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    /// Parse `PATHMUX_LOG_LEVEL` and `PATHMUX_LOG_FORMAT`, with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("PATHMUX_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: env::var("PATHMUX_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
        }
    }

    /// Level named by `log_level`; unknown names mean INFO.
    #[must_use]
    pub fn level(&self) -> Level {
        match self.log_level.trim().to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when a global subscriber has already been installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    // Keep transport chatter out of the application log.
    if let Ok(directive) = "may_minihttp=warn".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

/// Where a server's log events go.
///
/// The default sends events to whatever subscriber is current for the
/// calling thread (usually the global one). With an explicit [`Dispatch`]
/// every event raised while dispatching a request, including fault reports,
/// goes to that dispatch instead.
#[derive(Clone, Default)]
pub struct Diagnostics {
    dispatch: Option<Dispatch>,
}

impl Diagnostics {
    /// Route events to `dispatch`.
    #[must_use]
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Whether a private dispatch is attached.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Run `f` with this sink as the current default subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("private", &self.is_private())
            .finish()
    }
}
