//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! All binaries log to stderr so that stdout stays free for JSON or CSV output.
//!
//! # Log Levels
//!
//! - `warn`: unresolved codifications, duplicate field identifiers
//! - `info`: per-file progress, summary counts
//! - `debug`: rule matches, skipped rows

use clap::ValueEnum;
use std::io;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Error, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON lines for machine parsing.
    Json,
}

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset or ignored.
    pub level: Level,
    pub format: LogFormat,
    pub with_ansi: bool,
    /// Honour `RUST_LOG` when set.
    pub use_env_filter: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            with_ansi: true,
            use_env_filter: true,
        }
    }
}

impl LogConfig {
    /// Create a `LogConfig` from a `-v` count.
    ///
    /// - 0: info
    /// - 1: debug
    /// - 2+: trace
    ///
    /// An explicit `-v` takes precedence over `RUST_LOG`.
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            use_env_filter: verbosity == 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let default_directive: Directive = LevelFilter::from_level(self.level).into();
        if self.use_env_filter {
            EnvFilter::builder()
                .with_default_directive(default_directive)
                .from_env_lossy()
        } else {
            EnvFilter::default().add_directive(default_directive)
        }
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr).with_target(false))
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(false)
                    .without_time(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(false)
                    .without_time(),
            )
            .try_init(),
    };

    installed.map_err(|error| Error::Logging(error.to_string()))
}
