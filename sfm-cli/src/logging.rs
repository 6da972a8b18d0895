//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The codec logs book boundaries at `info`, recovered anomalies (unmapped
//! markers, unclosed styles, aborted books) at `warn` and parser state at
//! `debug`/`trace`. `RUST_LOG` overrides the level chosen here.

use sfm_config::LogFormat;
use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub with_ansi: bool,
}

impl LogConfig {
    /// Each `-v` raises the configured base level by one step.
    pub fn from_verbosity(base: Level, verbosity: u8) -> Self {
        let levels = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];
        let start = levels.iter().position(|l| *l == base).unwrap_or(1);
        let index = (start + usize::from(verbosity)).min(levels.len() - 1);
        Self {
            level: levels[index],
            format: LogFormat::Compact,
            with_ansi: true,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Installs the global subscriber, writing to stderr so stdout stays clean
/// for converted output.
pub fn init_logging(config: &LogConfig) {
    let filter = build_env_filter(config.level);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr).with_target(false))
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(false)
                    .without_time(),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .without_time(),
            )
            .init(),
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        // other crates stay at warn
        EnvFilter::new(format!("warn,sfm={level},sfm_codec={level},sfm_config={level}"))
    })
}
