//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables (`REAP_*`)
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::config;
use crate::format::{self, ColorChoice, OutputFormat, OutputFormatter};
use libreap::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// How much diagnostic logging goes to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    /// Warnings and errors only
    #[default]
    Normal,
    /// `-v`
    Verbose,
    /// `-vv`
    Debug,
    /// `-vvv` and beyond
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags.
pub fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Config file that was loaded, if any
    pub config_path: Option<PathBuf>,
    /// Verbosity requested on the command line
    pub verbosity: VerbosityLevel,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    ///
    /// An explicit `--config` file must exist; the default location is only
    /// read when present.
    pub fn build(
        cli_color: Option<ColorChoice>,
        verbosity: VerbosityLevel,
        cli_config: Option<PathBuf>,
    ) -> Result<Self, String> {
        let config_path = match cli_config {
            Some(path) => Some(path),
            None => Some(config::get_config_path()).filter(|p| p.exists()),
        };

        let mut config = Config::load(config_path.as_deref()).map_err(|e| e.to_string())?;
        match &config_path {
            Some(path) => tracing::debug!(path = %path.display(), "loaded config file"),
            None => tracing::debug!("no config file, using defaults and environment"),
        }

        if let Some(color) = cli_color {
            config.output.color = color;
        }

        Ok(Self {
            config,
            config_path,
            verbosity,
        })
    }

    /// Context with default configuration, for tests and fallbacks.
    #[cfg(test)]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            config_path: None,
            verbosity: VerbosityLevel::Normal,
        }
    }

    /// Resolves the output format: the `-f` flag when given, else the config.
    pub fn output_format(&self, flag: Option<&str>) -> Result<OutputFormat, String> {
        match flag {
            Some(value) => value.parse().map_err(|e: libreap::ReapError| e.to_string()),
            None => Ok(self.config.output.format),
        }
    }

    /// Formatter honouring the configured color choice.
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        format::create_formatter(self.config.output.color)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
