//! Log subscriber setup for the calendar widget.
//!
//! The widget crates only emit `tracing` events under targets starting with
//! `sonar_calendar`. The CLI (or an embedding host) installs a subscriber once
//! with [`init_tracing`]:
//!
//! ```ignore
//! use sonar_calendar_core::{TracingConfig, init_tracing};
//!
//! init_tracing(TracingConfig::cli_debug())?;
//! ```
//!
//! Without `RUST_LOG`, the configured level applies to the widget crates only;
//! dependencies such as the HTTP client stay at `warn`.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Target prefix shared by the widget crates.
const LOG_TARGET: &str = "sonar_calendar";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// One line per event.
    #[default]
    Compact,
    /// Multi-line, indented.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the widget crates when `RUST_LOG` is unset.
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Adds file, line, target and span open/close events.
    pub verbose: bool,
    pub timestamps: bool,
    /// Explicit filter directive; wins over both `RUST_LOG` and `level`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: TracingOutputFormat::Compact,
            verbose: false,
            timestamps: true,
            filter: None,
        }
    }
}

impl TracingConfig {
    /// `--debug` runs: debug level, source locations, no timestamps.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            verbose: true,
            timestamps: false,
            ..Self::default()
        }
    }

    /// JSON lines at info level, for hosts that collect logs.
    #[must_use]
    pub fn structured() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Json,
            verbose: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Directive used when neither `filter` nor `RUST_LOG` is set.
    fn default_directive(&self) -> String {
        format!("warn,{}={}", LOG_TARGET, self.level.as_str().to_lowercase())
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        match self.filter {
            Some(ref filter) => Ok(EnvFilter::try_new(filter)?),
            None => Ok(EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(self.default_directive()))?),
        }
    }

    fn layer(&self) -> BoxedLayer {
        let span_events = if self.verbose {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_file(self.verbose)
            .with_line_number(self.verbose)
            .with_target(self.verbose)
            .with_span_events(span_events);

        match (self.format, self.timestamps) {
            (TracingOutputFormat::Compact, true) => base.compact().boxed(),
            (TracingOutputFormat::Compact, false) => base.compact().without_time().boxed(),
            (TracingOutputFormat::Pretty, true) => base.pretty().boxed(),
            (TracingOutputFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (TracingOutputFormat::Json, true) => base.json().boxed(),
            (TracingOutputFormat::Json, false) => base.json().without_time().boxed(),
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the filter directive does
/// not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::registry()
        .with(config.layer())
        .with(config.env_filter()?);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_quiet() {
        let config = TracingConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, TracingOutputFormat::Compact);
        assert!(!config.verbose);
        assert_eq!(config.default_directive(), "warn,sonar_calendar=warn");
    }

    #[test]
    fn cli_debug_scopes_level_to_widget() {
        let config = TracingConfig::cli_debug();
        assert!(config.verbose);
        assert!(!config.timestamps);
        assert_eq!(config.default_directive(), "warn,sonar_calendar=debug");
    }

    #[test]
    fn structured_is_json() {
        let config = TracingConfig::structured();
        assert_eq!(config.format, TracingOutputFormat::Json);
        assert!(config.timestamps);
    }

    #[test]
    fn explicit_filter_must_parse() {
        let config = TracingConfig::default().with_env_filter("sonar_calendar=[");
        assert!(matches!(
            config.env_filter(),
            Err(TracingError::InvalidFilter(_))
        ));

        let config = TracingConfig::default()
            .with_level(Level::TRACE)
            .with_format(TracingOutputFormat::Pretty)
            .with_env_filter("sonar_calendar_providers=trace");
        assert!(config.env_filter().is_ok());
        assert_eq!(config.format, TracingOutputFormat::Pretty);
    }
}
