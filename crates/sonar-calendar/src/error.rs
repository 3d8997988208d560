//! Widget error types.

use std::io;
use std::path::PathBuf;

use sonar_calendar_providers::ApiError;
use thiserror::Error;

/// Result type for widget operations.
pub type WidgetResult<T> = Result<T, WidgetError>;

/// Errors surfaced by the widget.
///
/// Only [`WidgetError::Config`] escapes controller construction. Failures
/// while loading events end up in
/// [`LoadStatus::Failed`](crate::state::LoadStatus::Failed) instead.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Invalid widget options.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Data source failure.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// IO error (config file, embedded data file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The configuration file could not be parsed.
    #[error("failed to parse config {}: {message}", path.display())]
    ConfigFile { path: PathBuf, message: String },
}

impl WidgetError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a config file parse error.
    pub fn config_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }
}
