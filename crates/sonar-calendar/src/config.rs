//! Widget configuration.
//!
//! Settings live in a single `config.toml` file at
//! `~/.config/sonar-calendar/config.toml` by default. Every key is optional:
//!
//! ```toml
//! theme = "dark"
//! api_url = "https://example.com/api/events"
//! data_selector = "#calendar-data"
//! cache_ttl_secs = 300
//! request_timeout_secs = 30
//! utc_offset_minutes = 120
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use sonar_calendar_core::Theme;
use url::Url;

use crate::error::{WidgetError, WidgetResult};

/// Configuration for the calendar widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Presentation theme.
    pub theme: Theme,

    /// Remote endpoint; takes precedence over `data_selector`.
    pub api_url: Option<Url>,

    /// Selector of the element holding embedded JSON data.
    pub data_selector: Option<String>,

    /// How long remote responses are cached. `0` disables the cache.
    pub cache_ttl_secs: u64,

    /// Remote request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Offset used for month, week and day views. Defaults to the host's
    /// local offset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            api_url: None,
            data_selector: None,
            cache_ttl_secs: 300,
            request_timeout_secs: 30,
            utc_offset_minutes: None,
        }
    }
}

impl CalendarConfig {
    /// Loads configuration from the default path, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> WidgetResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> WidgetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| WidgetError::config_file(path, e.to_string()))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sonar-calendar")
            .join("config.toml")
    }

    /// Builder: set the remote endpoint.
    pub fn with_api_url(mut self, url: Url) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Builder: set the embedded data selector.
    pub fn with_data_selector(mut self, selector: impl Into<String>) -> Self {
        self.data_selector = Some(selector.into());
        self
    }

    /// Builder: set the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Builder: set the view offset in minutes east of UTC.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = Some(minutes);
        self
    }

    /// Builder: set the cache TTL in seconds.
    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolves the view offset.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the offset is out of range
    /// (more than a day either way).
    pub fn utc_offset(&self) -> WidgetResult<FixedOffset> {
        match self.utc_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    WidgetError::config(format!("invalid utc_offset_minutes: {}", minutes))
                }),
            None => Ok(Local::now().offset().fix()),
        }
    }
}
