//! View modes and themes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an unknown view mode or theme name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseNameError {
    kind: &'static str,
    value: String,
}

/// Which slice of the loaded events the calendar shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Events starting at or after the reference date.
    #[default]
    Upcoming,
    /// Events in the reference date's calendar month.
    Month,
    /// Events in the Sunday-based week containing the reference date.
    Week,
    /// Events on the reference date's calendar day.
    Day,
}

impl ViewMode {
    /// All recognized view modes, in toggle order.
    pub const ALL: [ViewMode; 4] = [Self::Upcoming, Self::Month, Self::Week, Self::Day];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
        }
    }

    /// Capitalized label for toggle buttons.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upcoming => "Upcoming",
            Self::Month => "Month",
            Self::Week => "Week",
            Self::Day => "Day",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|view| view.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseNameError {
                kind: "view mode",
                value: s.to_string(),
            })
    }
}

/// Presentation theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Class name applied to the widget root (`theme-light` / `theme-dark`).
    pub fn class_name(&self) -> String {
        format!("theme-{}", self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ParseNameError {
                kind: "theme",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_modes() {
        assert_eq!("upcoming".parse::<ViewMode>(), Ok(ViewMode::Upcoming));
        assert_eq!("Month".parse::<ViewMode>(), Ok(ViewMode::Month));
        assert_eq!(" week ".parse::<ViewMode>(), Ok(ViewMode::Week));
        assert_eq!("DAY".parse::<ViewMode>(), Ok(ViewMode::Day));
    }

    #[test]
    fn rejects_unknown_view_mode() {
        let err = "year".parse::<ViewMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown view mode: year");
    }

    #[test]
    fn view_mode_serde_is_lowercase() {
        let json = serde_json::to_string(&ViewMode::Week).unwrap();
        assert_eq!(json, "\"week\"");
        let parsed: ViewMode = serde_json::from_str("\"day\"").unwrap();
        assert_eq!(parsed, ViewMode::Day);
    }

    #[test]
    fn theme_parsing_and_class() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Dark.class_name(), "theme-dark");
    }
}
