//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use sonar_calendar_core::{Theme, ViewMode};
use sonar_calendar_providers::FetchFilters;
use url::Url;

/// Selector under which `--data` files are registered.
pub const DATA_SELECTOR: &str = "#calendar-data";

/// sonar-calendar - Browse calendar events from an endpoint or a JSON file
#[derive(Debug, Parser)]
#[command(name = "sonar-calendar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SONAR_CALENDAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Data source ---
    /// Endpoint returning a JSON array of events
    #[arg(long, env = "SONAR_CALENDAR_API_URL")]
    pub api_url: Option<Url>,

    /// File containing a JSON array of events
    #[arg(long, conflicts_with = "api_url")]
    pub data: Option<PathBuf>,

    /// Lower date bound sent to the endpoint (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Upper date bound sent to the endpoint (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    // --- View ---
    /// View mode: upcoming, month, week or day
    #[arg(long, default_value = "upcoming")]
    pub view: ViewMode,

    /// Reference date (YYYY-MM-DD), defaults to now
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Theme: light or dark
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Offset of the displayed calendar in minutes east of UTC
    #[arg(long, allow_negative_numbers = true)]
    pub utc_offset: Option<i32>,

    /// Open the details of this event, as a `#event-<id>` deep link would
    #[arg(long)]
    pub event: Option<String>,

    /// Print the visible events as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Filters sent to the data source, if any bound was given.
    pub fn fetch_filters(&self) -> Option<FetchFilters> {
        if self.start_date.is_none() && self.end_date.is_none() {
            return None;
        }

        let mut filters = FetchFilters::new();
        if let Some(date) = self.start_date {
            filters = filters.with_start_date(date);
        }
        if let Some(date) = self.end_date {
            filters = filters.with_end_date(date);
        }
        Some(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["sonar-calendar"]).unwrap();
        assert_eq!(cli.view, ViewMode::Upcoming);
        assert!(cli.theme.is_none());
        assert!(cli.fetch_filters().is_none());
        assert!(!cli.json);
    }

    #[test]
    fn parses_view_and_date() {
        let cli = Cli::try_parse_from([
            "sonar-calendar",
            "--view",
            "week",
            "--date",
            "2025-05-14",
            "--theme",
            "dark",
            "--utc-offset",
            "-300",
        ])
        .unwrap();

        assert_eq!(cli.view, ViewMode::Week);
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2025, 5, 14));
        assert_eq!(cli.theme, Some(Theme::Dark));
        assert_eq!(cli.utc_offset, Some(-300));
    }

    #[test]
    fn rejects_unknown_view() {
        assert!(Cli::try_parse_from(["sonar-calendar", "--view", "year"]).is_err());
    }

    #[test]
    fn data_conflicts_with_api_url() {
        let result = Cli::try_parse_from([
            "sonar-calendar",
            "--api-url",
            "https://example.com/events",
            "--data",
            "events.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn date_bounds_become_filters() {
        let cli = Cli::try_parse_from([
            "sonar-calendar",
            "--start-date",
            "2025-05-01",
            "--end-date",
            "2025-05-31",
        ])
        .unwrap();

        let filters = cli.fetch_filters().unwrap();
        assert_eq!(filters.get("startDate"), Some("2025-05-01"));
        assert_eq!(filters.get("endDate"), Some("2025-05-31"));
    }
}
