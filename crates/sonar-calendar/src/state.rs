//! Widget state.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use sonar_calendar_core::{Event, Theme, ViewMode};

/// Progress of the most recent load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum LoadStatus {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    Loading,
    Loaded,
    /// The last load failed with the given message.
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The failure message, if the last load failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Everything the controller knows about the widget.
///
/// `current_date` carries the offset used for month, week and day views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarState {
    pub current_date: DateTime<FixedOffset>,
    pub current_view: ViewMode,
    pub events: Vec<Event>,
    pub active_event_id: Option<String>,
    pub load_status: LoadStatus,
    pub theme: Theme,
}

impl CalendarState {
    pub fn new(current_date: DateTime<FixedOffset>, theme: Theme) -> Self {
        Self {
            current_date,
            current_view: ViewMode::default(),
            events: Vec::new(),
            active_event_id: None,
            load_status: LoadStatus::Idle,
            theme,
        }
    }

    /// Looks up a loaded event by id.
    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }
}
