//! Canonical calendar event.
//!
//! Every data source (remote endpoint, embedded document element) is
//! normalized into [`Event`] before it reaches the controller, so the rest of
//! the widget never deals with missing or malformed fields.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event with every field resolved.
///
/// `start <= end` is not enforced: inverted ranges are carried as-is and can
/// be detected with [`Event::is_inverted`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier (generated when the source omits it).
    pub id: String,
    /// Display title.
    pub title: String,
    /// When the event starts.
    pub start: DateTime<Utc>,
    /// When the event ends.
    pub end: DateTime<Utc>,
    /// Free-form description, empty when absent.
    pub description: String,
    /// Location, empty when absent.
    pub location: String,
    /// Category slug used for styling.
    pub category: String,
}

impl Event {
    /// Title used when a record has no usable title.
    pub const DEFAULT_TITLE: &'static str = "Untitled Event";

    /// Category used when a record has no usable category.
    pub const DEFAULT_CATEGORY: &'static str = "default";

    /// Creates an event with default title, description, location and category.
    pub fn new(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: Self::DEFAULT_TITLE.to_string(),
            start,
            end,
            description: String::new(),
            location: String::new(),
            category: Self::DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Returns the event duration. Negative for inverted ranges.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if the event ends before it starts.
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    /// Returns true if the event is running at `now`.
    pub fn is_ongoing(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    /// CSS-style class name for the category (`event-category-<slug>`).
    pub fn category_class(&self) -> String {
        let slug = self
            .category
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!("event-category-{}", slug)
    }
}
