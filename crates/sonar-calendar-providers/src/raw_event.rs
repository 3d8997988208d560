//! Raw event records as they come from a data source.
//!
//! Sources deliver untyped JSON. [`RawEvent::from_value`] extracts the fields
//! the widget understands with lenient typing: a missing or wrongly typed
//! field becomes `None` instead of failing the whole record. Defaults are
//! applied later by [`normalize_event`](crate::normalize::normalize_event).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// Formats accepted for naive (offset-less) datetimes, interpreted as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A raw event record with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    pub id: Option<String>,
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

impl RawEvent {
    /// Extracts a raw event from a JSON value.
    ///
    /// Non-object values yield an empty record.
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(object) => Self::from_object(object),
            None => Self::default(),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            id: object.get("id").and_then(id_field),
            title: string_field(object, "title"),
            start: object.get("start").and_then(parse_time),
            end: object.get("end").and_then(parse_time),
            description: string_field(object, "description"),
            location: string_field(object, "location"),
            category: string_field(object, "category"),
        }
    }

    /// Builder method to set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method to set start and end.
    pub fn with_times(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Builder method to set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Ids may be strings or numbers; numbers are stringified.
fn id_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses a raw time value.
///
/// Accepts RFC 3339 strings, naive datetimes (as UTC), date-only strings
/// (UTC midnight) and numbers (Unix epoch milliseconds).
pub fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

fn parse_time_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}
