//! Raw payload to [`Event`] normalization.
//!
//! The pipeline never fails:
//! 1. A payload that is not a JSON array yields no events (with a warning)
//! 2. Each element is read leniently into a [`RawEvent`]
//! 3. Missing fields are filled with defaults
//!
//! Missing or unparseable times fall back to the normalization instant
//! ("now"). Generated ids combine that instant with a random suffix; they are
//! unique in practice but not guaranteed to be.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::Value;
use sonar_calendar_core::Event;
use tracing::{debug, warn};

use crate::raw_event::RawEvent;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Normalizes a raw payload using the current time as fallback.
pub fn normalize_events(raw: &Value) -> Vec<Event> {
    normalize_events_at(raw, Utc::now())
}

/// Normalizes a raw payload with an explicit fallback instant.
pub fn normalize_events_at(raw: &Value, now: DateTime<Utc>) -> Vec<Event> {
    let Some(records) = raw.as_array() else {
        warn!(
            payload_type = json_type_name(raw),
            "event data is not an array, ignoring it"
        );
        return Vec::new();
    };

    let events: Vec<Event> = records
        .iter()
        .map(|record| normalize_event(&RawEvent::from_value(record), now))
        .collect();

    debug!(count = events.len(), "normalized events");
    events
}

/// Converts a [`RawEvent`] into an [`Event`], filling defaults.
pub fn normalize_event(raw: &RawEvent, now: DateTime<Utc>) -> Event {
    let id = match raw.id {
        Some(ref id) => id.clone(),
        None => generate_event_id(now),
    };

    let start = raw.start.unwrap_or_else(|| {
        debug!(event_id = %id, "missing or invalid start, using now");
        now
    });
    let end = raw.end.unwrap_or_else(|| {
        debug!(event_id = %id, "missing or invalid end, using now");
        now
    });

    let mut event = Event::new(id, start, end);

    if let Some(title) = non_blank(raw.title.as_deref()) {
        event = event.with_title(title);
    }
    if let Some(ref description) = raw.description {
        event = event.with_description(description);
    }
    if let Some(ref location) = raw.location {
        event = event.with_location(location);
    }
    if let Some(category) = non_blank(raw.category.as_deref()) {
        event = event.with_category(category);
    }

    event
}

/// Generates an id of the form `event-<unix millis>-<random base36>`.
pub fn generate_event_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("event-{}-{}", now.timestamp_millis(), suffix)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
