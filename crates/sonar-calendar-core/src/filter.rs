//! View filtering.
//!
//! [`filter_events`] is a pure function: it copies the events matching the
//! view's predicate and preserves their input order. Callers that need
//! chronological order sort upstream.

use chrono::{DateTime, TimeZone};

use crate::event::Event;
use crate::time::{TimeWindow, to_local};
use crate::view::ViewMode;

/// Returns the events visible in `view` relative to `reference`.
///
/// Month, week and day views compare wall-clock time in the reference's
/// timezone. The upcoming view compares instants and includes events starting
/// exactly at `reference`.
pub fn filter_events<Tz: TimeZone>(
    events: &[Event],
    reference: &DateTime<Tz>,
    view: ViewMode,
) -> Vec<Event> {
    events
        .iter()
        .filter(|event| is_visible(event, reference, view))
        .cloned()
        .collect()
}

/// Checks a single event against the view predicate.
///
/// An event whose start has no wall-clock representation in the reference
/// timezone is outside every calendar view.
pub fn is_visible<Tz: TimeZone>(event: &Event, reference: &DateTime<Tz>, view: ViewMode) -> bool {
    match view {
        ViewMode::Upcoming => event.start >= *reference,
        ViewMode::Month | ViewMode::Week | ViewMode::Day => {
            let Some(local_start) = to_local(&event.start, &reference.timezone()) else {
                return false;
            };
            view_window(reference, view).is_some_and(|window| window.contains(local_start))
        }
    }
}

/// Returns the wall-clock window of a calendar view, or `None` for the
/// open-ended upcoming view.
pub fn view_window<Tz: TimeZone>(reference: &DateTime<Tz>, view: ViewMode) -> Option<TimeWindow> {
    let date = reference.date_naive();
    match view {
        ViewMode::Upcoming => None,
        ViewMode::Month => Some(TimeWindow::month(date)),
        ViewMode::Week => Some(TimeWindow::week(date)),
        ViewMode::Day => Some(TimeWindow::day(date)),
    }
}
