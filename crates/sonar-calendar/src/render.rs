//! Rendering collaborators.
//!
//! The controller never produces markup itself. It drives a [`Renderer`]
//! and hands it a [`WidgetHandlers`] capability through which user
//! interaction flows back. [`TerminalRenderer`] is a plain-text renderer
//! used by the CLI.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use sonar_calendar_core::{Event, Theme, ViewMode, to_local};
use tracing::warn;

/// Presentation side of the widget.
///
/// Calls are made without any controller lock held, so implementations may
/// call back into the controller through the registered handlers.
pub trait Renderer: Send + Sync {
    /// Draws the static frame (header, navigation, view toggle).
    fn render_chrome(&self, theme: Theme);

    fn render_loading(&self);

    /// Draws the visible events, or `empty_message` when there are none.
    fn render_events(&self, view: ViewMode, title: &str, events: &[Event], empty_message: &str);

    /// Shows a failed load with a retry control.
    fn render_error(&self, message: &str);

    fn show_details(&self, event: &Event);

    fn hide_details(&self);

    fn apply_theme(&self, theme: Theme);

    /// Receives the callbacks for user interaction.
    fn register_handlers(&self, handlers: Arc<dyn WidgetHandlers>);
}

/// User interaction callbacks exposed by the controller.
pub trait WidgetHandlers: Send + Sync {
    /// An event card was clicked or activated with the keyboard.
    fn on_activate(&self, event: &Event);

    fn on_view_change(&self, view: ViewMode);

    /// A date was picked.
    fn on_date_change(&self, date: DateTime<FixedOffset>);

    /// Previous (`-1`) or next (`1`) month.
    fn on_navigate(&self, direction: i32);

    fn on_details_closed(&self);
}

/// Human readable duration, e.g. `1 hour 30 mins` or `45 minutes`.
///
/// Inverted ranges render as `0 minutes`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_minutes().max(0);
    let hours = total / 60;
    let minutes = total % 60;

    if hours > 0 {
        format!(
            "{} hour{} {} min{}",
            hours,
            if hours > 1 { "s" } else { "" },
            minutes,
            if minutes != 1 { "s" } else { "" }
        )
    } else {
        format!("{} minute{}", minutes, if minutes != 1 { "s" } else { "" })
    }
}

/// Writes the widget as plain text.
///
/// Times are shown in `offset`.
pub struct TerminalRenderer<W> {
    out: Mutex<W>,
    offset: FixedOffset,
    handlers: Mutex<Option<Arc<dyn WidgetHandlers>>>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, offset: FixedOffset) -> Self {
        Self {
            out: Mutex::new(out),
            offset,
            handlers: Mutex::new(None),
        }
    }

    /// Handlers registered by the controller, if any.
    pub fn handlers(&self) -> Option<Arc<dyn WidgetHandlers>> {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wall-clock time in the renderer's offset, or UTC at the edge of
    /// chrono's range.
    fn local(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        to_local(instant, &self.offset).unwrap_or_else(|| instant.naive_utc())
    }

    fn out(&self) -> MutexGuard<'_, W> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = self.out();
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(out, "{}", line))
            .and_then(|()| out.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to write to terminal");
        }
    }

    fn card(&self, event: &Event) -> String {
        let start = self.local(&event.start);
        let end = self.local(&event.end);
        format!(
            "  {} {}-{}  {} [{}]  #{}",
            start.format("%a %d %b"),
            start.format("%H:%M"),
            end.format("%H:%M"),
            event.title,
            event.category,
            event.id
        )
    }
}

impl TerminalRenderer<Vec<u8>> {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.out()).into_owned()
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render_chrome(&self, theme: Theme) {
        self.write_lines(&[format!("Sonar Calendar ({})", theme.class_name())]);
    }

    fn render_loading(&self) {
        self.write_lines(&["Loading events...".to_string()]);
    }

    fn render_events(&self, view: ViewMode, title: &str, events: &[Event], empty_message: &str) {
        let mut lines = vec![format!("== {} [{}] ==", title, view.label())];
        if events.is_empty() {
            lines.push(format!("  {}", empty_message));
        } else {
            lines.extend(events.iter().map(|event| self.card(event)));
        }
        self.write_lines(&lines);
    }

    fn render_error(&self, message: &str) {
        self.write_lines(&[
            format!("Error loading events: {}", message),
            "  (retry available)".to_string(),
        ]);
    }

    fn show_details(&self, event: &Event) {
        let start = self.local(&event.start);
        let end = self.local(&event.end);

        let mut lines = vec![
            format!("-- {} --", event.title),
            format!("  Category: {}", event.category),
            format!("  Date: {}", start.format("%A, %B %-d, %Y")),
            format!(
                "  Time: {} - {} ({})",
                start.format("%H:%M"),
                end.format("%H:%M"),
                format_duration(event.duration())
            ),
        ];
        if !event.location.is_empty() {
            lines.push(format!("  Location: {}", event.location));
        }
        if !event.description.is_empty() {
            lines.push(format!("  Description: {}", event.description));
        }
        self.write_lines(&lines);
    }

    fn hide_details(&self) {
        self.write_lines(&["-- details closed --".to_string()]);
    }

    fn apply_theme(&self, theme: Theme) {
        self.write_lines(&[format!("(theme: {})", theme)]);
    }

    fn register_handlers(&self, handlers: Arc<dyn WidgetHandlers>) {
        *self.handlers.lock().unwrap_or_else(PoisonError::into_inner) = Some(handlers);
    }
}
