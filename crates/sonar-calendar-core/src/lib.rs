//! Core types: events, view modes, time windows, view filtering

pub mod event;
pub mod filter;
pub mod time;
pub mod tracing;
pub mod view;

pub use event::Event;
pub use filter::{filter_events, is_visible, view_window};
pub use time::{TimeWindow, add_months, start_of_week, to_local};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use view::{ParseNameError, Theme, ViewMode};
