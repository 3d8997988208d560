//! Calendar widget controller, navigation bridge, renderers and CLI
//!
//! [`CalendarController`] ties the data sources of
//! `sonar-calendar-providers` to the view filtering of
//! `sonar-calendar-core`, keeps the details view in sync with the navigation
//! history and drives a [`Renderer`].

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod navigation;
pub mod render;
pub mod state;

pub use cli::Cli;
pub use config::CalendarConfig;
pub use controller::{CalendarController, CalendarOptions};
pub use error::{WidgetError, WidgetResult};
pub use navigation::{
    History, InMemoryHistory, NavigationBridge, NavigationEvent, NavigationListener,
    SubscriptionId, event_fragment, parse_event_fragment,
};
pub use render::{Renderer, TerminalRenderer, WidgetHandlers, format_duration};
pub use state::{CalendarState, LoadStatus};
