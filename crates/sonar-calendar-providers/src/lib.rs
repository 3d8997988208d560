//! Event data sources for the Sonar calendar widget.
//!
//! This crate provides the data layer underneath the widget controller:
//!
//! - [`DataSource`] - The trait every source of raw event records implements
//! - [`RemoteSource`] - Fetches a JSON array from an HTTP endpoint
//! - [`EmbeddedSource`] - Reads a JSON array embedded in the host document
//! - [`CachedSource`] - TTL cache decorator for any source
//! - [`EventCatalog`] - Single-event, category and search lookups
//! - [`normalize_events`] - Pipeline converting raw payloads to [`Event`]s
//! - [`ApiError`] - Error type for source failures
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │  HTTP endpoint  │    │  Host document  │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │  RemoteSource   │    │ EmbeddedSource  │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          │      DataSource      │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!              ┌─────────────┐
//!              │ JSON payload│
//!              └──────┬──────┘
//!                     │
//!                     ▼ normalize_events()
//!              ┌─────────────┐
//!              │  Vec<Event> │
//!              └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sonar_calendar_providers::{DataSource, FetchFilters, normalize_events};
//!
//! async fn load(source: &dyn DataSource) -> ApiResult<Vec<Event>> {
//!     let payload = source.fetch(&FetchFilters::new()).await?;
//!     Ok(normalize_events(&payload))
//! }
//! ```
//!
//! [`Event`]: sonar_calendar_core::Event

pub mod cache;
pub mod embedded;
pub mod error;
pub mod normalize;
pub mod raw_event;
#[cfg(feature = "remote")]
pub mod remote;
pub mod source;

// Re-export main types at crate root
pub use cache::{CachedSource, DEFAULT_CACHE_TTL, ResponseCache};
pub use embedded::{Document, ElementContent, EmbeddedSource, StaticDocument};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use normalize::{generate_event_id, normalize_event, normalize_events, normalize_events_at};
pub use raw_event::{RawEvent, parse_time};
#[cfg(feature = "remote")]
pub use remote::{RemoteConfig, RemoteSource, SEARCH_QUERY_PARAM};
pub use source::{
    BoxFuture, DataSource, END_DATE_PARAM, EventCatalog, FetchFilters, START_DATE_PARAM,
    find_raw_event,
};
