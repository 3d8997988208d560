//! DataSource trait definition.
//!
//! A [`DataSource`] hides where raw event records come from (a remote
//! endpoint, an element embedded in the host document, a test fixture)
//! behind a single asynchronous `fetch` capability. Sources return the raw
//! JSON payload; normalization is the caller's job.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// Query parameter name for the lower date bound.
pub const START_DATE_PARAM: &str = "startDate";
/// Query parameter name for the upper date bound.
pub const END_DATE_PARAM: &str = "endDate";

/// Filter parameters passed to a data source.
///
/// Remote sources serialize them as query parameters. Parameters are kept
/// sorted so that equal filters always produce the same cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFilters {
    params: BTreeMap<String, String>,
}

impl FetchFilters {
    /// Creates empty filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the `startDate` parameter.
    pub fn with_start_date(self, date: NaiveDate) -> Self {
        self.with_param(START_DATE_PARAM, date.format("%Y-%m-%d").to_string())
    }

    /// Builder method to set the `endDate` parameter.
    pub fn with_end_date(self, date: NaiveDate) -> Self {
        self.with_param(END_DATE_PARAM, date.format("%Y-%m-%d").to_string())
    }

    /// Builder method to set an arbitrary parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Key identifying this filter set in a response cache.
    pub fn cache_key(&self) -> String {
        let serialized = serde_json::to_string(&self.params).unwrap_or_default();
        format!("events:{}", serialized)
    }
}

/// A boxed future for async trait methods.
///
/// Boxing keeps [`DataSource`] object-safe so the controller can hold an
/// `Arc<dyn DataSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A provider of raw event records.
///
/// # Example Implementation
///
/// ```ignore
/// struct FixtureSource(serde_json::Value);
///
/// impl DataSource for FixtureSource {
///     fn name(&self) -> &str { "fixture" }
///
///     fn fetch(&self, _filters: &FetchFilters) -> BoxFuture<'_, ApiResult<Value>> {
///         let payload = self.0.clone();
///         Box::pin(async move { Ok(payload) })
///     }
/// }
/// ```
pub trait DataSource: Send + Sync {
    /// Short name used in logs and error context (e.g. "remote", "embedded").
    fn name(&self) -> &str;

    /// Fetches the raw payload, expected to be a JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`](crate::error::ApiError) describing transport,
    /// lookup or parse failures.
    fn fetch(&self, filters: &FetchFilters) -> BoxFuture<'_, ApiResult<serde_json::Value>>;
}

/// Lookups beyond the event list, offered by sources backed by a full
/// calendar API.
///
/// Payloads are returned raw like [`DataSource::fetch`]: a single record for
/// [`get_event`](Self::get_event), arrays for the others.
pub trait EventCatalog: DataSource {
    /// Fetches one raw event record by id.
    fn get_event(&self, id: &str) -> BoxFuture<'_, ApiResult<serde_json::Value>>;

    /// Fetches the list of event categories.
    fn categories(&self) -> BoxFuture<'_, ApiResult<serde_json::Value>>;

    /// Full-text search; `filters` are sent alongside the query.
    fn search_events(
        &self,
        query: &str,
        filters: &FetchFilters,
    ) -> BoxFuture<'_, ApiResult<serde_json::Value>>;
}

/// Finds the record whose `id` equals `id` in a raw event array.
///
/// Numeric ids match their decimal form, as they do after normalization.
pub fn find_raw_event<'a>(
    payload: &'a serde_json::Value,
    id: &str,
) -> Option<&'a serde_json::Value> {
    payload.as_array()?.iter().find(|record| match record.get("id") {
        Some(serde_json::Value::String(s)) => s == id,
        Some(serde_json::Value::Number(n)) => n.to_string() == id,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn builder_sets_date_params() {
        let filters = FetchFilters::new()
            .with_start_date(date(2025, 5, 1))
            .with_end_date(date(2025, 5, 31));

        assert_eq!(filters.get("startDate"), Some("2025-05-01"));
        assert_eq!(filters.get("endDate"), Some("2025-05-31"));
        assert!(!filters.is_empty());
    }

    #[test]
    fn cache_key_is_order_independent() {
        let a = FetchFilters::new()
            .with_param("b", "2")
            .with_param("a", "1");
        let b = FetchFilters::new()
            .with_param("a", "1")
            .with_param("b", "2");

        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), r#"events:{"a":"1","b":"2"}"#);
    }

    #[test]
    fn empty_filters_cache_key() {
        assert_eq!(FetchFilters::new().cache_key(), "events:{}");
    }

    #[test]
    fn find_raw_event_matches_string_and_numeric_ids() {
        let payload = serde_json::json!([{ "id": "a" }, { "id": 7 }, { "title": "no id" }]);

        assert_eq!(find_raw_event(&payload, "a"), Some(&payload[0]));
        assert_eq!(find_raw_event(&payload, "7"), Some(&payload[1]));
        assert!(find_raw_event(&payload, "missing").is_none());
        assert!(find_raw_event(&serde_json::json!({ "id": "a" }), "a").is_none());
    }

    #[test]
    fn iter_is_sorted() {
        let filters = FetchFilters::new()
            .with_param("z", "last")
            .with_param("m", "middle");
        let keys: Vec<_> = filters.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["m", "z"]);
    }
}
