//! Response cache with TTL (Time-To-Live) support.
//!
//! [`ResponseCache`] stores raw payloads keyed by
//! [`FetchFilters::cache_key`]. [`CachedSource`] wraps any [`DataSource`] and
//! answers repeated fetches for the same filters from the cache until the
//! entry expires. Failed fetches are never cached.
//!
//! For sources that implement [`EventCatalog`], the decorator also answers
//! single-event lookups from cached event lists and keeps the category list
//! in its own slot with the same TTL. Searches always go to the source.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::ApiResult;
use crate::source::{BoxFuture, DataSource, EventCatalog, FetchFilters, find_raw_event};

/// Default TTL for cached responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// A cached payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Value,
    expires_at: Instant,
}

impl CacheEntry {
    pub fn new(payload: Value, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Returns true if the entry has expired.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Returns the time until expiration.
    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Payload cache keyed by filter set.
#[derive(Debug)]
pub struct ResponseCache {
    default_ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResponseCache {
    /// Creates a new cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: HashMap::new(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Gets a payload by key, only if not expired.
    pub fn get_valid(&self, key: &str) -> Option<&Value> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.payload)
    }

    /// Inserts or replaces a payload using the default TTL.
    pub fn insert(&mut self, key: impl Into<String>, payload: Value) {
        let ttl = self.default_ttl;
        self.insert_with_ttl(key, payload, ttl);
    }

    /// Inserts or replaces a payload with a custom TTL.
    pub fn insert_with_ttl(&mut self, key: impl Into<String>, payload: Value, ttl: Duration) {
        let key = key.into();
        debug!(key = %key, ttl_secs = ttl.as_secs(), "caching response");
        self.entries.insert(key, CacheEntry::new(payload, ttl));
    }

    /// Removes a cache entry.
    pub fn invalidate(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key);
        if entry.is_some() {
            debug!(key = %key, "invalidated cache entry");
        }
        entry
    }

    /// Clears all cache entries.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        debug!(count, "cleared response cache");
    }

    /// Removes all expired entries, returning how many were dropped.
    pub fn evict_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            let keep = !entry.is_expired();
            if !keep {
                trace!(key = %key, "evicting expired cache entry");
            }
            keep
        });
        before - self.entries.len()
    }

    /// Iterates over payloads that have not expired.
    pub fn valid_payloads(&self) -> impl Iterator<Item = &Value> {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.payload)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A [`DataSource`] decorator that caches successful responses.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    cache: Mutex<ResponseCache>,
    categories: Mutex<Option<CacheEntry>>,
}

impl<S: DataSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(ResponseCache::new(ttl)),
            categories: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached response, including the category list.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
        self.categories.lock().await.take();
    }

    async fn fetch_cached(&self, filters: FetchFilters) -> ApiResult<Value> {
        let key = filters.cache_key();

        {
            let mut cache = self.cache.lock().await;
            if let Some(payload) = cache.get_valid(&key) {
                debug!(source = self.inner.name(), key = %key, "cache hit");
                return Ok(payload.clone());
            }
            cache.evict_expired();
        }

        // The lock is released during the fetch so slow sources don't block
        // unrelated keys. Concurrent misses for the same key both fetch.
        let payload = self.inner.fetch(&filters).await?;
        self.cache.lock().await.insert(key, payload.clone());
        Ok(payload)
    }
}

impl<S: EventCatalog> CachedSource<S> {
    async fn get_event_cached(&self, id: String) -> ApiResult<Value> {
        let cached = {
            let cache = self.cache.lock().await;
            let record = cache
                .valid_payloads()
                .find_map(|payload| find_raw_event(payload, &id))
                .cloned();
            record
        };
        if let Some(record) = cached {
            debug!(source = self.inner.name(), event_id = %id, "event found in cached list");
            return Ok(record);
        }

        self.inner.get_event(&id).await
    }

    async fn categories_cached(&self) -> ApiResult<Value> {
        {
            let slot = self.categories.lock().await;
            if let Some(entry) = slot.as_ref().filter(|entry| !entry.is_expired()) {
                debug!(source = self.inner.name(), "categories cache hit");
                return Ok(entry.payload.clone());
            }
        }

        let payload = self.inner.categories().await?;
        *self.categories.lock().await = Some(CacheEntry::new(payload.clone(), self.ttl));
        Ok(payload)
    }
}

impl<S: DataSource> DataSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, filters: &FetchFilters) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(self.fetch_cached(filters.clone()))
    }
}

impl<S: EventCatalog> EventCatalog for CachedSource<S> {
    fn get_event(&self, id: &str) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(self.get_event_cached(id.to_string()))
    }

    fn categories(&self) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(self.categories_cached())
    }

    fn search_events(
        &self,
        query: &str,
        filters: &FetchFilters,
    ) -> BoxFuture<'_, ApiResult<Value>> {
        self.inner.search_events(query, filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    mod response_cache {
        use super::*;

        #[test]
        fn insert_and_get() {
            let mut cache = ResponseCache::new(Duration::from_secs(60));
            cache.insert("events:{}", json!([{"id": "e1"}]));

            assert_eq!(cache.get_valid("events:{}"), Some(&json!([{"id": "e1"}])));
            assert!(cache.get_valid("events:other").is_none());
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn expiration() {
            let mut cache = ResponseCache::new(Duration::from_millis(50));
            cache.insert("k", json!([]));

            assert!(cache.get_valid("k").is_some());
            thread::sleep(Duration::from_millis(60));
            assert!(cache.get_valid("k").is_none());
        }

        #[test]
        fn evict_expired() {
            let mut cache = ResponseCache::new(Duration::from_millis(50));
            cache.insert("short", json!([]));
            cache.insert_with_ttl("long", json!([]), Duration::from_secs(60));

            thread::sleep(Duration::from_millis(60));

            assert_eq!(cache.evict_expired(), 1);
            assert_eq!(cache.len(), 1);
            assert!(cache.get_valid("long").is_some());
        }

        #[test]
        fn invalidate_and_clear() {
            let mut cache = ResponseCache::default();
            assert_eq!(cache.default_ttl(), Duration::from_secs(300));

            cache.insert("a", json!([]));
            cache.insert("b", json!([]));
            assert!(cache.invalidate("a").is_some());
            assert!(cache.invalidate("a").is_none());

            cache.clear();
            assert!(cache.is_empty());
        }
    }

    /// Counts fetches; fails when `fail` is set.
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DataSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self, filters: &FetchFilters) -> BoxFuture<'_, ApiResult<Value>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let start = filters.get("startDate").map(str::to_string);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(ApiError::http(502))
                } else {
                    Ok(json!([{ "id": format!("call-{}", call), "start": start }]))
                }
            })
        }
    }

    /// Serves one cached-list event and a small catalog, counting lookups.
    #[derive(Default)]
    struct CatalogSource {
        lookups: AtomicUsize,
        category_calls: AtomicUsize,
        searches: AtomicUsize,
    }

    impl DataSource for CatalogSource {
        fn name(&self) -> &str {
            "catalog"
        }

        fn fetch(&self, _filters: &FetchFilters) -> BoxFuture<'_, ApiResult<Value>> {
            Box::pin(async { Ok(json!([{ "id": "e1", "title": "From list" }])) })
        }
    }

    impl EventCatalog for CatalogSource {
        fn get_event(&self, id: &str) -> BoxFuture<'_, ApiResult<Value>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let record = json!({ "id": id, "title": "From lookup" });
            Box::pin(async move { Ok(record) })
        }

        fn categories(&self) -> BoxFuture<'_, ApiResult<Value>> {
            self.category_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(json!(["meeting", "social"])) })
        }

        fn search_events(
            &self,
            query: &str,
            _filters: &FetchFilters,
        ) -> BoxFuture<'_, ApiResult<Value>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            let hits = json!([{ "id": "hit", "title": query }]);
            Box::pin(async move { Ok(hits) })
        }
    }

    mod catalog {
        use super::*;

        #[tokio::test]
        async fn get_event_prefers_cached_list() {
            let source = CachedSource::new(CatalogSource::default(), Duration::from_secs(60));

            let before = source.get_event("e1").await.unwrap();
            assert_eq!(before["title"], "From lookup");
            assert_eq!(source.inner().lookups.load(Ordering::SeqCst), 1);

            source.fetch(&FetchFilters::new()).await.unwrap();
            let cached = source.get_event("e1").await.unwrap();
            assert_eq!(cached["title"], "From list");
            assert_eq!(source.inner().lookups.load(Ordering::SeqCst), 1);

            let other = source.get_event("e9").await.unwrap();
            assert_eq!(other["id"], "e9");
            assert_eq!(source.inner().lookups.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn expired_list_is_not_searched() {
            let source = CachedSource::new(CatalogSource::default(), Duration::from_millis(20));
            source.fetch(&FetchFilters::new()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(40)).await;

            let record = source.get_event("e1").await.unwrap();
            assert_eq!(record["title"], "From lookup");
        }

        #[tokio::test]
        async fn categories_are_cached_until_cleared() {
            let source = CachedSource::new(CatalogSource::default(), Duration::from_secs(60));

            let first = source.categories().await.unwrap();
            let second = source.categories().await.unwrap();
            assert_eq!(first, json!(["meeting", "social"]));
            assert_eq!(first, second);
            assert_eq!(source.inner().category_calls.load(Ordering::SeqCst), 1);

            source.clear().await;
            source.categories().await.unwrap();
            assert_eq!(source.inner().category_calls.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn categories_expire() {
            let source = CachedSource::new(CatalogSource::default(), Duration::from_millis(20));

            source.categories().await.unwrap();
            tokio::time::sleep(Duration::from_millis(40)).await;
            source.categories().await.unwrap();

            assert_eq!(source.inner().category_calls.load(Ordering::SeqCst), 2);
        }

        #[tokio::test]
        async fn searches_bypass_cache() {
            let source = CachedSource::new(CatalogSource::default(), Duration::from_secs(60));

            let hits = source.search_events("retro", &FetchFilters::new()).await.unwrap();
            source.search_events("retro", &FetchFilters::new()).await.unwrap();

            assert_eq!(hits[0]["title"], "retro");
            assert_eq!(source.inner().searches.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test]
    async fn repeated_fetch_hits_cache() {
        let source = CachedSource::new(CountingSource::new(false), Duration::from_secs(60));
        let filters = FetchFilters::new();

        let first = source.fetch(&filters).await.unwrap();
        let second = source.fetch(&filters).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.inner().calls(), 1);
        assert_eq!(source.name(), "counting");
    }

    #[tokio::test]
    async fn different_filters_are_separate_entries() {
        let source = CachedSource::new(CountingSource::new(false), Duration::from_secs(60));

        source.fetch(&FetchFilters::new()).await.unwrap();
        source
            .fetch(&FetchFilters::new().with_param("startDate", "2025-05-01"))
            .await
            .unwrap();

        assert_eq!(source.inner().calls(), 2);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let source = CachedSource::new(CountingSource::new(false), Duration::from_millis(20));
        let filters = FetchFilters::new();

        source.fetch(&filters).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let payload = source.fetch(&filters).await.unwrap();

        assert_eq!(source.inner().calls(), 2);
        assert_eq!(payload[0]["id"], "call-2");
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let source = CachedSource::new(CountingSource::new(true), Duration::from_secs(60));
        let filters = FetchFilters::new();

        assert!(source.fetch(&filters).await.is_err());
        assert!(source.fetch(&filters).await.is_err());
        assert_eq!(source.inner().calls(), 2);
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let source = CachedSource::new(CountingSource::new(false), Duration::from_secs(60));
        let filters = FetchFilters::new();

        source.fetch(&filters).await.unwrap();
        source.clear().await;
        source.fetch(&filters).await.unwrap();

        assert_eq!(source.inner().calls(), 2);
    }
}
