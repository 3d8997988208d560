//! Embedded document data source.
//!
//! Reads a JSON array of raw records from an element of the host document,
//! addressed by a selector. The host exposes its document through the
//! [`Document`] trait; [`StaticDocument`] is an in-memory implementation for
//! hosts without a DOM (the CLI, tests).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::source::{BoxFuture, DataSource, FetchFilters};

/// Content of a document element.
///
/// Form controls expose a `value`; other elements only have text content.
/// When a value is present it takes precedence over the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementContent {
    pub value: Option<String>,
    pub text: String,
}

impl ElementContent {
    /// Content of a plain element (e.g. a `<script type="application/json">`).
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: None,
            text: text.into(),
        }
    }

    /// Content of a form control with a value.
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            text: String::new(),
        }
    }

    /// The data the element carries: its value if set, else its text.
    pub fn data(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }
}

/// Read access to the host document.
pub trait Document: Send + Sync {
    /// Returns the content of the first element matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<ElementContent>;
}

/// An in-memory document keyed by exact selector strings.
#[derive(Debug, Clone, Default)]
pub struct StaticDocument {
    elements: HashMap<String, ElementContent>,
}

impl StaticDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to register an element.
    pub fn with_element(mut self, selector: impl Into<String>, content: ElementContent) -> Self {
        self.insert(selector, content);
        self
    }

    /// Registers or replaces an element.
    pub fn insert(&mut self, selector: impl Into<String>, content: ElementContent) {
        self.elements.insert(selector.into(), content);
    }
}

impl Document for StaticDocument {
    fn query_selector(&self, selector: &str) -> Option<ElementContent> {
        self.elements.get(selector).cloned()
    }
}

/// Reads events from an element of the host document.
///
/// Filters are ignored: the embedded payload is always returned whole.
pub struct EmbeddedSource {
    document: Arc<dyn Document>,
    selector: String,
}

impl EmbeddedSource {
    pub fn new(document: Arc<dyn Document>, selector: impl Into<String>) -> Self {
        Self {
            document,
            selector: selector.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    fn read(&self) -> ApiResult<serde_json::Value> {
        let element = self.document.query_selector(&self.selector).ok_or_else(|| {
            ApiError::not_found(format!("No element found with selector: {}", self.selector))
        })?;

        let data = element.data();
        if data.trim().is_empty() {
            return Err(ApiError::parse("No data found in the specified element"));
        }

        debug!(selector = %self.selector, bytes = data.len(), "reading embedded events");
        serde_json::from_str(data).map_err(|e| {
            ApiError::parse(format!("Invalid JSON in embedded data: {}", e)).with_source(e)
        })
    }
}

impl std::fmt::Debug for EmbeddedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedSource")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl DataSource for EmbeddedSource {
    fn name(&self) -> &str {
        "embedded"
    }

    fn fetch(&self, _filters: &FetchFilters) -> BoxFuture<'_, ApiResult<serde_json::Value>> {
        let result = self.read().map_err(|e| {
            e.with_context(self.name())
                .with_detail("selector", self.selector.as_str())
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use serde_json::json;

    fn source_with(content: ElementContent) -> EmbeddedSource {
        let document = StaticDocument::new().with_element("#calendar-data", content);
        EmbeddedSource::new(Arc::new(document), "#calendar-data")
    }

    #[tokio::test]
    async fn reads_text_content() {
        let source = source_with(ElementContent::text(
            r#"[{"id":"dom-1","title":"DOM Event","start":"2025-05-10T14:00:00Z"}]"#,
        ));

        let payload = source.fetch(&FetchFilters::new()).await.unwrap();
        assert_eq!(payload[0]["title"], json!("DOM Event"));
    }

    #[tokio::test]
    async fn value_takes_precedence_over_text() {
        let source = source_with(ElementContent {
            value: Some(r#"[{"id":"from-value"}]"#.to_string()),
            text: r#"[{"id":"from-text"}]"#.to_string(),
        });

        let payload = source.fetch(&FetchFilters::new()).await.unwrap();
        assert_eq!(payload[0]["id"], json!("from-value"));
    }

    #[tokio::test]
    async fn missing_element_is_not_found() {
        let source = EmbeddedSource::new(Arc::new(StaticDocument::new()), "#nope");
        let err = source.fetch(&FetchFilters::new()).await.unwrap_err();

        assert_eq!(err.kind(), ApiErrorKind::NotFound);
        assert_eq!(err.message(), "No element found with selector: #nope");
        assert_eq!(err.context(), Some("embedded"));
    }

    #[tokio::test]
    async fn empty_content_is_parse_error() {
        let source = source_with(ElementContent::text("   \n"));
        let err = source.fetch(&FetchFilters::new()).await.unwrap_err();

        assert_eq!(err.kind(), ApiErrorKind::Parse);
        assert_eq!(err.message(), "No data found in the specified element");
    }

    #[tokio::test]
    async fn empty_value_does_not_fall_back_to_text() {
        let source = source_with(ElementContent {
            value: Some(String::new()),
            text: "[]".to_string(),
        });
        let err = source.fetch(&FetchFilters::new()).await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Parse);
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error() {
        let source = source_with(ElementContent::text("[{\"id\": }"));
        let err = source.fetch(&FetchFilters::new()).await.unwrap_err();

        assert_eq!(err.kind(), ApiErrorKind::Parse);
        assert!(err.message().starts_with("Invalid JSON in embedded data"));
    }

    #[tokio::test]
    async fn ignores_filters() {
        let source = source_with(ElementContent::value("[]"));
        let filters = FetchFilters::new().with_param("startDate", "2030-01-01");
        assert_eq!(source.fetch(&filters).await.unwrap(), json!([]));
    }
}
