//! Error types for event data sources.
//!
//! Every failure a data source can produce (transport, HTTP status, missing
//! embedded element, malformed payload) is normalized into [`ApiError`]
//! before it reaches the controller.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// The category of a data source error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Connection failed, timed out, or DNS resolution failed.
    Network,
    /// The endpoint answered with a non-2xx status.
    Http,
    /// The embedded data element does not exist.
    NotFound,
    /// The payload is empty or not valid JSON.
    Parse,
    /// Unexpected failure inside the source itself.
    Internal,
}

impl ApiErrorKind {
    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Http)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network_error",
            Self::Http => "http_error",
            Self::NotFound => "not_found",
            Self::Parse => "parse_error",
            Self::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while fetching event data.
///
/// `status` follows the HTTP convention: the response status for
/// [`ApiErrorKind::Http`], `0` for network failures and `500` otherwise.
#[derive(Debug, Error)]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: u16,
    details: BTreeMap<String, String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ApiError {
    /// Creates a new error with the status implied by `kind`.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        let status = match kind {
            ApiErrorKind::Network => 0,
            _ => 500,
        };
        Self {
            kind,
            message: message.into(),
            status,
            details: BTreeMap::new(),
            source: None,
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    /// Creates an HTTP status error.
    pub fn http(status: u16) -> Self {
        let mut err = Self::new(
            ApiErrorKind::Http,
            format!("HTTP error! status: {}", status),
        );
        err.status = status;
        err
    }

    /// Creates an error for a missing embedded data element.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    /// Creates a payload parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, message)
    }

    /// Records where the error happened (e.g. the source name).
    pub fn with_context(self, context: impl Into<String>) -> Self {
        self.with_detail("context", context)
    }

    /// Attaches an extra key/value detail.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    /// Returns the `context` detail, if set.
    pub fn context(&self) -> Option<&str> {
        self.details.get("context").map(String::as_str)
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A specialized Result type for data source operations.
pub type ApiResult<T> = Result<T, ApiError>;
