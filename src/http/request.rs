//! Outbound request description and per-attempt metadata

use crate::types::{JsonValue, Method, StringMap};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Description of one logical HTTP call.
///
/// Immutable once handed to the dispatcher: every attempt, first or retried,
/// replays exactly this method, URL, query and body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path relative to the base URL, or an absolute `http(s)://` URL
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
    /// Extra headers for this request only
    pub headers: StringMap,
    /// Caller opts out of the default error notification
    pub skip_error_notification: bool,
    /// Caller opts out of request queueing
    pub skip_queue: bool,
}

impl OutboundRequest {
    /// Create a request with no params or body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
            headers: StringMap::new(),
            skip_error_notification: false,
            skip_queue: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: JsonValue) -> Self {
        Self::new(Method::POST, url).json(body)
    }

    pub fn put(url: impl Into<String>, body: JsonValue) -> Self {
        Self::new(Method::PUT, url).json(body)
    }

    pub fn patch(url: impl Into<String>, body: JsonValue) -> Self {
        Self::new(Method::PATCH, url).json(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Suppress the default error notification for this request
    #[must_use]
    pub fn skip_error_notification(mut self) -> Self {
        self.skip_error_notification = true;
        self
    }

    /// Bypass request queueing for this request
    #[must_use]
    pub fn skip_queue(mut self) -> Self {
        self.skip_queue = true;
        self
    }
}

/// Per-attempt record threaded through the retry loop.
///
/// Owned by exactly one dispatch and passed by value; a retry produces a
/// new record via [`RequestMetadata::next_attempt`] rather than mutating a
/// shared one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestMetadata {
    pub start_time: DateTime<Utc>,
    pub retry_count: u32,
    pub skip_error_notification: bool,
    pub skip_queue: bool,
}

impl RequestMetadata {
    /// Metadata for the first attempt of `request`, stamped now
    pub fn first_attempt(request: &OutboundRequest) -> Self {
        Self {
            start_time: Utc::now(),
            retry_count: 0,
            skip_error_notification: request.skip_error_notification,
            skip_queue: request.skip_queue,
        }
    }

    /// Record for the following attempt; `start_time` is carried over
    #[must_use]
    pub fn next_attempt(&self) -> Self {
        Self {
            retry_count: self.retry_count.saturating_add(1),
            ..*self
        }
    }

    /// 1-based attempt number
    pub fn attempt(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Time since the first attempt started
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }
}
