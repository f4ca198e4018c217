//! Error classification
//!
//! Turns any failure raised while performing a call into a
//! [`ClassifiedError`]: a stable, taxonomy-tagged value that the retry
//! engine and the caller can reason about without knowing which layer the
//! failure came from.
//!
//! Classification is a pure function of the raw failure and a
//! [`MessageCatalog`]; it never performs I/O.

use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Taxonomy
// ============================================================================

/// Taxonomy identifier of a classified error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request was sent but no response arrived
    NetworkError,
    /// Failure while building the request, before transmission
    RequestConfigError,
    /// Non-transport runtime fault (e.g. an undecodable body)
    GenericError,
    /// Nothing else matched
    UnknownError,
    /// Caller cancelled the request
    Cancelled,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    UnprocessableEntity,
    TooManyRequests,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    /// Any status outside the fixed table, rendered `HTTP_<status>`
    Http(u16),
}

impl ErrorCode {
    /// Map an HTTP status onto the fixed table
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::BadRequest,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            422 => ErrorCode::UnprocessableEntity,
            429 => ErrorCode::TooManyRequests,
            500 => ErrorCode::InternalServerError,
            502 => ErrorCode::BadGateway,
            503 => ErrorCode::ServiceUnavailable,
            504 => ErrorCode::GatewayTimeout,
            other => ErrorCode::Http(other),
        }
    }

    /// Wire name of the code
    pub fn name(&self) -> Cow<'static, str> {
        let fixed = match self {
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::RequestConfigError => "REQUEST_CONFIG_ERROR",
            ErrorCode::GenericError => "GENERIC_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            ErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::BadGateway => "BAD_GATEWAY",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::GatewayTimeout => "GATEWAY_TIMEOUT",
            ErrorCode::Http(status) => return Cow::Owned(format!("HTTP_{status}")),
        };
        Cow::Borrowed(fixed)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Stable output of classification
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{code}: {message}")]
pub struct ClassifiedError {
    /// Human-readable message
    pub message: String,
    /// HTTP status, present only when a response was received
    pub status: Option<u16>,
    pub code: ErrorCode,
    /// Raw server payload or failure context
    pub details: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

impl ClassifiedError {
    /// Create an error stamped now
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code,
            details: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    /// The error a dispatch resolves with after `CancellationHandle::cancel`
    pub fn cancelled(reason: Option<&str>) -> Self {
        let message = reason.map_or_else(|| "Request cancelled".to_string(), str::to_string);
        Self::new(ErrorCode::Cancelled, message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }

    /// True when no response was received at all
    pub fn is_network(&self) -> bool {
        self.code == ErrorCode::NetworkError
    }
}

// ============================================================================
// Raw Failures
// ============================================================================

/// What kind of "no response" failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFailureKind {
    Timeout,
    Connect,
    Other,
}

/// Any failure raised during a call, before classification
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// The far end replied with a non-2xx status
    Response {
        status: u16,
        body: Option<JsonValue>,
    },
    /// Request sent, no response (DNS, timeout, connection reset)
    NoResponse {
        kind: NetworkFailureKind,
        message: String,
    },
    /// Failed while building the request
    RequestConfig { message: Option<String> },
    /// Generic runtime fault unrelated to the transport
    Runtime { message: String },
    Unknown,
}

impl RawFailure {
    /// Build a response failure from a raw body; JSON bodies are kept
    /// structured, anything else is kept as a string.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(serde_json::from_slice(body).unwrap_or_else(|_| {
                JsonValue::String(String::from_utf8_lossy(body).into_owned())
            }))
        };
        RawFailure::Response { status, body }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        RawFailure::Runtime {
            message: message.into(),
        }
    }

    pub fn request_config(message: impl Into<String>) -> Self {
        RawFailure::RequestConfig {
            message: Some(message.into()),
        }
    }
}

impl From<reqwest::Error> for RawFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return RawFailure::request_config(err.to_string());
        }
        if let Some(status) = err.status() {
            return RawFailure::Response {
                status: status.as_u16(),
                body: None,
            };
        }
        let kind = if err.is_timeout() {
            Some(NetworkFailureKind::Timeout)
        } else if err.is_connect() {
            Some(NetworkFailureKind::Connect)
        } else if err.is_request() || err.is_body() {
            Some(NetworkFailureKind::Other)
        } else {
            None
        };
        match kind {
            Some(kind) => RawFailure::NoResponse {
                kind,
                message: err.to_string(),
            },
            None => RawFailure::runtime(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RawFailure {
    fn from(err: serde_json::Error) -> Self {
        RawFailure::runtime(format!("Failed to decode response: {err}"))
    }
}

// ============================================================================
// Message Catalog
// ============================================================================

/// Keys the classifier asks the string table for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Status(u16),
    Network,
    RequestConfig,
    Unknown,
}

/// Source of translated user-facing messages
pub trait MessageCatalog: Send + Sync {
    /// Translated text for `key`, if the table has one
    fn lookup(&self, key: MessageKey) -> Option<String>;
}

/// Built-in English string table
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessages;

impl MessageCatalog for DefaultMessages {
    fn lookup(&self, key: MessageKey) -> Option<String> {
        let text = match key {
            MessageKey::Status(400) => "The request was invalid",
            MessageKey::Status(401) => "Your session has expired, please sign in again",
            MessageKey::Status(403) => "You do not have permission to perform this action",
            MessageKey::Status(404) => "The requested resource was not found",
            MessageKey::Status(409) => "The resource was modified by someone else",
            MessageKey::Status(422) => "Some fields are invalid",
            MessageKey::Status(429) => "Too many requests, please slow down",
            MessageKey::Status(500) => "The server encountered an error",
            MessageKey::Status(502) => "The server is unreachable (bad gateway)",
            MessageKey::Status(503) => "The service is temporarily unavailable",
            MessageKey::Status(504) => "The server took too long to respond",
            MessageKey::Status(_) => return None,
            MessageKey::Network => "Network error, check your connection",
            MessageKey::RequestConfig => "The request could not be prepared",
            MessageKey::Unknown => "An unexpected error occurred",
        };
        Some(text.to_string())
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Body fields checked, in order, for a server-supplied message
const MESSAGE_FIELDS: [&str; 3] = ["message", "error", "msg"];

/// Classifies raw failures against a message catalog
#[derive(Clone)]
pub struct ErrorClassifier {
    catalog: Arc<dyn MessageCatalog>,
}

impl ErrorClassifier {
    pub fn new(catalog: Arc<dyn MessageCatalog>) -> Self {
        Self { catalog }
    }

    /// Classify one raw failure. First matching rule wins.
    pub fn classify(&self, raw: RawFailure) -> ClassifiedError {
        match raw {
            RawFailure::Response { status, body } => {
                let message = body
                    .as_ref()
                    .and_then(body_message)
                    .or_else(|| self.catalog.lookup(MessageKey::Status(status)))
                    .unwrap_or_else(|| format!("Request failed with status {status}"));
                let mut err = ClassifiedError::new(ErrorCode::from_status(status), message)
                    .with_status(status);
                err.details = body;
                err
            }
            RawFailure::NoResponse { kind, message } => ClassifiedError::new(
                ErrorCode::NetworkError,
                self.text(MessageKey::Network, "Network error"),
            )
            .with_details(serde_json::json!({ "kind": kind, "cause": message })),
            RawFailure::RequestConfig { message } => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| self.text(MessageKey::RequestConfig, "Request error"));
                ClassifiedError::new(ErrorCode::RequestConfigError, message)
            }
            RawFailure::Runtime { message } => {
                ClassifiedError::new(ErrorCode::GenericError, message)
            }
            RawFailure::Unknown => ClassifiedError::new(
                ErrorCode::UnknownError,
                self.text(MessageKey::Unknown, "Unknown error"),
            ),
        }
    }

    fn text(&self, key: MessageKey, fallback: &str) -> String {
        self.catalog
            .lookup(key)
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(Arc::new(DefaultMessages))
    }
}

impl fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClassifier").finish_non_exhaustive()
    }
}

/// Classify with the built-in English catalog
pub fn classify(raw: RawFailure) -> ClassifiedError {
    ErrorClassifier::default().classify(raw)
}

fn body_message(body: &JsonValue) -> Option<String> {
    let obj = body.as_object()?;
    MESSAGE_FIELDS.iter().find_map(|field| {
        obj.get(*field)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}
