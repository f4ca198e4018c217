//! HTTP resilience layer
//!
//! Issues outbound requests, classifies failures into a stable taxonomy,
//! decides whether and how to retry, and exposes a cancellable handle.
//!
//! # Features
//!
//! - **Error Classification**: every failure becomes a [`ClassifiedError`]
//! - **Automatic Retries**: exponential backoff with +/-20% jitter, capped at 30s
//! - **Retry Policy**: 4xx never retried; network and gateway failures are
//! - **Cancellation**: a [`CancellationHandle`] aborts the call or the wait
//! - **Authentication**: bearer credential resolved before every attempt

mod cancel;
mod classify;
mod dispatcher;
mod logger;
mod request;
mod retry;
mod transport;

pub use cancel::CancellationHandle;
pub use classify::{
    classify, ClassifiedError, DefaultMessages, ErrorClassifier, ErrorCode, MessageCatalog,
    MessageKey, NetworkFailureKind, RawFailure,
};
pub use dispatcher::{DispatchResult, Dispatcher};
pub use logger::{
    LogContext, RequestLogger, TracingLogger, MSG_ATTEMPT, MSG_CANCELLED, MSG_EXHAUSTED,
    MSG_FAILED, MSG_RETRY, MSG_SUCCEEDED,
};
pub use request::{OutboundRequest, RequestMetadata};
pub use retry::{
    default_policy, is_critical, jittered_delay, should_retry, RetryCondition, RetryDecision,
    RetryPolicy, StopReason, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, JITTER_FACTOR,
    MAX_BACKOFF,
};
pub use transport::{PreparedRequest, ReqwestTransport, Transport, TransportResponse};

#[cfg(test)]
mod tests;
