//! Retry policy engine
//!
//! Decides, per request, whether a classified failure is retried and how
//! long to wait first. Delays grow exponentially from the policy's base
//! delay, carry +/-20% random jitter, and are capped at [`MAX_BACKOFF`].

use super::classify::{ClassifiedError, ErrorCode};
use super::request::RequestMetadata;
use once_cell::sync::Lazy;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on any single backoff wait
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Jitter amplitude as a fraction of the uncapped delay
pub const JITTER_FACTOR: f64 = 0.2;

/// Default retry budget
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Codes the default rule will retry when a status is present or absent
const RETRYABLE_CODES: [ErrorCode; 5] = [
    ErrorCode::NetworkError,
    ErrorCode::InternalServerError,
    ErrorCode::BadGateway,
    ErrorCode::ServiceUnavailable,
    ErrorCode::GatewayTimeout,
];

/// Caller-supplied predicate replacing the default retry rule
pub type RetryCondition = Arc<dyn Fn(&ClassifiedError) -> bool + Send + Sync>;

static DEFAULT_POLICY: Lazy<RetryPolicy> = Lazy::new(RetryPolicy::default);

/// The process-wide default policy. Config fields left unset fall back to
/// it, so a dispatch naming no policy runs with these values.
pub fn default_policy() -> &'static RetryPolicy {
    &DEFAULT_POLICY
}

/// Retry configuration for a dispatch
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Base delay before the first retry
    pub retry_delay: Duration,
    /// When set, used instead of the default rule
    pub retry_condition: Option<RetryCondition>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("has_retry_condition", &self.retry_condition.is_some())
            .finish()
    }
}

/// Outcome of the deciding step
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Wait `delay`, then attempt again with `next`
    Retry {
        delay: Duration,
        next: RequestMetadata,
    },
    /// Terminal failure
    Stop(StopReason),
}

/// Why a failure became terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Retry budget used up
    Exhausted,
    /// The default rule or the custom condition refused
    NotRetryable,
    /// The caller cancelled the request
    Cancelled,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
            retry_condition: None,
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(0, DEFAULT_RETRY_DELAY)
    }

    /// Replace the default retry rule with `condition`
    #[must_use]
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ClassifiedError) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Some(Arc::new(condition));
        self
    }

    /// Whether `error` qualifies for a retry, ignoring the budget
    pub fn allows_retry(&self, error: &ClassifiedError) -> bool {
        if error.is_cancelled() {
            return false;
        }
        match &self.retry_condition {
            Some(condition) => condition(error),
            None => should_retry(error),
        }
    }

    /// Decide what happens after `error` on the attempt described by `meta`
    pub fn decide(&self, error: &ClassifiedError, meta: &RequestMetadata) -> RetryDecision {
        if error.is_cancelled() {
            return RetryDecision::Stop(StopReason::Cancelled);
        }
        if !self.allows_retry(error) {
            return RetryDecision::Stop(StopReason::NotRetryable);
        }
        if meta.retry_count >= self.max_retries {
            return RetryDecision::Stop(StopReason::Exhausted);
        }
        RetryDecision::Retry {
            delay: self.backoff_delay(meta.retry_count),
            next: meta.next_attempt(),
        }
    }

    /// Jittered delay before the retry that follows attempt `retry_count`
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let sample = rand::thread_rng().gen_range(-1.0..=1.0);
        jittered_delay(self.retry_delay, retry_count, sample)
    }
}

/// `min(base * 2^retry_count * (1 + 0.2 * sample), 30s)`, never negative.
///
/// `sample` is the uniform draw in `[-1, 1]`; values outside are clamped.
pub fn jittered_delay(base: Duration, retry_count: u32, sample: f64) -> Duration {
    let exponent = retry_count.min(64) as i32;
    let uncapped = base.as_millis() as f64 * 2f64.powi(exponent);
    let jitter = uncapped * JITTER_FACTOR * sample.clamp(-1.0, 1.0);
    let cap = MAX_BACKOFF.as_millis() as f64;
    let millis = (uncapped + jitter).clamp(0.0, cap);
    Duration::from_millis(millis.round() as u64)
}

/// Default retry rule.
///
/// - no response at all: retry network failures only
/// - 401 / 403 and every other 4xx: never
/// - anything else: only codes in the retryable set
pub fn should_retry(error: &ClassifiedError) -> bool {
    match error.status {
        None => error.is_network(),
        Some(401 | 403) => false,
        Some(400..=499) => false,
        Some(_) => RETRYABLE_CODES.contains(&error.code),
    }
}

/// True when the error means the session is no longer valid
pub fn is_critical(error: &ClassifiedError) -> bool {
    matches!(error.status, Some(401 | 403))
        || matches!(error.code, ErrorCode::Unauthorized | ErrorCode::Forbidden)
}
