//! Logger collaborator
//!
//! The dispatcher reports each attempt, each retry and each terminal
//! failure through [`RequestLogger`]. [`TracingLogger`] forwards these to
//! `tracing` with structured fields; applications may plug in their own.

use crate::types::Method;
use serde::Serialize;

pub const MSG_ATTEMPT: &str = "dispatching request";
pub const MSG_SUCCEEDED: &str = "request succeeded";
pub const MSG_RETRY: &str = "retrying request";
pub const MSG_EXHAUSTED: &str = "retries exhausted";
pub const MSG_FAILED: &str = "request failed";
pub const MSG_CANCELLED: &str = "request cancelled";

/// Structured context attached to every log call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogContext {
    pub method: Method,
    pub url: String,
    /// 1-based attempt number
    pub attempt: u32,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Backoff before the next attempt, on retry
    pub delay_ms: Option<u64>,
    pub code: Option<String>,
    pub status: Option<u16>,
    pub elapsed_ms: i64,
}

/// Sink for dispatcher log events. Delivery is best-effort.
pub trait RequestLogger: Send + Sync {
    fn info(&self, message: &str, context: &LogContext);
    fn warn(&self, message: &str, context: &LogContext);
    fn error(&self, message: &str, context: &LogContext);
}

/// Default logger emitting `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn info(&self, message: &str, ctx: &LogContext) {
        tracing::info!(
            method = %ctx.method,
            url = %ctx.url,
            attempt = ctx.attempt,
            max_retries = ctx.max_retries,
            elapsed_ms = ctx.elapsed_ms,
            "{message}"
        );
    }

    fn warn(&self, message: &str, ctx: &LogContext) {
        tracing::warn!(
            method = %ctx.method,
            url = %ctx.url,
            attempt = ctx.attempt,
            retry_count = ctx.retry_count,
            max_retries = ctx.max_retries,
            delay_ms = ?ctx.delay_ms,
            code = ?ctx.code,
            status = ?ctx.status,
            "{message}"
        );
    }

    fn error(&self, message: &str, ctx: &LogContext) {
        tracing::error!(
            method = %ctx.method,
            url = %ctx.url,
            attempt = ctx.attempt,
            retry_count = ctx.retry_count,
            code = ?ctx.code,
            status = ?ctx.status,
            elapsed_ms = ctx.elapsed_ms,
            "{message}"
        );
    }
}
