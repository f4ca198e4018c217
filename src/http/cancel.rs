//! Cancellation handle for a single dispatch

use super::classify::ClassifiedError;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Caller-facing handle that aborts one in-flight or waiting request.
///
/// Cloning yields another handle to the same request. Cancelling after the
/// dispatch has already resolved has no effect on its result.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the request. The first reason given is kept.
    pub fn cancel(&self, reason: Option<&str>) {
        if let Some(reason) = reason {
            let _ = self.reason.set(reason.to_string());
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// The classified error a cancelled dispatch resolves with
    pub fn to_error(&self) -> ClassifiedError {
        ClassifiedError::cancelled(self.reason())
    }

    /// Drive `fut` unless cancelled first; cancellation drops `fut`.
    pub(crate) async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, ClassifiedError> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(self.to_error()),
            out = fut => Ok(out),
        }
    }

    /// Fail fast at an observation point
    pub(crate) fn check(&self) -> Result<(), ClassifiedError> {
        if self.is_cancelled() {
            Err(self.to_error())
        } else {
            Ok(())
        }
    }
}
