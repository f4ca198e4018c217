//! Request dispatcher
//!
//! Orchestrates one logical call: resolves the credential, performs the
//! attempt through the [`Transport`], classifies failures, asks the
//! [`RetryPolicy`] what to do next and loops until the call is terminal.
//!
//! Attempts for one dispatch are strictly sequential. Cancellation is
//! observed before every attempt, during the transport call, and during the
//! backoff wait; once observed, no further attempt is made.

use super::cancel::CancellationHandle;
use super::classify::{ClassifiedError, ErrorClassifier, RawFailure};
use super::logger::{
    LogContext, RequestLogger, TracingLogger, MSG_ATTEMPT, MSG_CANCELLED, MSG_EXHAUSTED,
    MSG_FAILED, MSG_RETRY, MSG_SUCCEEDED,
};
use super::request::{OutboundRequest, RequestMetadata};
use super::retry::{RetryDecision, RetryPolicy, StopReason};
use super::transport::{PreparedRequest, ReqwestTransport, Transport};
use crate::auth::{CredentialResolver, FileTokenStore, NoCredentials, StoreResolver};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::types::{JsonValue, StringMap};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const AUTHORIZATION: &str = "Authorization";

/// Outcome of a dispatch: the decoded body or the terminal classified error
pub type DispatchResult<T> = std::result::Result<T, ClassifiedError>;

/// Issues requests with retry, backoff and cancellation
pub struct Dispatcher {
    base_url: Url,
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn CredentialResolver>,
    classifier: ErrorClassifier,
    logger: Arc<dyn RequestLogger>,
    default_policy: RetryPolicy,
}

impl Dispatcher {
    /// Create a dispatcher over a reqwest transport built from `config`
    pub fn new(config: &ClientConfig, resolver: Arc<dyn CredentialResolver>) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(config, resolver, Arc::new(transport)))
    }

    /// Create a dispatcher over a custom transport
    pub fn with_transport(
        config: &ClientConfig,
        resolver: Arc<dyn CredentialResolver>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: config.base_url.clone(),
            transport,
            resolver,
            classifier: ErrorClassifier::default(),
            logger: Arc::new(TracingLogger),
            default_policy: config.retry_policy(),
        }
    }

    /// Build from the process environment; fails when no base URL is set.
    ///
    /// Credentials come from `API_TOKEN_FILE` when present.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        let resolver: Arc<dyn CredentialResolver> = match &config.token_file {
            Some(path) => Arc::new(StoreResolver::new(FileTokenStore::new(path))),
            None => Arc::new(NoCredentials),
        };
        Self::new(&config, resolver)
    }

    /// Replace the logger collaborator
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the classifier (e.g. to use a translated message catalog)
    #[must_use]
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the policy used when a dispatch names none
    #[must_use]
    pub fn with_default_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_policy(&self) -> &RetryPolicy {
        &self.default_policy
    }

    /// Start a call. The returned handle cancels it; the future resolves
    /// with the decoded body or the terminal classified error.
    ///
    /// Nothing is sent until the future is polled.
    pub fn dispatch<'a, T>(
        &'a self,
        request: OutboundRequest,
        policy: Option<RetryPolicy>,
    ) -> (CancellationHandle, BoxFuture<'a, DispatchResult<T>>)
    where
        T: DeserializeOwned + Send + 'a,
    {
        let handle = CancellationHandle::new();
        let cancel = handle.clone();
        let fut = async move { self.execute(&request, policy.as_ref(), &cancel).await }.boxed();
        (handle, fut)
    }

    /// Run a call to completion, observing `cancel`
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &OutboundRequest,
        policy: Option<&RetryPolicy>,
        cancel: &CancellationHandle,
    ) -> DispatchResult<T> {
        let policy = policy.unwrap_or(&self.default_policy);
        let mut meta = RequestMetadata::first_attempt(request);

        let prepared = match PreparedRequest::resolve(request, &self.base_url) {
            Ok(prepared) => prepared,
            Err(raw) => {
                let err = self.classifier.classify(raw);
                let ctx = self.context(request, &request.url, &meta, policy, None, Some(&err));
                self.logger.error(MSG_FAILED, &ctx);
                return Err(err);
            }
        };
        let url = prepared.url.to_string();

        loop {
            if let Err(cancelled) = cancel.check() {
                return Err(self.cancelled(request, &url, &meta, policy, cancelled));
            }

            let headers = self.attempt_headers(request);
            self.logger.info(
                MSG_ATTEMPT,
                &self.context(request, &url, &meta, policy, None, None),
            );

            let outcome = match cancel.guard(self.transport.send(&prepared, &headers)).await {
                Err(cancelled) => Err(cancelled),
                Ok(Ok(response)) => {
                    decode::<T>(&response.body).map_err(|raw| self.classifier.classify(raw))
                }
                Ok(Err(raw)) => Err(self.classifier.classify(raw)),
            };

            let error = match outcome {
                Ok(value) => {
                    self.logger.info(
                        MSG_SUCCEEDED,
                        &self.context(request, &url, &meta, policy, None, None),
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            match policy.decide(&error, &meta) {
                RetryDecision::Retry { delay, next } => {
                    meta = next;
                    self.logger.warn(
                        MSG_RETRY,
                        &self.context(request, &url, &meta, policy, Some(delay), Some(&error)),
                    );
                    if let Err(cancelled) = cancel.guard(tokio::time::sleep(delay)).await {
                        return Err(self.cancelled(request, &url, &meta, policy, cancelled));
                    }
                }
                RetryDecision::Stop(StopReason::Cancelled) => {
                    return Err(self.cancelled(request, &url, &meta, policy, error));
                }
                RetryDecision::Stop(reason) => {
                    let message = if reason == StopReason::Exhausted {
                        MSG_EXHAUSTED
                    } else {
                        MSG_FAILED
                    };
                    self.logger.error(
                        message,
                        &self.context(request, &url, &meta, policy, None, Some(&error)),
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Dispatch with the default policy and no external cancellation
    pub async fn send<T: DeserializeOwned>(&self, request: OutboundRequest) -> DispatchResult<T> {
        self.execute(&request, None, &CancellationHandle::new()).await
    }

    /// Make a GET request and parse the JSON response
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> DispatchResult<T> {
        self.send(OutboundRequest::get(url)).await
    }

    /// Make a POST request and parse the JSON response
    pub async fn post<T: DeserializeOwned>(&self, url: &str, body: JsonValue) -> DispatchResult<T> {
        self.send(OutboundRequest::post(url, body)).await
    }

    /// Make a PUT request and parse the JSON response
    pub async fn put<T: DeserializeOwned>(&self, url: &str, body: JsonValue) -> DispatchResult<T> {
        self.send(OutboundRequest::put(url, body)).await
    }

    /// Make a PATCH request and parse the JSON response
    pub async fn patch<T: DeserializeOwned>(
        &self,
        url: &str,
        body: JsonValue,
    ) -> DispatchResult<T> {
        self.send(OutboundRequest::patch(url, body)).await
    }

    /// Make a DELETE request and parse the JSON response
    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> DispatchResult<T> {
        self.send(OutboundRequest::delete(url)).await
    }

    /// Per-request headers plus the freshly resolved credential. A resolved
    /// credential replaces any caller `Authorization` header, whatever its case.
    fn attempt_headers(&self, request: &OutboundRequest) -> StringMap {
        let mut headers = request.headers.clone();
        if let Some(credential) = self.resolver.resolve() {
            headers.retain(|key, _| !key.eq_ignore_ascii_case(AUTHORIZATION));
            headers.insert(
                AUTHORIZATION.to_string(),
                credential.authorization_header(),
            );
        }
        headers
    }

    fn cancelled(
        &self,
        request: &OutboundRequest,
        url: &str,
        meta: &RequestMetadata,
        policy: &RetryPolicy,
        error: ClassifiedError,
    ) -> ClassifiedError {
        self.logger.info(
            MSG_CANCELLED,
            &self.context(request, url, meta, policy, None, Some(&error)),
        );
        error
    }

    fn context(
        &self,
        request: &OutboundRequest,
        url: &str,
        meta: &RequestMetadata,
        policy: &RetryPolicy,
        delay: Option<Duration>,
        error: Option<&ClassifiedError>,
    ) -> LogContext {
        LogContext {
            method: request.method,
            url: url.to_string(),
            attempt: meta.attempt(),
            retry_count: meta.retry_count,
            max_retries: policy.max_retries,
            delay_ms: delay.map(|d| d.as_millis() as u64),
            code: error.map(|e| e.code.to_string()),
            status: error.and_then(|e| e.status),
            elapsed_ms: meta.elapsed().num_milliseconds(),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url.as_str())
            .field("default_policy", &self.default_policy)
            .finish_non_exhaustive()
    }
}

/// Decode a 2xx body; an empty body decodes as JSON `null`
fn decode<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<T, RawFailure> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}
