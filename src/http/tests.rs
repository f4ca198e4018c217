//! Tests for the HTTP module

use super::*;
use crate::auth::{MemoryTokenStore, NoCredentials, StaticCredential, StoreResolver};
use crate::config::ClientConfig;
use crate::types::{JsonValue, Method, StringMap};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Doubles
// ============================================================================

type Reply = std::result::Result<TransportResponse, RawFailure>;

/// Replays scripted replies per URL path and records every attempt
#[derive(Default)]
struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(PreparedRequest, StringMap)>>,
    called: Notify,
    hang: bool,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    /// A transport whose calls never complete
    fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    fn script(self, path: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(path.to_string(), replies.into());
        self
    }

    fn calls(&self) -> Vec<(PreparedRequest, StringMap)> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &PreparedRequest, headers: &StringMap) -> Reply {
        self.calls
            .lock()
            .unwrap()
            .push((request.clone(), headers.clone()));
        self.called.notify_one();

        if self.hang {
            futures::future::pending::<()>().await;
        }

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(request.url.path())
            .and_then(VecDeque::pop_front);
        reply.unwrap_or(Err(RawFailure::Unknown))
    }
}

fn ok(body: JsonValue) -> Reply {
    Ok(TransportResponse {
        status: 200,
        body: Bytes::from(serde_json::to_vec(&body).unwrap()),
    })
}

fn status(code: u16) -> Reply {
    Err(RawFailure::from_response(code, b""))
}

fn connection_refused() -> Reply {
    Err(RawFailure::NoResponse {
        kind: NetworkFailureKind::Connect,
        message: "connection refused".into(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Default)]
struct RecordingLogger {
    events: Mutex<Vec<(Level, String, LogContext)>>,
}

impl RecordingLogger {
    fn with_message(&self, message: &str) -> Vec<LogContext> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m, _)| m == message)
            .map(|(_, _, ctx)| ctx.clone())
            .collect()
    }

    fn count(&self, level: Level) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _, _)| *l == level)
            .count()
    }
}

impl RequestLogger for RecordingLogger {
    fn info(&self, message: &str, context: &LogContext) {
        self.events
            .lock()
            .unwrap()
            .push((Level::Info, message.to_string(), context.clone()));
    }

    fn warn(&self, message: &str, context: &LogContext) {
        self.events
            .lock()
            .unwrap()
            .push((Level::Warn, message.to_string(), context.clone()));
    }

    fn error(&self, message: &str, context: &LogContext) {
        self.events
            .lock()
            .unwrap()
            .push((Level::Error, message.to_string(), context.clone()));
    }
}

fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .base_url("http://shop.test/api")
        .build()
        .unwrap()
}

fn scripted_dispatcher(
    transport: &Arc<ScriptedTransport>,
    logger: &Arc<RecordingLogger>,
) -> Dispatcher {
    Dispatcher::with_transport(
        &test_config(),
        Arc::new(NoCredentials),
        transport.clone() as Arc<dyn Transport>,
    )
    .with_logger(logger.clone() as Arc<dyn RequestLogger>)
}

// ============================================================================
// Dispatcher: retry semantics
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_recovers_after_three_503s() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/service-orders",
        vec![status(503), status(503), status(503), ok(json!({"id": 12}))],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let body: JsonValue = dispatcher
        .send(OutboundRequest::get("/service-orders"))
        .await
        .unwrap();

    assert_eq!(body, json!({"id": 12}));
    assert_eq!(transport.call_count(), 4);

    let retries = logger.with_message(MSG_RETRY);
    assert_eq!(retries.len(), 3);
    let counts: Vec<u32> = retries.iter().map(|c| c.retry_count).collect();
    assert_eq!(counts, vec![1, 2, 3]);
    assert!(retries
        .iter()
        .all(|c| c.code.as_deref() == Some("SERVICE_UNAVAILABLE")));
    assert_eq!(logger.with_message(MSG_ATTEMPT).len(), 4);
    assert_eq!(logger.count(Level::Error), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_fails_immediately() {
    let transport = Arc::new(
        ScriptedTransport::new().script("/api/products", vec![status(401), ok(json!({}))]),
    );
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let err = dispatcher
        .get::<JsonValue>("/products")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert_eq!(err.status, Some(401));
    assert!(is_critical(&err));
    assert_eq!(transport.call_count(), 1);
    assert!(logger.with_message(MSG_RETRY).is_empty());
    assert_eq!(logger.with_message(MSG_FAILED).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_retries() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/transactions",
        vec![status(503), status(503), status(503), status(503), ok(json!([]))],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let err = dispatcher
        .get::<JsonValue>("/transactions")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ServiceUnavailable);
    assert_eq!(err.status, Some(503));
    assert_eq!(transport.call_count(), 4);
    assert_eq!(logger.with_message(MSG_RETRY).len(), 3);

    let exhausted = logger.with_message(MSG_EXHAUSTED);
    assert_eq!(exhausted.len(), 1);
    assert_eq!(exhausted[0].retry_count, 3);
    assert_eq!(exhausted[0].attempt, 4);
}

#[tokio::test(start_paused = true)]
async fn test_network_errors_retried_until_exhausted() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![
            connection_refused(),
            connection_refused(),
            connection_refused(),
        ],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let policy = RetryPolicy::new(2, Duration::from_millis(100));
    let (_handle, fut) =
        dispatcher.dispatch::<JsonValue>(OutboundRequest::get("/products"), Some(policy));
    let err = fut.await.unwrap_err();

    assert_eq!(err.code, ErrorCode::NetworkError);
    assert_eq!(err.status, None);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_custom_condition_overrides_default_rule() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![status(429), ok(json!({"ok": true}))],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let policy = RetryPolicy::new(3, Duration::from_millis(10))
        .with_condition(|e| e.code == ErrorCode::TooManyRequests);
    let (_handle, fut) =
        dispatcher.dispatch::<JsonValue>(OutboundRequest::get("/products"), Some(policy));

    assert_eq!(fut.await.unwrap(), json!({"ok": true}));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_default_policy_comes_from_config() {
    let config = ClientConfig::builder()
        .base_url("http://shop.test/api")
        .max_retries(1)
        .retry_delay(Duration::from_millis(5))
        .build()
        .unwrap();
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![status(502), status(502), ok(json!({}))],
    ));
    let dispatcher = Dispatcher::with_transport(
        &config,
        Arc::new(NoCredentials),
        transport.clone() as Arc<dyn Transport>,
    );

    let err = dispatcher.get::<JsonValue>("/products").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BadGateway);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(dispatcher.default_policy().max_retries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_retries_replay_identical_request() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![status(500), status(504), ok(json!({"id": 1}))],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let request = OutboundRequest::post("/products", json!({"sku": "PAD-01", "qty": 4}))
        .query("branch", "north")
        .header("X-Request-Id", "r-1");
    let _: JsonValue = dispatcher.send(request).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    let (first, first_headers) = &calls[0];
    assert_eq!(first.method, Method::POST);
    assert_eq!(first.url.as_str(), "http://shop.test/api/products");
    assert_eq!(first.body, Some(json!({"sku": "PAD-01", "qty": 4})));
    for (attempt, headers) in &calls[1..] {
        assert_eq!(attempt, first);
        assert_eq!(
            serde_json::to_vec(&attempt.body).unwrap(),
            serde_json::to_vec(&first.body).unwrap()
        );
        assert_eq!(headers, first_headers);
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_keep_separate_counters() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .script("/api/a", vec![status(503), status(503), ok(json!("a"))])
            .script("/api/b", vec![ok(json!("b"))]),
    );
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let (a, b) = tokio::join!(
        dispatcher.get::<String>("/a"),
        dispatcher.get::<String>("/b")
    );
    assert_eq!(a.unwrap(), "a");
    assert_eq!(b.unwrap(), "b");

    let retries = logger.with_message(MSG_RETRY);
    assert_eq!(retries.len(), 2);
    assert!(retries.iter().all(|c| c.url.ends_with("/api/a")));

    let b_attempts: Vec<LogContext> = logger
        .with_message(MSG_ATTEMPT)
        .into_iter()
        .filter(|c| c.url.ends_with("/api/b"))
        .collect();
    assert_eq!(b_attempts.len(), 1);
    assert_eq!(b_attempts[0].retry_count, 0);
}

// ============================================================================
// Dispatcher: cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_prevents_next_attempt() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![status(503), ok(json!({}))],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let policy = RetryPolicy::new(3, Duration::from_secs(10));
    let (handle, fut) =
        dispatcher.dispatch::<JsonValue>(OutboundRequest::get("/products"), Some(policy));

    let canceller = async {
        transport.called.notified().await;
        handle.cancel(Some("user left the page"));
    };
    let (result, ()) = tokio::join!(fut, canceller);

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.message, "user left the page");
    assert_eq!(transport.call_count(), 1);
    assert_eq!(logger.with_message(MSG_CANCELLED).len(), 1);
}

#[tokio::test]
async fn test_cancel_during_transport_call() {
    let transport = Arc::new(ScriptedTransport::hanging());
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let (handle, fut) = dispatcher.dispatch::<JsonValue>(OutboundRequest::get("/slow"), None);
    let canceller = async {
        transport.called.notified().await;
        handle.cancel(None);
    };
    let (result, ()) = tokio::join!(fut, canceller);

    let err = result.unwrap_err();
    assert_eq!(err.code, ErrorCode::Cancelled);
    assert_eq!(err.message, "Request cancelled");
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_cancel_before_first_poll_sends_nothing() {
    let transport = Arc::new(ScriptedTransport::new().script("/api/products", vec![ok(json!({}))]));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let (handle, fut) = dispatcher.dispatch::<JsonValue>(OutboundRequest::get("/products"), None);
    handle.cancel(None);

    assert!(fut.await.unwrap_err().is_cancelled());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_cancel_after_completion_has_no_effect() {
    let transport = Arc::new(ScriptedTransport::new().script("/api/products", vec![ok(json!(1))]));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let (handle, fut) = dispatcher.dispatch::<u32>(OutboundRequest::get("/products"), None);
    let value = fut.await.unwrap();
    handle.cancel(Some("too late"));

    assert_eq!(value, 1);
    assert!(handle.is_cancelled());
}

// ============================================================================
// Dispatcher: credentials, decoding, request errors
// ============================================================================

#[tokio::test]
async fn test_bearer_injected_when_credential_resolves() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![ok(json!({})), ok(json!({}))],
    ));
    let store = MemoryTokenStore::new();
    let dispatcher = Dispatcher::with_transport(
        &test_config(),
        Arc::new(StoreResolver::new(store.clone())),
        transport.clone() as Arc<dyn Transport>,
    );

    let _: JsonValue = dispatcher.get("/products").await.unwrap();
    store.set(crate::auth::Credential::new("tok-123"));
    let _: JsonValue = dispatcher.get("/products").await.unwrap();

    let calls = transport.calls();
    assert!(!calls[0].1.contains_key("Authorization"));
    assert_eq!(
        calls[1].1.get("Authorization"),
        Some(&"Bearer tok-123".to_string())
    );
}

#[tokio::test]
async fn test_caller_authorization_kept_only_without_credential() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![ok(json!({})), ok(json!({}))],
    ));
    let store = MemoryTokenStore::new();
    let dispatcher = Dispatcher::with_transport(
        &test_config(),
        Arc::new(StoreResolver::new(store.clone())),
        transport.clone() as Arc<dyn Transport>,
    );
    let request = OutboundRequest::get("/products").header("AUTHORIZATION", "Bearer caller");

    let _: JsonValue = dispatcher.send(request.clone()).await.unwrap();
    store.set(crate::auth::Credential::new("tok-456"));
    let _: JsonValue = dispatcher.send(request).await.unwrap();

    let calls = transport.calls();
    assert_eq!(
        calls[0].1.get("AUTHORIZATION"),
        Some(&"Bearer caller".to_string())
    );
    let auth: Vec<_> = calls[1]
        .1
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(auth, vec!["Bearer tok-456"]);
}

#[tokio::test]
async fn test_decode_failure_is_generic_and_not_retried() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products",
        vec![ok(json!({"not": "a list"})), ok(json!([]))],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let err = dispatcher
        .get::<Vec<u32>>("/products")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::GenericError);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_empty_body_decodes_as_null() {
    let transport = Arc::new(ScriptedTransport::new().script(
        "/api/products/3",
        vec![Ok(TransportResponse {
            status: 204,
            body: Bytes::new(),
        })],
    ));
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let () = dispatcher.delete("/products/3").await.unwrap();
}

#[tokio::test]
async fn test_invalid_url_is_request_config_error() {
    let transport = Arc::new(ScriptedTransport::new());
    let logger = Arc::new(RecordingLogger::default());
    let dispatcher = scripted_dispatcher(&transport, &logger);

    let err = dispatcher
        .send::<JsonValue>(OutboundRequest::get(""))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequestConfigError);
    assert_eq!(transport.call_count(), 0);
    assert_eq!(logger.with_message(MSG_FAILED).len(), 1);
}

#[test]
fn test_dispatcher_debug() {
    let dispatcher = Dispatcher::new(&test_config(), Arc::new(NoCredentials)).unwrap();
    let debug_str = format!("{dispatcher:?}");
    assert!(debug_str.contains("Dispatcher"));
    assert!(debug_str.contains("http://shop.test/api"));
}

// ============================================================================
// Dispatcher over reqwest (wiremock)
// ============================================================================

fn wiremock_dispatcher(
    server: &MockServer,
    resolver: Arc<dyn crate::auth::CredentialResolver>,
) -> Dispatcher {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .retry_delay(Duration::from_millis(10))
        .header("X-Client", "admin-panel")
        .build()
        .unwrap();
    Dispatcher::new(&config, resolver).unwrap()
}

#[tokio::test]
async fn test_reqwest_get_with_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("Authorization", "Bearer secret"))
        .and(header("X-Client", "admin-panel"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"sku": "A"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = wiremock_dispatcher(&mock_server, Arc::new(StaticCredential::new("secret")));
    let body: JsonValue = dispatcher.get("/products").await.unwrap();
    assert_eq!(body[0]["sku"], "A");
}

#[tokio::test]
async fn test_reqwest_credential_replaces_caller_authorization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = wiremock_dispatcher(&mock_server, Arc::new(StaticCredential::new("fresh")));
    let request = OutboundRequest::get("/products").header("authorization", "Bearer stale");
    let _: JsonValue = dispatcher.send(request).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let values: Vec<_> = received[0]
        .headers
        .get_all("authorization")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["Bearer fresh".to_string()]);
}

#[tokio::test]
async fn test_reqwest_no_authorization_without_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let dispatcher = wiremock_dispatcher(&mock_server, Arc::new(NoCredentials));
    let body: JsonValue = dispatcher.get("/public").await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_reqwest_retry_on_503_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/service-orders/5"))
        .and(query_param("notify", "false"))
        .and(body_json(json!({"status": "done"})))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/service-orders/5"))
        .and(query_param("notify", "false"))
        .and(body_json(json!({"status": "done"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = wiremock_dispatcher(&mock_server, Arc::new(NoCredentials));
    let request = OutboundRequest::put("/service-orders/5", json!({"status": "done"}))
        .query("notify", "false");
    let body: JsonValue = dispatcher.send(request).await.unwrap();
    assert_eq!(body["id"], 5);
}

#[tokio::test]
async fn test_reqwest_404_message_from_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Product 999 not found"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = wiremock_dispatcher(&mock_server, Arc::new(NoCredentials));
    let err = dispatcher
        .get::<JsonValue>("/products/999")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "Product 999 not found");
    assert_eq!(err.details, Some(json!({"message": "Product 999 not found"})));
}

#[tokio::test]
async fn test_reqwest_timeout_is_network_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let dispatcher = Dispatcher::new(&config, Arc::new(NoCredentials)).unwrap();

    let (_handle, fut) = dispatcher.dispatch::<JsonValue>(
        OutboundRequest::get("/slow"),
        Some(RetryPolicy::no_retry()),
    );
    let err = fut.await.unwrap_err();

    assert_eq!(err.code, ErrorCode::NetworkError);
    assert_eq!(err.details.unwrap()["kind"], json!("timeout"));
}

#[tokio::test]
async fn test_reqwest_post_created() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(body_json(json!({"amount": 120})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 77})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = wiremock_dispatcher(&mock_server, Arc::new(NoCredentials));
    let body: JsonValue = dispatcher
        .post("/transactions", json!({"amount": 120}))
        .await
        .unwrap();
    assert_eq!(body["id"], 77);
}
