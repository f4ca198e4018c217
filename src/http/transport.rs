//! Transport seam
//!
//! The dispatcher never talks to reqwest directly; it hands a fully
//! resolved [`PreparedRequest`] to a [`Transport`]. Production code uses
//! [`ReqwestTransport`]; tests substitute scripted transports.

use super::classify::RawFailure;
use super::request::OutboundRequest;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, StringMap};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use url::Url;

/// A request with its URL resolved against the base URL.
///
/// Built once per dispatch and replayed unchanged on every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl PreparedRequest {
    /// Resolve `request` against `base`. Absolute URLs pass through.
    pub fn resolve(request: &OutboundRequest, base: &Url) -> std::result::Result<Self, RawFailure> {
        let url = build_url(base, &request.url)?;
        Ok(Self {
            method: request.method,
            url,
            query: request.query.clone(),
            body: request.body.clone(),
        })
    }
}

fn build_url(base: &Url, path: &str) -> std::result::Result<Url, RawFailure> {
    if path.trim().is_empty() {
        return Err(RawFailure::request_config("Request URL is empty"));
    }
    let full = if has_http_scheme(path) {
        path.to_string()
    } else {
        let base = base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    };
    Url::parse(&full).map_err(|e| RawFailure::request_config(format!("Invalid URL '{full}': {e}")))
}

/// Schemes are case-insensitive, so `HTTPS://host` is absolute too
fn has_http_scheme(path: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Successful (2xx) response
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Executes a single network attempt
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` with `headers`. Non-2xx replies are returned as
    /// [`RawFailure::Response`].
    async fn send(
        &self,
        request: &PreparedRequest,
        headers: &StringMap,
    ) -> std::result::Result<TransportResponse, RawFailure>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with the config's timeout, user agent and default headers
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (key, value) in &config.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::invalid_value("default_headers", format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_value("default_headers", format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &PreparedRequest,
        headers: &StringMap,
    ) -> std::result::Result<TransportResponse, RawFailure> {
        let mut req = self
            .client
            .request(request.method.into(), request.url.clone());

        for (key, value) in headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(RawFailure::from);
        response_outcome(status, body)
    }
}

/// A non-2xx status wins over a failed body read
fn response_outcome(
    status: u16,
    body: std::result::Result<Bytes, RawFailure>,
) -> std::result::Result<TransportResponse, RawFailure> {
    let success = (200..300).contains(&status);
    match body {
        Ok(body) if success => Ok(TransportResponse { status, body }),
        Ok(body) => Err(RawFailure::from_response(status, &body)),
        Err(raw) if success => Err(raw),
        Err(_) => Err(RawFailure::Response { status, body: None }),
    }
}
