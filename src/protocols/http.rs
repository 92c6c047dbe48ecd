//! # Upstream Relay
//!
//! Forwards one request to the upstream repository service and relays the
//! answer. The relay:
//! - performs exactly one fetch, with no retries
//! - never follows redirects, so a 3xx reaches the caller with its `Location`
//! - streams the response body instead of buffering it
//! - passes the inbound body stream through unmodified for methods other than
//!   `GET`/`HEAD`
//! - re-sanitizes the upstream response headers
//!
//! The actual I/O sits behind [`UpstreamTransport`] so the gateway can be
//! driven without a network.
//!
//! ## Rust Concepts Used
//!
//! - `async_trait` for the object-safe transport seam
//! - `Arc<dyn UpstreamTransport>` to share one client across handlers
//! - Streams (`bytes_stream`, `into_data_stream`) to move bodies chunk by chunk

use crate::core::config::UpstreamSettings;
use crate::core::error::{GatewayError, GatewayResult};
use crate::protocols::headers::sanitize;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method},
    response::Response,
};
use tracing::{debug, instrument, warn};
use url::Url;

/// A request ready to be sent upstream
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl UpstreamRequest {
    /// Build a request from an already-sanitized header set
    ///
    /// The body is only kept for methods that carry one.
    pub fn new(method: Method, url: &str, headers: HeaderMap, body: Body) -> GatewayResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| crate::config_error!("invalid upstream URL '{}': {}", url, e))?;
        let body = (method != Method::GET && method != Method::HEAD).then_some(body);
        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }
}

/// The `fetch(request) -> response` capability
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// Send the request and return the upstream response as soon as its
    /// headers arrive; the body may still be streaming
    async fn fetch(&self, request: UpstreamRequest) -> GatewayResult<Response>;
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport from upstream settings
    pub fn new(settings: &UpstreamSettings) -> GatewayResult<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(settings.user_agent.clone());

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| crate::config_error!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamTransport for ReqwestTransport {
    async fn fetch(&self, request: UpstreamRequest) -> GatewayResult<Response> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = builder.send().await?;

        let mut response = Response::builder().status(upstream.status());
        if let Some(headers) = response.headers_mut() {
            *headers = upstream.headers().clone();
        }

        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| GatewayError::upstream(format!("invalid upstream response: {}", e)))
    }
}

/// Forward a request and relay the response with sanitized headers
///
/// Upstream error statuses are returned as ordinary responses; only a failed
/// fetch becomes an error.
#[instrument(skip(transport, request), fields(method = %request.method, url = %request.url))]
pub async fn forward(
    transport: &dyn UpstreamTransport,
    request: UpstreamRequest,
) -> GatewayResult<Response> {
    let response = transport.fetch(request).await.map_err(|e| {
        warn!(error = %e, "Upstream fetch failed");
        match e {
            GatewayError::UpstreamTransport { .. } => e,
            other => GatewayError::upstream(other.to_string()),
        }
    })?;

    let (mut parts, body) = response.into_parts();
    parts.headers = sanitize(&parts.headers);

    debug!(status = parts.status.as_u16(), "Relaying upstream response");

    Ok(Response::from_parts(parts, body))
}
