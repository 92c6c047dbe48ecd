//! # HTTP Server Module
//!
//! The gateway entry point. Every inbound request goes through one handler
//! that composes the pieces in order:
//!
//! 1. [`Router`] turns the path into the root summary or an alias route and
//!    enforces the method restriction
//! 2. [`AliasResolver`] resolves the alias against the secret store
//! 3. the URL builder produces the upstream URL for the route
//! 4. the header sanitizer prepares the forwarded headers and token
//! 5. the relay performs the fetch and streams the response back
//!
//! Errors from any step are rendered by `GatewayError`'s `IntoResponse` impl,
//! so the process never fails because of a single request. Nothing is kept
//! between requests.
//!
//! ## Rust Concepts Used
//!
//! - `Arc<T>` for sharing the immutable server state across async tasks
//! - Axum's fallback handler to own the whole path space
//! - `tokio::net::TcpListener` with graceful shutdown

use crate::core::config::GatewayConfig;
use crate::core::error::{json_response, GatewayError, GatewayResult};
use crate::core::types::{RepositorySummary, RouteCommand};
use crate::discovery::{AliasResolver, SecretStore};
use crate::protocols::headers::forward_headers;
use crate::protocols::http::{forward, ReqwestTransport, UpstreamRequest, UpstreamTransport};
use crate::routing::url_builder::{
    append_query, build_info_url, build_listing_url, build_raw_url, build_space_url, listing_params,
};
use crate::routing::{Dispatch, Router};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Router as AxumRouter,
};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, field, info, instrument, warn, Span};
use url::form_urlencoded;
use uuid::Uuid;

/// Query parameter forwarded on the metadata route
const REVISION_PARAM: &str = "revision";

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Path dispatcher
    pub router: Arc<Router>,

    /// Alias resolver over the secret store
    pub resolver: Arc<AliasResolver>,

    /// Upstream transport
    pub transport: Arc<dyn UpstreamTransport>,

    /// Domain of Space application hosts
    pub space_domain: String,
}

impl ServerState {
    /// Build the state from configuration and collaborators
    pub fn new(
        config: &GatewayConfig,
        store: Arc<dyn SecretStore>,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Self {
        let bindings = config.alias_bindings();
        let router = Router::new(
            bindings.iter().map(|b| b.name.clone()),
            config.routes.clone(),
        );
        let resolver = AliasResolver::new(bindings, &config.upstream, store);

        Self {
            router: Arc::new(router),
            resolver: Arc::new(resolver),
            transport,
            space_domain: config.upstream.space_domain.clone(),
        }
    }
}

/// HTTP Server implementation
pub struct GatewayServer {
    /// Listener address
    bind_addr: SocketAddr,

    /// Axum application
    app: AxumRouter,
}

impl GatewayServer {
    /// Create a server using the reqwest transport
    pub fn new(config: &GatewayConfig, store: Arc<dyn SecretStore>) -> GatewayResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.upstream)?);
        Self::with_transport(config, store, transport)
    }

    /// Create a server with a custom transport
    pub fn with_transport(
        config: &GatewayConfig,
        store: Arc<dyn SecretStore>,
        transport: Arc<dyn UpstreamTransport>,
    ) -> GatewayResult<Self> {
        let bind_addr = format!("{}:{}", config.server.bind_address, config.server.http_port)
            .parse()
            .map_err(|e| crate::config_error!("Invalid bind address: {}", e))?;

        let state = ServerState::new(config, store, transport);

        Ok(Self {
            bind_addr,
            app: build_app(state),
        })
    }

    /// Listener address
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// The axum application, for embedding or tests
    pub fn app(&self) -> AxumRouter {
        self.app.clone()
    }

    /// Serve until `shutdown` completes
    #[instrument(skip(self, shutdown), fields(bind_addr = %self.bind_addr))]
    pub async fn serve<F>(self, shutdown: F) -> GatewayResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr).await.map_err(|e| {
            GatewayError::server(format!(
                "Failed to bind gateway server to {}: {}",
                self.bind_addr, e
            ))
        })?;

        info!("Gateway HTTP server listening on {}", self.bind_addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::server(format!("Gateway server error: {}", e)))
    }
}

/// Build the axum application around a state
pub fn build_app(state: ServerState) -> AxumRouter {
    AxumRouter::new()
        .fallback(handle_request)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Main request handler that processes all incoming requests
#[instrument(
    skip(state, request),
    fields(
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
        alias = field::Empty,
        route = field::Empty,
    )
)]
async fn handle_request(State(state): State<ServerState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    match proxy_request(&state, parts, body).await {
        Ok(response) => {
            debug!(status = response.status().as_u16(), "Request completed");
            response
        }
        Err(error) => {
            match error.status_code() {
                status if status.is_server_error() => {
                    warn!(error = %error, error_type = error.error_type(), "Request failed")
                }
                _ => debug!(error = %error, error_type = error.error_type(), "Request rejected"),
            }
            error.into_response()
        }
    }
}

async fn proxy_request(state: &ServerState, parts: Parts, body: Body) -> GatewayResult<Response> {
    let route = match state.router.dispatch(&parts.method, parts.uri.path())? {
        Dispatch::Root => return Ok(root_summary(state)),
        Dispatch::Proxy(route) => route,
    };

    let span = Span::current();
    span.record("alias", route.alias.as_str());
    span.record("route", route.command.name());

    let config = state.resolver.resolve(&route.alias)?;
    let base = state.resolver.base_url();
    let query = query_pairs(parts.uri.query());

    let url = match &route.command {
        RouteCommand::Info => {
            let url = build_info_url(&base, &config);
            match query.iter().find(|(key, _)| key == REVISION_PARAM) {
                Some((key, value)) => append_query(url, &[(key.as_str(), value.as_str())]),
                None => url,
            }
        }
        RouteCommand::Files { inferred_path } => {
            build_listing_url(&base, &config, &listing_params(query, inferred_path.as_deref()))
        }
        RouteCommand::Raw { path } => build_raw_url(&base, &config, path)?,
        RouteCommand::Space { path } => {
            build_space_url(&config, &state.space_domain, path, parts.uri.query())?
        }
    };

    let headers = forward_headers(&parts.headers, config.token.as_deref())?;
    let upstream = UpstreamRequest::new(parts.method, &url, headers, body)?;

    forward(state.transport.as_ref(), upstream).await
}

/// Decoded query pairs in their original order
fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// JSON status and per-alias summary for the root route
///
/// Each alias is resolved on its own; a failing alias is reported as
/// `{ "error": ... }` and never affects the others.
fn root_summary(state: &ServerState) -> Response {
    let mut aliases = Map::new();
    for (alias, result) in state.resolver.resolve_all() {
        let entry = match result {
            Ok(config) => json!(RepositorySummary::from(&config)),
            Err(error) => json!({ "error": error.to_string() }),
        };
        aliases.insert(alias.to_string(), entry);
    }

    let routes = state.router.routes();
    json_response(
        StatusCode::OK,
        json!({
            "ok": true,
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "routes": {
                "info": routes.info_command,
                "files": routes.files_command,
                "space": routes.space_command,
            },
            "aliases": Value::Object(aliases),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AliasDefinition;
    use crate::discovery::StaticSecretStore;

    fn config() -> GatewayConfig {
        GatewayConfig {
            aliases: vec![AliasDefinition::new("neuro"), AliasDefinition::new("auditor")],
            ..GatewayConfig::default()
        }
    }

    #[tokio::test]
    async fn test_server_creation() {
        let mut config = config();
        config.server.bind_address = "127.0.0.1".to_string();
        config.server.http_port = 0;

        let server = GatewayServer::new(&config, Arc::new(StaticSecretStore::new())).unwrap();
        assert_eq!(server.bind_addr().ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = config();
        config.server.bind_address = "not an address".to_string();
        let result = GatewayServer::new(&config, Arc::new(StaticSecretStore::new()));
        assert!(matches!(result, Err(GatewayError::Configuration { .. })));
    }

    #[test]
    fn test_query_pairs() {
        assert!(query_pairs(None).is_empty());
        assert_eq!(
            query_pairs(Some("path=%2Fapp&recursive=0&x=a+b")),
            vec![
                ("path".to_string(), "/app".to_string()),
                ("recursive".to_string(), "0".to_string()),
                ("x".to_string(), "a b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_root_summary_isolates_failures() {
        let store = Arc::new(StaticSecretStore::from_iter([
            ("NEURO_ID", "owner/neuro"),
            ("NEURO_TOKEN", "hf_secret"),
        ]));
        let transport = Arc::new(ReqwestTransport::new(&config().upstream).unwrap());
        let state = ServerState::new(&config(), store, transport);

        let response = root_summary(&state);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["cache-control"], "no-store");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("hf_secret"));

        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(
            value["aliases"]["neuro"],
            json!({ "repoId": "owner/neuro", "repoType": "model", "revision": "main" })
        );
        assert_eq!(value["aliases"]["auditor"], json!({ "error": "missing AUDITOR_ID" }));
    }
}
