//! # Error Handling Module
//!
//! Every failure the gateway can produce is one variant of [`GatewayError`].
//! The entry point matches on the variant to pick the HTTP status, and the
//! `IntoResponse` impl renders the uniform `{ "ok": false, "error": ... }` body
//! so no handler has to shape errors by hand.
//!
//! ## Error Kinds
//!
//! | Variant             | Status | Raised by                                     |
//! |---------------------|--------|-----------------------------------------------|
//! | `Configuration`     | 500    | alias resolution, config overrides/validation |
//! | `RouteNotFound`     | 404    | route dispatcher                              |
//! | `MethodNotAllowed`  | 405    | route dispatcher (adds `Allow`)               |
//! | `InvalidArgument`   | 400    | URL builder, path decoding                    |
//! | `UpstreamTransport` | 502    | upstream relay when the fetch itself fails    |
//!
//! Upstream HTTP error statuses are not errors here: they are relayed verbatim.
//! The remaining variants only occur during startup: `Io` and `Yaml` while
//! loading the config file, `Server` when binding or serving the listener.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the gateway
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Value of the `Allow` header sent with every 405 response
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Error types for the gateway
///
/// The `Display` text of each variant is exactly what the caller sees in the
/// `error` field of the JSON body, so messages must never contain secrets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Missing or invalid alias configuration, or an invalid config file
    #[error("{message}")]
    Configuration { message: String },

    /// The request path does not address any configured alias
    #[error("not found: {path}")]
    RouteNotFound { path: String },

    /// The route exists but does not accept the request method
    #[error("method {method} not allowed")]
    MethodNotAllowed { method: String },

    /// A required request argument is missing or malformed
    #[error("{message}")]
    InvalidArgument { message: String },

    /// The forwarding fetch failed before any upstream response arrived
    #[error("upstream request failed: {message}")]
    UpstreamTransport { message: String },

    /// I/O errors while reading configuration
    #[error("I/O error: {message}")]
    Io { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },

    /// Listener bind or serve failures
    #[error("server error: {message}")]
    Server { message: String },
}

impl GatewayError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a route-not-found error for the given request path
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Create a method-not-allowed error
    pub fn method_not_allowed<S: Into<String>>(method: S) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }

    /// Create an invalid argument error with a custom message
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an upstream transport error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::UpstreamTransport {
            message: message.into(),
        }
    }

    /// Create a server error with a custom message
    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamTransport { .. } => StatusCode::BAD_GATEWAY,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a string representation of the error type for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::RouteNotFound { .. } => "route_error",
            Self::MethodNotAllowed { .. } => "method_error",
            Self::InvalidArgument { .. } => "argument_error",
            Self::UpstreamTransport { .. } => "upstream_transport_error",
            Self::Io { .. } => "io_error",
            Self::Yaml { .. } => "yaml_error",
            Self::Server { .. } => "server_error",
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::UpstreamTransport {
            message: err.to_string(),
        }
    }
}

/// Build a JSON response that intermediaries must not cache
pub fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Renders `{ "ok": false, "error": <message> }` with the variant's status.
///
/// A 405 additionally carries `Allow: GET, HEAD`.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = json_response(
            status,
            json!({
                "ok": false,
                "error": self.to_string(),
            }),
        );

        if let Self::MethodNotAllowed { .. } = self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }

        response
    }
}

/// Convenience macro for creating configuration errors
///
/// Usage: `config_error!("missing {}", key)`
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::core::error::GatewayError::config(format!($($arg)*))
    };
}
