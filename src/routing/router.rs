//! # Route Dispatcher
//!
//! Turns an inbound request path into a [`Dispatch`] decision. For a path
//! `/<alias>/<rest...>` the states are tried in order:
//!
//! 1. no path segments at all: the root summary
//! 2. first segment is not a configured alias: `404`
//! 3. `rest` empty or equal to the metadata token: metadata route
//! 4. `rest[0]` is the listing token: listing route, `rest[1..]` is the
//!    inferred listing path
//! 5. `rest[0]` is the space token (when enabled): space passthrough
//! 6. anything else: raw file at `rest` joined with `/`
//!
//! Every route except the space passthrough accepts only `GET` and `HEAD`. The
//! method is checked here, before any alias resolution or upstream I/O.
//!
//! Segments are percent-decoded first, so `..%2F..` is seen as `../..`. Any
//! decoded `.` or `..` segment is rejected with `400`.

use crate::core::config::RouteSettings;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{ProxyRoute, RouteCommand};
use crate::routing::encoding::{decode_segment, has_dot_segment};
use axum::http::Method;

/// Outcome of dispatching a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The root summary route
    Root,

    /// One of the proxied alias routes
    Proxy(ProxyRoute),
}

/// Path-based dispatcher over the configured aliases
#[derive(Debug, Clone)]
pub struct Router {
    /// Known aliases
    aliases: Vec<String>,

    /// Reserved tokens
    routes: RouteSettings,
}

impl Router {
    /// Create a dispatcher for the given aliases
    pub fn new<I, S>(aliases: I, routes: RouteSettings) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            routes,
        }
    }

    /// Reserved token settings
    pub fn routes(&self) -> &RouteSettings {
        &self.routes
    }

    /// Dispatch a request by method and raw (still percent-encoded) path
    pub fn dispatch(&self, method: &Method, path: &str) -> GatewayResult<Dispatch> {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());

        let alias = match segments.next() {
            None => return Ok(Dispatch::Root),
            Some(raw) => match decode_segment(raw) {
                Ok(alias) if self.aliases.contains(&alias) => alias,
                _ => return Err(GatewayError::not_found(path)),
            },
        };

        let rest = segments
            .map(decode_segment)
            .collect::<GatewayResult<Vec<String>>>()?;

        if rest.iter().any(|segment| has_dot_segment(segment)) {
            return Err(GatewayError::invalid_argument(
                "path must not contain '.' or '..' segments",
            ));
        }

        let command = self.command(rest);

        if command.is_read_only() && !is_read_method(method) {
            return Err(GatewayError::method_not_allowed(method.as_str()));
        }

        Ok(Dispatch::Proxy(ProxyRoute { alias, command }))
    }

    fn command(&self, rest: Vec<String>) -> RouteCommand {
        let Some(first) = rest.first() else {
            return RouteCommand::Info;
        };

        if *first == self.routes.info_command && rest.len() == 1 {
            return RouteCommand::Info;
        }

        if *first == self.routes.files_command {
            let inferred = rest[1..].join("/");
            return RouteCommand::Files {
                inferred_path: (!inferred.is_empty()).then_some(inferred),
            };
        }

        if self.routes.space_command.as_deref() == Some(first.as_str()) {
            return RouteCommand::Space {
                path: rest[1..].join("/"),
            };
        }

        RouteCommand::Raw {
            path: rest.join("/"),
        }
    }
}

/// Whether the method is allowed on the read-only routes
pub fn is_read_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}
