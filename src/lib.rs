//! # Repository Alias Gateway - Core Library Crate
//!
//! A small read-mostly HTTP gateway that exposes Hugging Face Hub
//! repositories (models, datasets and Spaces) under short, stable aliases.
//! Each alias is bound to a repository through keys in a secret store, so
//! repository identity and credentials never appear in URLs or in caller code.
//!
//! A request such as `GET /neuro/__files__/app` is turned into the matching
//! upstream Hub request, authenticated with the alias's token, and the
//! upstream response is relayed back with hop-by-hop headers stripped.
//!
//! ## Module Layout
//!
//! - `core`: error type, configuration and shared data types
//! - `discovery`: secret store seam and alias resolution
//! - `routing`: path dispatch, segment encoding and upstream URL building
//! - `protocols`: header sanitization and the upstream relay
//! - `gateway`: the axum server that composes everything
//! - `observability`: structured logging setup

/// Core functionality including error types, configuration, and basic data structures
pub mod core;

/// Secret store access and alias resolution
pub mod discovery;

/// Main gateway server implementation and HTTP handling
pub mod gateway;

/// Logging initialization
pub mod observability;

/// Header handling and the upstream HTTP relay
pub mod protocols;

/// Path dispatch and upstream URL construction
pub mod routing;

// Re-export commonly used types for easier access

/// Main error type used throughout the gateway
pub use core::error::{GatewayError, GatewayResult};

/// Main configuration structure for the gateway
pub use core::config::GatewayConfig;

/// Repository and route types
pub use core::types::{ProxyRoute, RepoScope, RepositoryConfig, RouteCommand};

/// Secret stores and the resolver built on them
pub use discovery::{AliasResolver, EnvSecretStore, SecretStore, StaticSecretStore};

/// Server entry points
pub use gateway::server::{build_app, GatewayServer, ServerState};
