//! Service orchestrator: a single HTTP entry point in front of a fixed set of
//! backend services.
//!
//! Requests under `/api/{service}/...` are forwarded to the registered base
//! URL; responses are classified and repackaged so that API JSON, static doc
//! assets and interactive documentation pages work through the gateway.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
