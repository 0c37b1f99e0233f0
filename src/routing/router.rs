//! Path routing.
//!
//! # Responsibilities
//! - Split `/api/{service}/{rest...}` into service name and remainder
//! - Resolve the service against the registry
//! - Detect the documentation static-asset sub-routes
//! - Build the backend target URL
//!
//! # Design Decisions
//! - Remainder is forwarded verbatim (still percent-encoded, query included)
//! - Static sub-routes map through the service's doc convention, never a
//!   hardcoded scheme
//! - Immutable after construction (thread-safe without locks)

use std::sync::Arc;

use crate::error::ProxyError;
use crate::routing::{ServiceEntry, ServiceRegistry};

/// Fixed prefix every forwarded path starts with.
pub const API_PREFIX: &str = "/api/";

const STATIC_SEGMENT: &str = "static/";
const WEBJARS_SEGMENT: &str = "webjars/";

/// Which documentation asset prefix a sub-route addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetPrefix {
    Static,
    Webjars,
}

/// Shape of a routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Generic forwarding: remainder appended to the base URL.
    Forward,
    /// Documentation asset sub-route.
    Asset(AssetPrefix),
}

/// A resolved request target.
#[derive(Debug, Clone)]
pub struct Route<'a> {
    service: &'a ServiceEntry,
    kind: RouteKind,
    remainder: String,
}

impl<'a> Route<'a> {
    pub fn service(&self) -> &'a ServiceEntry {
        self.service
    }

    pub fn service_name(&self) -> &'a str {
        self.service.name()
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn is_static_asset(&self) -> bool {
        matches!(self.kind, RouteKind::Asset(_))
    }

    /// Everything after `/api/{service}/`, query string included.
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    /// Remainder without its query string, used for classification.
    pub fn path(&self) -> &str {
        self.remainder
            .split_once('?')
            .map_or(self.remainder.as_str(), |(path, _)| path)
    }

    /// Backend URL the request is forwarded to.
    pub fn target_url(&self) -> String {
        let base = self.service.base_url();
        let docs = self.service.docs();
        match self.kind {
            RouteKind::Forward => format!("{}/{}", base, self.remainder),
            RouteKind::Asset(AssetPrefix::Static) => format!(
                "{}{}{}",
                base,
                docs.static_prefix,
                &self.remainder[STATIC_SEGMENT.len()..]
            ),
            RouteKind::Asset(AssetPrefix::Webjars) => format!(
                "{}{}{}",
                base,
                docs.webjars_prefix,
                &self.remainder[WEBJARS_SEGMENT.len()..]
            ),
        }
    }
}

/// Resolves inbound paths against the service registry.
#[derive(Debug)]
pub struct PathRouter {
    registry: Arc<ServiceRegistry>,
}

impl PathRouter {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Route a raw path (optionally carrying a query string).
    pub fn route(&self, raw_path: &str) -> Result<Route<'_>, ProxyError> {
        let rest = raw_path.strip_prefix(API_PREFIX).ok_or(ProxyError::NotFound)?;

        let name_end = rest.find(|c: char| c == '/' || c == '?').unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_end);
        let remainder = tail.strip_prefix('/').unwrap_or(tail);

        let service = self.registry.resolve(name)?;

        let kind = if remainder.starts_with(STATIC_SEGMENT) {
            RouteKind::Asset(AssetPrefix::Static)
        } else if remainder.starts_with(WEBJARS_SEGMENT) {
            RouteKind::Asset(AssetPrefix::Webjars)
        } else {
            RouteKind::Forward
        };

        Ok(Route {
            service,
            kind,
            remainder: remainder.to_string(),
        })
    }
}
