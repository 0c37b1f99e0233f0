//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path (/api/{service}/{rest...})
//!     → router.rs (split service name and remainder)
//!     → registry.rs (resolve service → base URL)
//!     → convention.rs (map doc asset sub-routes)
//!     → Return: Route with target URL, or UnknownService
//!
//! Registry construction (at startup):
//!     ServiceConfig[]
//!     → Resolve doc conventions
//!     → Freeze as immutable ServiceRegistry
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always yields the same route

pub mod convention;
pub mod registry;
pub mod router;

pub use convention::DocConvention;
pub use registry::{ServiceEntry, ServiceRegistry};
pub use router::{AssetPrefix, PathRouter, Route, RouteKind, API_PREFIX};
