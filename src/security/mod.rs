//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → headers.rs (strip hop-by-hop, apply deny-list, set X-Forwarded-*)
//!     → Outbound request
//!
//! Upstream response headers
//!     → headers.rs (strip framing and, optionally, Server)
//!     → Client response
//! ```

pub mod headers;

pub use headers::{ForwardContext, HeaderPolicy};
