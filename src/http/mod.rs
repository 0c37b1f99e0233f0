//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handlers)
//!     → request.rs (request ID generation)
//!     → [routing layer resolves service]
//!     → forwarder.rs (outbound call, timeout, redirects)
//!     → response.rs (classify, transform, repackage)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{ForwardedRequest, ForwardedResponse, Forwarder};
pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use response::{Classification, ClientResponse, ResponseTransformer};
pub use server::{AppState, HttpServer};
