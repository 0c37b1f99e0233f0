//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or built-in defaults
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → service registry built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changing backends requires a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    CorsConfig, DocConventionConfig, DocFramework, ForwardingConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ProxyConfig, ServiceConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
