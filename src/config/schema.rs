//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, public URL).
    pub listener: ListenerConfig,

    /// Name reported by the health endpoint.
    pub service_name: String,

    /// Backend services, in declaration order.
    pub services: Vec<ServiceConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Outbound request and response shaping.
    pub forwarding: ForwardingConfig,

    /// CORS settings.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            service_name: "orquestador".to_string(),
            services: default_services(),
            timeouts: TimeoutConfig::default(),
            forwarding: ForwardingConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::new("orders", "http://maki_api:8000", DocFramework::FastApi),
        ServiceConfig::new("inventory", "http://inventory-service:4000", DocFramework::NestJs),
        ServiceConfig::new("menu", "http://menu_service:8080", DocFramework::Springdoc),
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Externally reachable base URL of the gateway (e.g., "https://gw.example.com").
    ///
    /// Rewritten redirects become absolute URLs under this base. When unset
    /// they are emitted root-relative.
    pub public_base_url: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            public_base_url: None,
        }
    }
}

/// A single named backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Path segment clients use to address the service (`/api/{name}/...`).
    pub name: String,

    /// Backend base URL (e.g., "http://inventory-service:4000").
    pub base_url: String,

    /// How the backend exposes its documentation UI and assets.
    #[serde(default)]
    pub docs: DocConventionConfig,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, framework: DocFramework) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            docs: DocConventionConfig {
                framework,
                ..DocConventionConfig::default()
            },
        }
    }
}

/// Documentation framework family a backend is built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFramework {
    #[default]
    Generic,
    #[serde(rename = "fastapi")]
    FastApi,
    #[serde(rename = "nestjs")]
    NestJs,
    Springdoc,
}

/// Per-service documentation convention: a framework preset plus overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DocConventionConfig {
    /// Preset the unset fields are taken from.
    pub framework: DocFramework,

    /// Backend prefix serving `/api/{service}/static/...` (e.g., "/static/").
    pub static_prefix: Option<String>,

    /// Backend prefix serving `/api/{service}/webjars/...` (e.g., "/webjars/").
    pub webjars_prefix: Option<String>,

    /// Backend path of the OpenAPI document (e.g., "/openapi.json").
    pub openapi_path: Option<String>,
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upper bound on a whole upstream round trip (send + read body) in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
        }
    }
}

/// Outbound request and response shaping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Request headers never forwarded upstream (e.g., "authorization", "cookie").
    pub strip_request_headers: Vec<String>,

    /// Drop the upstream `Server` header from responses.
    pub strip_server_header: bool,

    /// Redirect hops followed on static-asset routes.
    pub max_redirects: usize,

    /// Maximum buffered body size, inbound and upstream.
    pub max_body_bytes: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            strip_request_headers: Vec::new(),
            strip_server_header: true,
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allow any origin, method and header.
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
