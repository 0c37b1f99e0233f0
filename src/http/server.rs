//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, CORS)
//! - Serve the health endpoint
//! - Dispatch `/api/{service}/...` through router → forwarder → transformer
//! - Map every failure to a single client response at this boundary

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{Method, Request},
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Json, Router,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::error::ProxyError;
use crate::health::{health_check, HealthReport};
use crate::http::forwarder::{ForwardedRequest, Forwarder};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::response::{ClientResponse, ResponseTransformer};
use crate::observability::metrics;
use crate::routing::{PathRouter, Route, ServiceRegistry};
use crate::security::headers::{ForwardContext, HeaderPolicy};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<PathRouter>,
    pub forwarder: Arc<Forwarder>,
    pub transformer: Arc<ResponseTransformer>,
    pub header_policy: Arc<HeaderPolicy>,
    pub service_name: Arc<str>,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build all request-path components from a validated config.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(ServiceRegistry::from_config(&config.services)?);

        Ok(Self {
            router: Arc::new(PathRouter::new(registry)),
            forwarder: Arc::new(Forwarder::new(&config.timeouts, &config.forwarding)),
            transformer: Arc::new(ResponseTransformer::new(
                config.listener.public_base_url.clone(),
                config.forwarding.strip_server_header,
            )),
            header_policy: Arc::new(HeaderPolicy::from_config(&config.forwarding)),
            service_name: Arc::from(config.service_name.as_str()),
            max_body_bytes: config.forwarding.max_body_bytes,
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(&config, state);

        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let api_methods = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE)
            .or(MethodFilter::PATCH);

        let router = Router::new()
            .route("/", get(health_handler))
            .route("/api/{*path}", on(api_methods, proxy_handler))
            .fallback(not_found)
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId));

        if config.cors.enabled {
            router.layer(permissive_cors())
        } else {
            router
        }
    }

    /// The fully layered application, for in-process use.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.config.services.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Any origin, method and header. Suitable for an internal gateway only.
fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(health_check(&state.service_name, state.router.registry()))
}

async fn not_found() -> ProxyError {
    ProxyError::NotFound
}

/// Main proxy handler.
/// Resolves the service, forwards the request, and repackages the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(request.headers()).to_string();
    let path = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_string();

    let route = match state.router.route(&path) {
        Ok(route) => route,
        Err(err) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %err, "No service matched");
            metrics::record_request(method.as_str(), "none", err.status().as_u16(), start_time);
            return err.into_response();
        }
    };
    let service = route.service_name();

    match forward(&state, &route, &request_id, request).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), service, response.status.as_u16(), start_time);
            response.into_response()
        }
        Err(err) => {
            let detail = error_chain(&err);
            match &err {
                ProxyError::Forwarding { .. } => {
                    tracing::error!(request_id = %request_id, service, error = %detail, "Unexpected forwarding error")
                }
                _ if err.is_upstream() => {
                    tracing::warn!(request_id = %request_id, service, error = %detail, "Upstream request failed")
                }
                _ => tracing::warn!(request_id = %request_id, service, error = %detail, "Request rejected"),
            }
            if err.is_upstream() {
                metrics::record_upstream_error(service, err.kind());
            }
            metrics::record_request(method.as_str(), service, err.status().as_u16(), start_time);
            err.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    route: &Route<'_>,
    request_id: &str,
    request: Request<Body>,
) -> Result<ClientResponse, ProxyError> {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (parts, body) = request.into_parts();
    let body = read_body(body, state.max_body_bytes).await?;

    let ctx = ForwardContext {
        client_ip,
        prefix: route.service().public_prefix(),
    };
    let outbound = ForwardedRequest {
        method: parts.method.clone(),
        target_url: route.target_url(),
        headers: state.header_policy.outbound(&parts.headers, &ctx),
        body,
    };

    tracing::info!(
        request_id = %request_id,
        method = %parts.method,
        service = route.service_name(),
        target = %outbound.target_url,
        "Forwarding request"
    );

    let follow_redirects = route.is_static_asset() && parts.method == Method::GET;
    let upstream = state
        .forwarder
        .forward(route.service_name(), outbound, follow_redirects)
        .await?;

    tracing::info!(
        request_id = %request_id,
        service = route.service_name(),
        status = %upstream.status,
        "Upstream responded"
    );

    Ok(state.transformer.transform(route, upstream))
}

/// Buffer the inbound body; only an exceeded limit maps to 413.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    let collected = Limited::new(body, limit).collect().await.map_err(|e| {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            ProxyError::PayloadTooLarge { limit }
        } else {
            ProxyError::InvalidRequest(e)
        }
    })?;
    Ok(collected.to_bytes())
}

/// Render an error with its full source chain for server-side logs.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
