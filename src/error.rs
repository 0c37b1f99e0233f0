//! Gateway error taxonomy and its mapping to client-facing responses.
//!
//! Every per-request failure ends up here exactly once. Transport details are
//! kept in the error's source chain for server-side logging and never
//! rendered into the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Boxed transport error kept for logging.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced while routing or forwarding a request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Path names a service that is not in the registry.
    #[error("Service '{0}' not found")]
    UnknownService(String),

    /// Path is outside the gateway's routed surface.
    #[error("Not Found")]
    NotFound,

    /// Upstream did not answer within the configured bound.
    #[error("Timeout connecting to {service}")]
    UpstreamTimeout { service: String },

    /// Connection to the upstream could not be established.
    #[error("Service {service} unavailable")]
    UpstreamUnavailable {
        service: String,
        #[source]
        source: BoxError,
    },

    /// Upstream claimed JSON but the body does not parse.
    #[error("Service {service} returned invalid JSON")]
    UpstreamBadJson {
        service: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other transport fault.
    #[error("Forwarding to {service} failed")]
    Forwarding {
        service: String,
        #[source]
        source: BoxError,
    },

    /// Inbound body exceeded the buffering limit.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Inbound body could not be read (e.g., the client aborted the upload).
    #[error("Failed to read request body")]
    InvalidRequest(#[source] BoxError),
}

impl ProxyError {
    /// Status code returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UnknownService(_) | ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamBadJson { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Forwarding { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the failure happened talking to the backend rather than the client.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ProxyError::UpstreamTimeout { .. }
                | ProxyError::UpstreamUnavailable { .. }
                | ProxyError::UpstreamBadJson { .. }
                | ProxyError::Forwarding { .. }
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UnknownService(_) => "unknown_service",
            ProxyError::NotFound => "not_found",
            ProxyError::UpstreamTimeout { .. } => "timeout",
            ProxyError::UpstreamUnavailable { .. } => "unavailable",
            ProxyError::UpstreamBadJson { .. } => "bad_json",
            ProxyError::Forwarding { .. } => "forwarding",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Message safe to show to clients.
    fn detail(&self) -> String {
        match self {
            ProxyError::Forwarding { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let io = || -> BoxError { Box::new(std::io::Error::other("boom")) };

        assert_eq!(ProxyError::UnknownService("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ProxyError::UpstreamTimeout { service: "x".into() }.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ProxyError::UpstreamUnavailable { service: "x".into(), source: io() }.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ProxyError::Forwarding { service: "x".into(), source: io() }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ProxyError::PayloadTooLarge { limit: 1 }.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ProxyError::InvalidRequest(io()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_client_side_failures_are_not_upstream() {
        let io = || -> BoxError { Box::new(std::io::Error::other("boom")) };

        assert!(ProxyError::UpstreamTimeout { service: "x".into() }.is_upstream());
        assert!(ProxyError::Forwarding { service: "x".into(), source: io() }.is_upstream());
        assert!(!ProxyError::PayloadTooLarge { limit: 1 }.is_upstream());
        assert!(!ProxyError::InvalidRequest(io()).is_upstream());
        assert!(!ProxyError::UnknownService("x".into()).is_upstream());
    }

    #[tokio::test]
    async fn test_unknown_service_names_the_service() {
        let response = ProxyError::UnknownService("unknown".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert!(json["detail"].as_str().unwrap().contains("unknown"));
    }

    #[tokio::test]
    async fn test_forwarding_error_does_not_leak_source() {
        let err = ProxyError::Forwarding {
            service: "menu".into(),
            source: Box::new(std::io::Error::other("10.0.0.7:8080 reset by peer")),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["detail"], "Internal server error");
    }
}
