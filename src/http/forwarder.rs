//! Upstream request forwarding.
//!
//! # Responsibilities
//! - Issue the outbound request over a shared, pooled client
//! - Enforce the round-trip bound (send + full body read)
//! - Follow same-origin redirects for documentation asset sub-routes only
//! - Classify transport failures into timeout / unavailable / other
//!
//! # Design Decisions
//! - No retries: non-idempotent methods cannot be replayed safely
//! - Bodies are fully buffered in both directions
//! - Dropping the future (client went away) cancels the upstream call

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;
use url::Url;

use crate::config::{ForwardingConfig, TimeoutConfig};
use crate::error::{BoxError, ProxyError};

/// Outbound request mirroring an inbound one.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
    pub method: Method,
    pub target_url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardedResponse {
    /// Content type declared by the upstream, if any.
    pub fn declared_content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Transport-level failure before classification.
#[derive(Debug, thiserror::Error)]
enum TransportError {
    #[error("invalid target URL: {0}")]
    InvalidTarget(String),

    #[error(transparent)]
    Request(#[from] axum::http::Error),

    #[error(transparent)]
    Client(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read upstream body: {0}")]
    Body(#[source] axum::Error),
}

/// Shared upstream client.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_redirects: usize,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig, forwarding: &ForwardingConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeout: Duration::from_secs(timeouts.upstream_secs),
            max_redirects: forwarding.max_redirects,
            max_body_bytes: forwarding.max_body_bytes,
        }
    }

    /// Forward a request to `service`, optionally following redirects.
    pub async fn forward(
        &self,
        service: &str,
        request: ForwardedRequest,
        follow_redirects: bool,
    ) -> Result<ForwardedResponse, ProxyError> {
        match time::timeout(self.timeout, self.execute(request, follow_redirects)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(classify_transport_error(service, err)),
            Err(_) => Err(ProxyError::UpstreamTimeout {
                service: service.to_string(),
            }),
        }
    }

    async fn execute(
        &self,
        mut request: ForwardedRequest,
        follow_redirects: bool,
    ) -> Result<ForwardedResponse, TransportError> {
        let mut hops = 0;
        loop {
            let response = self.send(&request).await?;

            if follow_redirects && hops < self.max_redirects && is_redirect(response.status) {
                if let Some(next) = redirect_target(&request.target_url, &response.headers) {
                    tracing::debug!(
                        from = %request.target_url,
                        to = %next,
                        status = %response.status,
                        "Following upstream redirect"
                    );
                    hops += 1;
                    request.target_url = next;
                    if response.status == StatusCode::SEE_OTHER {
                        request.method = Method::GET;
                        request.body = Bytes::new();
                    }
                    continue;
                }
            }

            return Ok(response);
        }
    }

    async fn send(&self, request: &ForwardedRequest) -> Result<ForwardedResponse, TransportError> {
        let uri: Uri = request
            .target_url
            .parse()
            .map_err(|_| TransportError::InvalidTarget(request.target_url.clone()))?;

        let mut builder = Request::builder().method(request.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers.clone());
        }
        let outbound = builder.body(Body::from(request.body.clone()))?;

        let response = self.client.request(outbound).await?;
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
            .await
            .map_err(TransportError::Body)?;

        Ok(ForwardedResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

/// Status codes the gateway treats as redirects.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve a `Location` header against the current target.
///
/// Only same-origin targets are followed: the forwarded request carries the
/// client's credentials, which must never reach another host.
fn redirect_target(current: &str, headers: &HeaderMap) -> Option<String> {
    let location = headers.get(header::LOCATION)?.to_str().ok()?;
    let current = Url::parse(current).ok()?;
    let next = current.join(location).ok()?;
    (next.origin() == current.origin()).then(|| next.to_string())
}

fn classify_transport_error(service: &str, err: TransportError) -> ProxyError {
    let service = service.to_string();
    match err {
        TransportError::Client(e) if e.is_connect() => {
            if is_timed_out(&e) {
                ProxyError::UpstreamTimeout { service }
            } else {
                ProxyError::UpstreamUnavailable {
                    service,
                    source: Box::new(e),
                }
            }
        }
        other => ProxyError::Forwarding {
            service,
            source: BoxError::from(other),
        },
    }
}

/// Walk the source chain looking for a timed-out I/O error.
fn is_timed_out(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        if e.is::<time::error::Elapsed>() {
            return true;
        }
        if e.downcast_ref::<hyper::Error>().is_some_and(hyper::Error::is_timeout) {
            return true;
        }
        current = e.source();
    }
    false
}
