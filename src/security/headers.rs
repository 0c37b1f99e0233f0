//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop and framing headers in both directions
//! - Apply the configured deny-list to outbound request headers
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host, X-Forwarded-Prefix
//!
//! # Design Decisions
//! - Never trust existing X-Forwarded-* from clients; they are overwritten
//! - `Host` is derived from the target URL by the client, not copied
//! - `Accept-Encoding` is dropped so bodies arrive in identity encoding and
//!   can be rewritten

use std::net::IpAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::config::ForwardingConfig;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_PREFIX: HeaderName = HeaderName::from_static("x-forwarded-prefix");

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// Connection-scoped headers (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    KEEP_ALIVE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Check if a header is a hop-by-hop header that must not be forwarded.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
fn remove_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Strip transport-framing headers from an upstream response.
///
/// Body size and framing are recomputed by the gateway's own response writer.
/// Applying this twice yields the same map as applying it once.
pub fn strip_transport_headers(headers: &mut HeaderMap, strip_server: bool) {
    remove_hop_by_hop(headers);
    headers.remove(header::CONTENT_LENGTH);
    if strip_server {
        headers.remove(header::SERVER);
    }
}

/// Per-request facts added as `X-Forwarded-*`.
#[derive(Debug, Clone, Default)]
pub struct ForwardContext {
    /// Peer address of the inbound connection, when known.
    pub client_ip: Option<IpAddr>,
    /// Public path prefix of the target service (`/api/{service}`).
    pub prefix: String,
}

/// Outbound request header policy.
#[derive(Debug, Clone, Default)]
pub struct HeaderPolicy {
    denied: Vec<HeaderName>,
}

impl HeaderPolicy {
    pub fn new(denied: Vec<HeaderName>) -> Self {
        Self { denied }
    }

    /// Build from config; invalid names are rejected earlier by validation.
    pub fn from_config(config: &ForwardingConfig) -> Self {
        let denied = config
            .strip_request_headers
            .iter()
            .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
            .collect();
        Self::new(denied)
    }

    /// Derive the header set sent upstream from the inbound one.
    ///
    /// Duplicate inbound keys collapse to the last value.
    pub fn outbound(&self, inbound: &HeaderMap, ctx: &ForwardContext) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(inbound.len() + 4);
        for (name, value) in inbound.iter().filter(|(name, _)| !is_hop_by_hop(name)) {
            headers.insert(name.clone(), value.clone());
        }

        remove_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::ACCEPT_ENCODING);
        for name in &self.denied {
            headers.remove(name);
        }

        if let Some(ip) = ctx.client_ip {
            if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        } else {
            headers.remove(X_FORWARDED_FOR);
        }
        match inbound.get(header::HOST) {
            Some(host) => {
                headers.insert(X_FORWARDED_HOST, host.clone());
            }
            None => {
                headers.remove(X_FORWARDED_HOST);
            }
        }
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
        match HeaderValue::from_str(&ctx.prefix) {
            Ok(value) => {
                headers.insert(X_FORWARDED_PREFIX, value);
            }
            Err(_) => {
                headers.remove(X_FORWARDED_PREFIX);
            }
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/css"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        headers.insert(header::SERVER, HeaderValue::from_static("uvicorn"));
        headers.insert(header::ETAG, HeaderValue::from_static("\"v1\""));
        headers
    }

    #[test]
    fn test_hop_by_hop_headers() {
        assert!(is_hop_by_hop(&header::CONNECTION));
        assert!(is_hop_by_hop(&HeaderName::from_static("keep-alive")));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(is_hop_by_hop(&header::PROXY_AUTHORIZATION));

        assert!(!is_hop_by_hop(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop(&header::AUTHORIZATION));
        assert!(!is_hop_by_hop(&header::HOST));
    }

    #[test]
    fn test_strip_transport_headers() {
        let mut headers = response_headers();
        strip_transport_headers(&mut headers, true);

        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("x-trace").is_none());
        assert!(headers.get(header::SERVER).is_none());
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/css");
        assert_eq!(headers.get(header::ETAG).unwrap(), "\"v1\"");
    }

    #[test]
    fn test_strip_is_idempotent() {
        for strip_server in [true, false] {
            let mut once = response_headers();
            strip_transport_headers(&mut once, strip_server);
            let mut twice = once.clone();
            strip_transport_headers(&mut twice, strip_server);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_server_header_kept_when_configured() {
        let mut headers = response_headers();
        strip_transport_headers(&mut headers, false);
        assert_eq!(headers.get(header::SERVER).unwrap(), "uvicorn");
    }

    #[test]
    fn test_outbound_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::HOST, HeaderValue::from_static("gateway:5000"));
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        inbound.insert(header::COOKIE, HeaderValue::from_static("sid=1"));
        inbound.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        inbound.insert(header::CONNECTION, HeaderValue::from_static("close"));
        inbound.insert(X_FORWARDED_FOR, HeaderValue::from_static("6.6.6.6"));
        inbound.insert("x-request-id", HeaderValue::from_static("req-1"));

        let policy = HeaderPolicy::new(vec![header::COOKIE]);
        let ctx = ForwardContext {
            client_ip: Some("10.1.2.3".parse().unwrap()),
            prefix: "/api/orders".into(),
        };
        let outbound = policy.outbound(&inbound, &ctx);

        assert!(outbound.get(header::HOST).is_none());
        assert!(outbound.get(header::COOKIE).is_none());
        assert!(outbound.get(header::ACCEPT_ENCODING).is_none());
        assert!(outbound.get(header::CONNECTION).is_none());
        assert_eq!(outbound.get(header::AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(outbound.get("x-request-id").unwrap(), "req-1");
        assert_eq!(outbound.get(X_FORWARDED_FOR).unwrap(), "10.1.2.3");
        assert_eq!(outbound.get(X_FORWARDED_HOST).unwrap(), "gateway:5000");
        assert_eq!(outbound.get(X_FORWARDED_PROTO).unwrap(), "http");
        assert_eq!(outbound.get(X_FORWARDED_PREFIX).unwrap(), "/api/orders");
    }

    #[test]
    fn test_duplicate_inbound_keys_last_wins() {
        let mut inbound = HeaderMap::new();
        inbound.append("x-tenant", HeaderValue::from_static("a"));
        inbound.append("x-tenant", HeaderValue::from_static("b"));

        let outbound = HeaderPolicy::default().outbound(&inbound, &ForwardContext::default());
        let values: Vec<_> = outbound.get_all("x-tenant").iter().collect();
        assert_eq!(values, ["b"]);
    }

    #[test]
    fn test_policy_from_config() {
        let config = ForwardingConfig {
            strip_request_headers: vec!["Authorization".into()],
            ..ForwardingConfig::default()
        };
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

        let outbound = HeaderPolicy::from_config(&config).outbound(&inbound, &ForwardContext::default());
        assert!(outbound.get(header::AUTHORIZATION).is_none());
    }
}
