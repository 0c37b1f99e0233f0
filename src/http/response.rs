//! Response classification and transformation.
//!
//! # Responsibilities
//! - Decide how an upstream response is re-emitted (first matching rule wins):
//!   redirect, static asset, API docs JSON, docs HTML page, default
//! - Rewrite `Location` values and embedded doc asset paths so they point
//!   back at the gateway
//! - Strip framing headers; the response writer recomputes them
//!
//! # Design Decisions
//! - Pure function of (route, upstream response); never fabricates a body
//! - Static asset content types come from a fixed extension table, never from
//!   the upstream
//! - JSON is validated, then passed through byte-for-byte
//! - Invalid JSON falls back to raw passthrough

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::IgnoredAny;
use url::Url;

use crate::error::ProxyError;
use crate::http::forwarder::{is_redirect, ForwardedResponse};
use crate::routing::{Route, ServiceEntry};
use crate::security::headers::strip_transport_headers;

const APPLICATION_JSON: &str = "application/json";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Extensions always treated as static assets.
const ASSET_EXTENSIONS: [&str; 8] = ["css", "js", "png", "ico", "svg", "woff", "woff2", "ttf"];

/// Extension → MIME table for static assets.
const MIME_TYPES: [(&str, &str); 10] = [
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("png", "image/png"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("html", "text/html"),
    ("json", APPLICATION_JSON),
    ("map", APPLICATION_JSON),
];

/// How an upstream response is re-emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Redirect,
    StaticAsset,
    ApiDocs,
    DocsPage,
    Default,
}

/// Response handed back to the client.
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for ClientResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Lowercased extension of the last path segment.
fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// MIME type for a static asset path; unknown extensions are `application/octet-stream`.
pub fn mime_for_path(path: &str) -> &'static str {
    extension(path)
        .and_then(|ext| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(OCTET_STREAM)
}

fn has_asset_extension(path: &str) -> bool {
    extension(path).is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext.as_str()))
}

fn is_html(content_type: Option<&str>) -> bool {
    content_type.map_or(true, |ct| {
        ct.trim_start().to_ascii_lowercase().starts_with("text/html")
    })
}

/// Decide how to re-emit `upstream` for `route`.
pub fn classify(route: &Route<'_>, upstream: &ForwardedResponse) -> Classification {
    let path = route.path();

    if is_redirect(upstream.status) && upstream.headers.contains_key(header::LOCATION) {
        Classification::Redirect
    } else if route.is_static_asset() || has_asset_extension(path) {
        Classification::StaticAsset
    } else if path.contains("openapi.json") || path.contains("api-docs") {
        Classification::ApiDocs
    } else if (path.contains("docs") || path.contains("swagger"))
        && is_html(upstream.declared_content_type())
    {
        Classification::DocsPage
    } else {
        Classification::Default
    }
}

/// Validate that `body` is JSON.
pub fn check_json(service: &str, body: &[u8]) -> Result<(), ProxyError> {
    serde_json::from_slice::<IgnoredAny>(body)
        .map(|_| ())
        .map_err(|source| ProxyError::UpstreamBadJson {
            service: service.to_string(),
            source,
        })
}

/// Point embedded doc asset references at the gateway's per-service prefixes.
pub fn rewrite_doc_html(html: &str, service: &ServiceEntry) -> String {
    let docs = service.docs();
    let prefix = service.public_prefix();
    let mut out = html.to_string();

    for quote in ['"', '\''] {
        out = out.replace(
            &format!("{quote}{}{quote}", docs.openapi_path),
            &format!("{quote}{prefix}{}{quote}", docs.openapi_path),
        );
    }

    for (backend_prefix, proxy_segment) in [
        (&docs.static_prefix, "/static/"),
        (&docs.webjars_prefix, "/webjars/"),
    ] {
        for lead in ["\"", "'", "url("] {
            out = out.replace(
                &format!("{lead}{backend_prefix}"),
                &format!("{lead}{prefix}{proxy_segment}"),
            );
        }
    }

    out
}

/// Stateless transformer parameterised by gateway-wide settings.
#[derive(Debug, Clone, Default)]
pub struct ResponseTransformer {
    public_base_url: Option<String>,
    strip_server: bool,
}

impl ResponseTransformer {
    pub fn new(public_base_url: Option<String>, strip_server: bool) -> Self {
        Self {
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
            strip_server,
        }
    }

    /// External prefix of a service: `{public_base_url}/api/{name}`.
    fn external_prefix(&self, service: &ServiceEntry) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}{}", base, service.public_prefix()),
            None => service.public_prefix(),
        }
    }

    /// Rewrite a `Location` that references the service's backend.
    ///
    /// Relative values are resolved against `request_url`, the backend URL the
    /// response came from. Returns the value unchanged when it points anywhere
    /// else.
    pub fn rewrite_location(&self, service: &ServiceEntry, request_url: &str, location: &str) -> String {
        let resolved = match Url::parse(request_url) {
            Ok(base) => base.join(location),
            Err(_) => Url::parse(location),
        };
        let Ok(target) = resolved else {
            return location.to_string();
        };
        let origin = service.origin();
        if target.origin() != origin.origin() {
            return location.to_string();
        }

        let base_path = origin.path().trim_end_matches('/');
        let rest = match target.path().strip_prefix(base_path) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return location.to_string(),
        };

        let mut rewritten = format!("{}{}", self.external_prefix(service), rest);
        if let Some(query) = target.query() {
            rewritten.push('?');
            rewritten.push_str(query);
        }
        if let Some(fragment) = target.fragment() {
            rewritten.push('#');
            rewritten.push_str(fragment);
        }
        rewritten
    }

    /// Repackage an upstream response for the client.
    pub fn transform(&self, route: &Route<'_>, upstream: ForwardedResponse) -> ClientResponse {
        let classification = classify(route, &upstream);
        let service = route.service();

        let ForwardedResponse {
            status,
            mut headers,
            mut body,
        } = upstream;
        strip_transport_headers(&mut headers, self.strip_server);

        match classification {
            Classification::Redirect => {
                let rewritten = headers
                    .get(header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(|location| self.rewrite_location(service, &route.target_url(), location));
                if let Some(value) = rewritten.and_then(|l| HeaderValue::from_str(&l).ok()) {
                    headers.insert(header::LOCATION, value);
                }
            }
            Classification::StaticAsset => {
                if status.is_success() {
                    headers.insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static(mime_for_path(route.path())),
                    );
                }
            }
            Classification::DocsPage => match std::str::from_utf8(&body) {
                Ok(html) => {
                    body = Bytes::from(rewrite_doc_html(html, service));
                    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML));
                }
                Err(err) => {
                    tracing::warn!(
                        service = service.name(),
                        path = route.path(),
                        error = %err,
                        "Docs page is not UTF-8, passing through raw"
                    );
                }
            },
            Classification::ApiDocs | Classification::Default => {
                match check_json(service.name(), &body) {
                    Ok(()) => {
                        headers.insert(
                            header::CONTENT_TYPE,
                            HeaderValue::from_static(APPLICATION_JSON),
                        );
                    }
                    Err(err) if classification == Classification::ApiDocs => {
                        tracing::warn!(
                            service = service.name(),
                            path = route.path(),
                            error = %err,
                            "API docs body is not JSON, passing through raw"
                        );
                    }
                    Err(_) => {}
                }
            }
        }

        ClientResponse {
            status,
            headers,
            body,
        }
    }
}
