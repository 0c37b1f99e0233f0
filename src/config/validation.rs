//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Service names must be unique, usable as a path segment
//! - Backend URLs must be plain `http` origins
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::{ProxyConfig, ServiceConfig};
use crate::routing::DocConvention;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one service must be configured")]
    NoServices,

    #[error("service name must not be empty")]
    EmptyServiceName,

    #[error("service name '{0}' must not contain '/', '?' or '#'")]
    InvalidServiceName(String),

    #[error("service '{0}' is declared more than once")]
    DuplicateService(String),

    #[error("service '{name}' has invalid base_url '{url}': {reason}")]
    InvalidBaseUrl { name: String, url: String, reason: String },

    #[error("service '{name}' has invalid docs prefix '{prefix}': must start and end with '/'")]
    InvalidDocPrefix { name: String, prefix: String },

    #[error("service '{name}' has invalid openapi_path '{path}': must start with '/'")]
    InvalidOpenApiPath { name: String, path: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("invalid bind_address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid public_base_url '{0}'")]
    InvalidPublicBaseUrl(String),

    #[error("invalid header name '{0}' in strip_request_headers")]
    InvalidHeaderName(String),
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    let mut seen = HashSet::new();
    for service in &config.services {
        validate_service(service, &mut errors);
        if !service.name.is_empty() && !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.upstream_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.forwarding.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("forwarding.max_body_bytes"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(public) = &config.listener.public_base_url {
        let valid = Url::parse(public)
            .map(|url| url.has_host() && url.query().is_none() && url.fragment().is_none())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidPublicBaseUrl(public.clone()));
        }
    }

    for name in &config.forwarding.strip_request_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_service(service: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    let name = &service.name;
    if name.is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    } else if name.contains(|c: char| matches!(c, '/' | '?' | '#')) {
        errors.push(ValidationError::InvalidServiceName(name.clone()));
    }

    if let Err(reason) = check_base_url(&service.base_url) {
        errors.push(ValidationError::InvalidBaseUrl {
            name: name.clone(),
            url: service.base_url.clone(),
            reason,
        });
    }

    let convention = DocConvention::from(&service.docs);
    for prefix in [&convention.static_prefix, &convention.webjars_prefix] {
        if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
            errors.push(ValidationError::InvalidDocPrefix {
                name: name.clone(),
                prefix: prefix.clone(),
            });
        }
    }
    if !convention.openapi_path.starts_with('/') {
        errors.push(ValidationError::InvalidOpenApiPath {
            name: name.clone(),
            path: convention.openapi_path.clone(),
        });
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.has_host() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DocFramework;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.services = vec![
            ServiceConfig::new("orders", "http://a:1", DocFramework::Generic),
            ServiceConfig::new("orders", "https://b:2", DocFramework::Generic),
            ServiceConfig::new("a/b", "not a url", DocFramework::Generic),
        ];
        config.timeouts.upstream_secs = 0;
        config.listener.bind_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateService("orders".into())));
        assert!(errors.contains(&ValidationError::InvalidServiceName("a/b".into())));
        assert!(errors.contains(&ValidationError::ZeroValue("timeouts.upstream_secs")));
        assert!(errors.contains(&ValidationError::InvalidBindAddress("nowhere".into())));
        let bad_urls = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::InvalidBaseUrl { .. }))
            .count();
        assert_eq!(bad_urls, 2);
    }

    #[test]
    fn test_rejects_empty_service_table() {
        let mut config = ProxyConfig::default();
        config.services.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoServices]));
    }

    #[test]
    fn test_rejects_bad_doc_prefix() {
        let mut config = ProxyConfig::default();
        config.services[0].docs.static_prefix = Some("static".into());
        config.services[1].docs.webjars_prefix = Some("/".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::InvalidDocPrefix { .. })));
    }

    #[test]
    fn test_rejects_invalid_header_and_public_url() {
        let mut config = ProxyConfig::default();
        config.forwarding.strip_request_headers = vec!["cookie".into(), "bad header".into()];
        config.listener.public_base_url = Some("/relative".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidPublicBaseUrl("/relative".into()),
                ValidationError::InvalidHeaderName("bad header".into()),
            ]
        );
    }
}
