//! Service registry.
//!
//! # Responsibilities
//! - Map a short service name to its backend base URL
//! - Carry each service's documentation convention
//! - Preserve declaration order for diagnostics
//!
//! # Design Decisions
//! - Built once at startup, never mutated (shared via Arc without locks)
//! - O(1) name lookup via HashMap over a declaration-ordered Vec

use std::collections::HashMap;

use url::Url;

use crate::config::{ConfigError, ServiceConfig, ValidationError};
use crate::error::ProxyError;
use crate::routing::DocConvention;

/// A registered backend service.
#[derive(Debug, Clone)]
pub struct ServiceEntry {
    name: String,
    base_url: String,
    origin: Url,
    docs: DocConvention,
}

impl ServiceEntry {
    /// Create an entry, normalizing away a trailing slash on the base URL.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        docs: DocConvention,
    ) -> Result<Self, url::ParseError> {
        let origin = Url::parse(base_url)?;
        Ok(Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            origin,
            docs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL without trailing slash (e.g., "http://inventory-service:4000").
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parsed base URL, used to recognise internal references in redirects.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn docs(&self) -> &DocConvention {
        &self.docs
    }

    /// Path under which the gateway exposes this service (`/api/{name}`).
    pub fn public_prefix(&self) -> String {
        format!("/api/{}", self.name)
    }
}

/// Immutable name → backend table.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
    index: HashMap<String, usize>,
}

impl ServiceRegistry {
    /// Build the registry from service configs.
    pub fn from_config(services: &[ServiceConfig]) -> Result<Self, ConfigError> {
        let mut entries = Vec::with_capacity(services.len());
        let mut errors = Vec::new();

        for service in services {
            match ServiceEntry::new(&service.name, &service.base_url, DocConvention::from(&service.docs)) {
                Ok(entry) => entries.push(entry),
                Err(e) => errors.push(ValidationError::InvalidBaseUrl {
                    name: service.name.clone(),
                    url: service.base_url.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.name.clone(), position).is_some() {
                errors.push(ValidationError::DuplicateService(entry.name.clone()));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        tracing::debug!(services = entries.len(), "Service registry built");
        Ok(Self { entries, index })
    }

    /// Look up a service by name.
    pub fn resolve(&self, name: &str) -> Result<&ServiceEntry, ProxyError> {
        self.index
            .get(name)
            .map(|&position| &self.entries[position])
            .ok_or_else(|| ProxyError::UnknownService(name.to_string()))
    }

    /// Service names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }
}
