//! Documentation conventions.
//!
//! Each backend framework family serves its interactive docs and their static
//! assets under different prefixes. A convention records those prefixes so the
//! router and the HTML rewriter agree on the mapping without branching on
//! service identity.

use crate::config::{DocConventionConfig, DocFramework};

/// Resolved documentation convention of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocConvention {
    /// Backend prefix behind `/api/{service}/static/`.
    pub static_prefix: String,
    /// Backend prefix behind `/api/{service}/webjars/`.
    pub webjars_prefix: String,
    /// Backend path of the OpenAPI document.
    pub openapi_path: String,
}

impl DocConvention {
    /// Preset for a framework family.
    pub fn preset(framework: DocFramework) -> Self {
        let (static_prefix, webjars_prefix, openapi_path) = match framework {
            DocFramework::Generic | DocFramework::FastApi => ("/static/", "/webjars/", "/openapi.json"),
            DocFramework::NestJs => ("/docs/", "/webjars/", "/docs-json"),
            DocFramework::Springdoc => ("/webjars/", "/webjars/", "/v3/api-docs"),
        };
        Self {
            static_prefix: static_prefix.to_string(),
            webjars_prefix: webjars_prefix.to_string(),
            openapi_path: openapi_path.to_string(),
        }
    }
}

impl Default for DocConvention {
    fn default() -> Self {
        Self::preset(DocFramework::Generic)
    }
}

impl From<&DocConventionConfig> for DocConvention {
    fn from(config: &DocConventionConfig) -> Self {
        let preset = Self::preset(config.framework);
        Self {
            static_prefix: config.static_prefix.clone().unwrap_or(preset.static_prefix),
            webjars_prefix: config.webjars_prefix.clone().unwrap_or(preset.webjars_prefix),
            openapi_path: config.openapi_path.clone().unwrap_or(preset.openapi_path),
        }
    }
}
