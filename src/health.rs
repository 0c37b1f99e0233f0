//! Gateway liveness and diagnostics.
//!
//! Reflects the service registry only; never calls a backend.

use serde::Serialize;

use crate::routing::ServiceRegistry;

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: String,
    /// Registered service names in declaration order.
    pub microservices: Vec<String>,
}

/// Build the health report for the gateway.
pub fn health_check(service_name: &str, registry: &ServiceRegistry) -> HealthReport {
    HealthReport {
        status: "healthy",
        service: service_name.to_string(),
        microservices: registry.names().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;

    #[test]
    fn test_health_report_json() {
        let registry = ServiceRegistry::from_config(&ProxyConfig::default().services).unwrap();
        let report = health_check("orquestador", &registry);

        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"status":"healthy","service":"orquestador","microservices":["orders","inventory","menu"]}"#
        );
    }
}
