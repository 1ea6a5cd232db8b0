use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: Option<String>,
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl ComponentHealth {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            response_time_ms: Some(response_time_ms),
            details: BTreeMap::new(),
        }
    }

    pub fn unhealthy(error: String) -> Self {
        Self {
            status: ComponentStatus::Unhealthy,
            message: Some(error),
            response_time_ms: None,
            details: BTreeMap::new(),
        }
    }

    pub fn degraded(message: String, response_time_ms: u64) -> Self {
        Self {
            status: ComponentStatus::Degraded,
            message: Some(message),
            response_time_ms: Some(response_time_ms),
            details: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: serde_json::Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: ComponentStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthCheckResponse {
    pub fn new(version: String) -> Self {
        Self {
            status: ComponentStatus::Healthy,
            timestamp: Utc::now(),
            version,
            components: BTreeMap::new(),
        }
    }

    /// The overall status is the worst component status.
    pub fn add_component(&mut self, name: &str, health: ComponentHealth) {
        self.status = match (self.status, health.status) {
            (ComponentStatus::Unhealthy, _) | (_, ComponentStatus::Unhealthy) => {
                ComponentStatus::Unhealthy
            }
            (ComponentStatus::Degraded, _) | (_, ComponentStatus::Degraded) => {
                ComponentStatus::Degraded
            }
            _ => ComponentStatus::Healthy,
        };
        self.components.insert(name.to_string(), health);
    }

    pub fn is_unhealthy(&self) -> bool {
        self.status == ComponentStatus::Unhealthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_component_wins() {
        let mut response = HealthCheckResponse::new("0.1.0".to_string());
        response.add_component("database", ComponentHealth::healthy(3));
        assert_eq!(ComponentStatus::Healthy, response.status);

        response.add_component("migrations", ComponentHealth::degraded("slow".to_string(), 1500));
        assert_eq!(ComponentStatus::Degraded, response.status);

        response.add_component("other", ComponentHealth::unhealthy("down".to_string()));
        response.add_component("last", ComponentHealth::healthy(1));
        assert!(response.is_unhealthy());
    }
}
