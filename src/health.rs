use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Health Reporting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    #[serde(flatten)]
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
        }
    }
}

/// Service-wide view over all component reports.
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    #[serde(flatten)]
    pub overall: HealthStatus,
    pub components: Vec<ComponentHealth>,
}

impl SystemHealth {
    /// Unhealthy if any component is, degraded if any isn't healthy.
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let overall = if let Some(c) = components.iter().find(|c| c.status.is_unhealthy()) {
            HealthStatus::Unhealthy(format!("{} is unhealthy", c.name))
        } else if let Some(c) = components.iter().find(|c| !c.status.is_healthy()) {
            HealthStatus::Degraded(format!("{} is degraded", c.name))
        } else {
            HealthStatus::Healthy
        };

        Self { overall, components }
    }
}
