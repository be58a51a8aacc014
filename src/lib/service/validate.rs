use std::collections::HashSet;

use thiserror::Error;

use super::types::{HealthProbe, Protocol, ServiceConfig};
use crate::container::resources::{self, ResourceError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("service name is required")]
    MissingName,
    #[error("service {service}: image is required")]
    MissingImage { service: String },
    #[error("service {service}: container port must be greater than 0")]
    ZeroContainerPort { service: String },
    #[error("service {service}: port {port}/{protocol} is mapped more than once")]
    DuplicatePort {
        service: String,
        port: u16,
        protocol: Protocol,
    },
    #[error("service {service}: host port {port}/{protocol} is bound more than once")]
    DuplicateHostPort {
        service: String,
        port: u16,
        protocol: Protocol,
    },
    #[error("service {service}: invalid environment key '{key}'")]
    InvalidEnvKey { service: String, key: String },
    #[error("service {service}: invalid scale policy: {reason}")]
    ScalePolicy { service: String, reason: String },
    #[error("service {service}: invalid health check: {reason}")]
    HealthCheck { service: String, reason: String },
    #[error("service {service}: {source}")]
    Resource {
        service: String,
        #[source]
        source: ResourceError,
    },
}

impl ServiceConfig {
    /// Checks the invariants the lifecycle layer relies on.
    ///
    /// Malformed resource strings are not rejected here; see
    /// [`ServiceConfig::check_resources`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        let service = self.name.clone();

        if self.image.trim().is_empty() {
            return Err(ValidationError::MissingImage { service });
        }

        let mut container_ports = HashSet::new();
        let mut host_ports = HashSet::new();
        for mapping in &self.ports {
            if mapping.container_port == 0 {
                return Err(ValidationError::ZeroContainerPort { service });
            }
            if !container_ports.insert((mapping.container_port, mapping.protocol)) {
                return Err(ValidationError::DuplicatePort {
                    service,
                    port: mapping.container_port,
                    protocol: mapping.protocol,
                });
            }
            if mapping.host_port != 0
                && !host_ports.insert((mapping.host_port, mapping.protocol))
            {
                return Err(ValidationError::DuplicateHostPort {
                    service,
                    port: mapping.host_port,
                    protocol: mapping.protocol,
                });
            }
        }

        if let Some(key) = self
            .environment
            .keys()
            .find(|key| key.is_empty() || key.contains('='))
        {
            return Err(ValidationError::InvalidEnvKey {
                service,
                key: key.clone(),
            });
        }

        let policy = &self.scale_policy;
        if policy.is_bounded() && policy.min_replicas > policy.max_replicas {
            return Err(ValidationError::ScalePolicy {
                service,
                reason: format!(
                    "min_replicas {} exceeds max_replicas {}",
                    policy.min_replicas, policy.max_replicas
                ),
            });
        }
        for (label, target) in [
            ("target_cpu", policy.target_cpu),
            ("target_memory", policy.target_memory),
        ] {
            if !(0.0..=100.0).contains(&target) {
                return Err(ValidationError::ScalePolicy {
                    service,
                    reason: format!("{} must be within 0..=100, got {}", label, target),
                });
            }
        }

        if let Some(check) = &self.health_check {
            let reason = match &check.probe {
                HealthProbe::Command { command } if command.is_empty() => {
                    Some("command probe needs a command")
                }
                HealthProbe::Http { port: 0, .. } | HealthProbe::Tcp { port: 0 } => {
                    Some("probe port must be greater than 0")
                }
                HealthProbe::Command { .. }
                | HealthProbe::Http { .. }
                | HealthProbe::Tcp { .. } => None,
            };
            if let Some(reason) = reason {
                return Err(ValidationError::HealthCheck {
                    service,
                    reason: reason.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Strict pass over the resource strings. Callers that do not accept
    /// "no limit" for a malformed value run this on top of [`validate`].
    ///
    /// [`validate`]: ServiceConfig::validate
    pub fn check_resources(&self) -> Result<(), ValidationError> {
        let wrap = |source| ValidationError::Resource {
            service: self.name.clone(),
            source,
        };
        resources::parse_cpu(&self.resources.cpu)
            .into_result()
            .map_err(wrap)?;
        resources::parse_memory(&self.resources.memory)
            .into_result()
            .map_err(wrap)?;
        Ok(())
    }
}
