use std::collections::HashMap;

use async_trait::async_trait;
use bollard::{
    Docker,
    errors::Error as DockerError,
    models::{
        ContainerCreateBody, ContainerStateStatusEnum, HostConfig, PortBinding as DockerPortBinding,
        RestartPolicy as DockerRestartPolicy, RestartPolicyNameEnum,
    },
    query_parameters::{
        CreateContainerOptionsBuilder, InspectContainerOptions, RemoveContainerOptionsBuilder,
        StartContainerOptions, StopContainerOptionsBuilder,
    },
};
use tracing::debug;

use super::{
    runtime::{ContainerRuntime, RuntimeError},
    types::{ContainerSpec, ContainerStatus, RemoveRequest, RestartPolicy, StopRequest},
};

/// Docker Engine runtime for the local node.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connects using the platform defaults, honoring `DOCKER_HOST`.
    pub fn connect() -> Result<Self, RuntimeError> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(DockerRuntime { client })
    }

    pub fn with_client(client: Docker) -> Self {
        DockerRuntime { client }
    }

    /// Round-trips to the daemon to confirm it is reachable.
    pub async fn ping(&self) -> Result<(), RuntimeError> {
        self.client.ping().await.map_err(map_error)?;
        Ok(())
    }
}

fn map_error(err: DockerError) -> RuntimeError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 409,
            message,
        } => RuntimeError::Conflict(message),
        DockerError::DockerResponseServerError {
            status_code: 404,
            message,
        } => RuntimeError::NotFound(message),
        other => RuntimeError::Docker(other),
    }
}

fn restart_policy(policy: RestartPolicy) -> DockerRestartPolicy {
    let name = match policy {
        RestartPolicy::No => RestartPolicyNameEnum::NO,
        RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
        RestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
        RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
    };
    DockerRestartPolicy {
        name: Some(name),
        maximum_retry_count: None,
    }
}

fn container_body(spec: &ContainerSpec) -> ContainerCreateBody {
    let port_bindings = spec.port_bindings.as_ref().map(|bindings| {
        bindings
            .iter()
            .map(|(port, bindings)| {
                let bindings = bindings
                    .iter()
                    .map(|binding| DockerPortBinding {
                        host_ip: Some(binding.host_ip.clone()),
                        host_port: Some(binding.host_port.clone()),
                    })
                    .collect();
                (port.clone(), Some(bindings))
            })
            .collect()
    });

    let host_config = HostConfig {
        restart_policy: Some(restart_policy(spec.restart_policy)),
        nano_cpus: (spec.nano_cpus > 0).then_some(spec.nano_cpus),
        memory: (spec.memory > 0).then_some(spec.memory),
        port_bindings,
        ..Default::default()
    };

    ContainerCreateBody {
        image: Some(spec.image.clone()),
        env: Some(spec.env.clone()),
        exposed_ports: spec.exposed_ports.as_ref().map(|ports| {
            ports
                .iter()
                .map(|port| (port.clone(), HashMap::new()))
                .collect()
        }),
        host_config: Some(host_config),
        ..Default::default()
    }
}

fn container_status(status: ContainerStateStatusEnum) -> Option<ContainerStatus> {
    match status {
        ContainerStateStatusEnum::CREATED => Some(ContainerStatus::Created),
        ContainerStateStatusEnum::RUNNING => Some(ContainerStatus::Running),
        ContainerStateStatusEnum::PAUSED => Some(ContainerStatus::Paused),
        ContainerStateStatusEnum::RESTARTING => Some(ContainerStatus::Restarting),
        ContainerStateStatusEnum::REMOVING => Some(ContainerStatus::Removing),
        ContainerStateStatusEnum::EXITED => Some(ContainerStatus::Exited),
        ContainerStateStatusEnum::DEAD => Some(ContainerStatus::Dead),
        ContainerStateStatusEnum::EMPTY => None,
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let options = CreateContainerOptionsBuilder::default()
            .name(&spec.name)
            .build();

        let response = self
            .client
            .create_container(Some(options), container_body(spec))
            .await
            .map_err(map_error)?;

        for warning in &response.warnings {
            debug!(container = %spec.name, warning = %warning, "docker create warning");
        }
        Ok(response.id)
    }

    async fn start(
        &self,
        container_id: &str,
        checkpoint: Option<&str>,
    ) -> Result<(), RuntimeError> {
        if let Some(checkpoint) = checkpoint {
            return Err(RuntimeError::Unsupported(format!(
                "docker engine API does not expose checkpoint restore ({})",
                checkpoint
            )));
        }
        self.client
            .start_container(container_id, None::<StartContainerOptions>)
            .await
            .map_err(map_error)
    }

    async fn stop(&self, container_id: &str, request: &StopRequest) -> Result<(), RuntimeError> {
        let timeout = i32::try_from(request.timeout.as_secs()).unwrap_or(i32::MAX);
        let mut options = StopContainerOptionsBuilder::default().t(timeout);
        if let Some(signal) = request.signal {
            options = options.signal(signal.as_str());
        }

        self.client
            .stop_container(container_id, Some(options.build()))
            .await
            .map_err(map_error)
    }

    async fn remove(
        &self,
        container_id: &str,
        request: &RemoveRequest,
    ) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptionsBuilder::default()
            .v(request.remove_volumes)
            .force(request.force)
            .build();

        self.client
            .remove_container(container_id, Some(options))
            .await
            .map_err(map_error)
    }

    async fn inspect(&self, container_id: &str) -> Result<ContainerStatus, RuntimeError> {
        let info = self
            .client
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
            .map_err(map_error)?;

        info.state
            .and_then(|state| state.status)
            .and_then(container_status)
            .ok_or_else(|| {
                RuntimeError::Other(format!("runtime reported no status for {}", container_id))
            })
    }
}
