use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::{ContainerStatus, client::container_name};
use crate::service::{PortMapping, ServiceConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Stopped,
    Failed,
}

impl TaskStatus {
    /// Task view of an observed container state.
    pub fn from_container(status: ContainerStatus) -> Self {
        match status {
            ContainerStatus::Running | ContainerStatus::Restarting => TaskStatus::Running,
            ContainerStatus::Created
            | ContainerStatus::Paused
            | ContainerStatus::Removing
            | ContainerStatus::Exited => TaskStatus::Stopped,
            ContainerStatus::Dead => TaskStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("task {task}: invalid state transition from {from:?} to {to:?}")]
    InvalidTransition {
        task: uuid::Uuid,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// One placed instance of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: uuid::Uuid,
    pub service: String,
    pub node: String,
    pub instance: String,
    pub image: String,
    pub container_id: Option<String>,
    pub status: TaskStatus,
    pub ports: Vec<PortMapping>,
    pub environment: BTreeMap<String, String>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Task {
    /// A desired instance of `service` on `node`. The task starts out
    /// `Running` as the desired state.
    pub fn new(service: &ServiceConfig, node: &str, instance: &str) -> Self {
        Task {
            id: uuid::Uuid::new_v4(),
            service: service.name.clone(),
            node: node.to_string(),
            instance: instance.to_string(),
            image: service.image.clone(),
            container_id: None,
            status: TaskStatus::Running,
            ports: service.ports.clone(),
            environment: service.environment.clone(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Name the container for this task is created under.
    pub fn container_name(&self) -> String {
        container_name(&self.service, &self.instance)
    }
}
