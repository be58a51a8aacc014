use async_trait::async_trait;
use thiserror::Error;

use super::types::{ContainerSpec, ContainerStatus, RemoveRequest, StopRequest};

/// Failure reported by a container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The request conflicts with current state, e.g. a duplicate name.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Docker(#[from] bollard::errors::Error),
    #[error("{0}")]
    Other(String),
}

/// One container runtime on one node.
///
/// Implementations must be safe to call concurrently for different
/// containers. Calls for the same container are arbitrated by the runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Creates a container and returns its runtime identifier.
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;

    async fn start(&self, container_id: &str, checkpoint: Option<&str>)
    -> Result<(), RuntimeError>;

    async fn stop(&self, container_id: &str, request: &StopRequest) -> Result<(), RuntimeError>;

    async fn remove(&self, container_id: &str, request: &RemoveRequest)
    -> Result<(), RuntimeError>;

    async fn inspect(&self, container_id: &str) -> Result<ContainerStatus, RuntimeError>;
}
