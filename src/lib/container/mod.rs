//! Container lifecycle on a single runtime.
//!
//! [`resources`] turns service declarations into runtime units,
//! [`LifecycleClient`] issues the lifecycle verbs through a
//! [`ContainerRuntime`], and [`DockerRuntime`] talks to the Docker Engine.

pub mod client;
pub mod docker;
pub mod error;
pub mod resources;
pub mod runtime;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{LifecycleClient, build_spec, container_name};
pub use docker::DockerRuntime;
pub use error::{LifecycleError, LifecycleResult, Operation};
pub use resources::{Limit, LimitOutcome, ResourceError};
pub use runtime::{ContainerRuntime, RuntimeError};
pub use types::{
    ContainerSpec, ContainerStatus, LifecycleOptions, PortBinding, PortBindings, RemoveRequest,
    RestartPolicy, ShutdownPhase, StopRequest, StopSignal,
};
