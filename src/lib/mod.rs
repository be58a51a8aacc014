//! Container lifecycle core of a single-binary orchestrator.
//!
//! Service declarations ([`service`]) are translated into runtime
//! configuration and driven through create, start, stop and remove by
//! [`container::LifecycleClient`]. [`node`], [`tasks`] and [`events`] hold
//! the placement data model a scheduler works with.

pub mod config;
pub mod container;
pub mod events;
pub mod node;
pub mod service;
pub mod tasks;

pub use config::{ConfigError, OrchestratorConfig};
pub use container::{
    ContainerRuntime, ContainerStatus, DockerRuntime, LifecycleClient, LifecycleError,
    LifecycleOptions, StopSignal,
};
pub use service::{PortMapping, Protocol, ServiceConfig};
