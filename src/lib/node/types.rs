use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::resources;
use crate::service::ServiceConfig;

const NANOS_PER_CORE: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Ready,
    Draining,
    Down,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCapacity {
    /// Cores.
    pub cpu: f64,
    /// Bytes.
    pub memory: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUsage {
    #[serde(rename = "cpu_usage")]
    pub cpu: f64,
    #[serde(rename = "memory_usage")]
    pub memory: i64,
}

/// CPU and memory one task needs from a node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceRequest {
    pub cpu: f64,
    pub memory: i64,
}

impl ResourceRequest {
    /// Malformed or unset limits request nothing.
    pub fn for_service(service: &ServiceConfig) -> Self {
        ResourceRequest {
            cpu: resources::parse_cpu(&service.resources.cpu).value as f64 / NANOS_PER_CORE,
            memory: resources::parse_memory(&service.resources.memory).value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    #[error("node {node} is {status:?}, not accepting tasks")]
    NotReady { node: String, status: NodeStatus },
    #[error("node {node} lacks capacity: requested {requested:?}, available {available:?}")]
    InsufficientCapacity {
        node: String,
        requested: ResourceRequest,
        available: ResourceRequest,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub address: String,
    capacity: NodeCapacity,
    #[serde(default)]
    usage: NodeUsage,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub status: NodeStatus,
}

impl Node {
    pub fn new(id: &str, address: &str, capacity: NodeCapacity) -> Self {
        Node {
            id: id.to_string(),
            address: address.to_string(),
            capacity,
            usage: NodeUsage::default(),
            labels: BTreeMap::new(),
            status: NodeStatus::Ready,
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn capacity(&self) -> NodeCapacity {
        self.capacity
    }

    pub fn usage(&self) -> NodeUsage {
        self.usage
    }

    pub fn available(&self) -> ResourceRequest {
        ResourceRequest {
            cpu: (self.capacity.cpu - self.usage.cpu).max(0.0),
            memory: (self.capacity.memory - self.usage.memory).max(0),
        }
    }

    pub fn can_fit(&self, request: &ResourceRequest) -> bool {
        let available = self.available();
        request.cpu <= available.cpu && request.memory <= available.memory
    }

    /// Accounts a placed task against this node.
    pub fn reserve(&mut self, request: &ResourceRequest) -> Result<(), NodeError> {
        match self.status {
            NodeStatus::Ready => {}
            NodeStatus::Draining | NodeStatus::Down => {
                return Err(NodeError::NotReady {
                    node: self.id.clone(),
                    status: self.status,
                });
            }
        }
        if !self.can_fit(request) {
            return Err(NodeError::InsufficientCapacity {
                node: self.id.clone(),
                requested: *request,
                available: self.available(),
            });
        }
        self.usage.cpu += request.cpu;
        self.usage.memory += request.memory;
        Ok(())
    }

    /// Returns a removed task's share. Never drops usage below zero.
    pub fn release(&mut self, request: &ResourceRequest) {
        self.usage.cpu = (self.usage.cpu - request.cpu).max(0.0);
        self.usage.memory = (self.usage.memory - request.memory).max(0);
    }
}
