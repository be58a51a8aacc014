use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::Node;
use crate::tasks::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ServiceDeployed,
    ServiceScaled,
    ServiceRemoved,
    NodeAdded,
    NodeDraining,
    NodeRemoved,
    TaskStarted,
    TaskStopped,
    TaskFailed,
}

/// Audit record. Built once, never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: uuid::Uuid,
    kind: EventKind,
    message: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    payload: Value,
}

impl Event {
    pub fn new(kind: EventKind, message: impl Into<String>, payload: Value) -> Self {
        Event {
            id: uuid::Uuid::new_v4(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn task(kind: EventKind, task: &Task, message: impl Into<String>) -> Self {
        let payload = serde_json::json!({
            "task_id": task.id,
            "service": task.service,
            "node": task.node,
            "container_id": task.container_id,
            "status": task.status,
        });
        Event::new(kind, message, payload)
    }

    pub fn node(kind: EventKind, node: &Node, message: impl Into<String>) -> Self {
        let payload = serde_json::json!({
            "node_id": node.id,
            "address": node.address,
            "status": node.status,
        });
        Event::new(kind, message, payload)
    }

    pub fn service_scaled(service: &str, from: u32, to: u32) -> Self {
        Event::new(
            EventKind::ServiceScaled,
            format!("service {} scaled from {} to {} replicas", service, from, to),
            serde_json::json!({ "service": service, "from": from, "to": to }),
        )
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}
