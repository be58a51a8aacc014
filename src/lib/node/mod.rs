pub mod stats;
pub mod types;

pub use types::{Node, NodeCapacity, NodeError, NodeStatus, NodeUsage, ResourceRequest};
