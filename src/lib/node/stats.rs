use sysinfo::System;

use super::types::{Node, NodeCapacity};

pub fn capacity_of(sysinfo: &System) -> NodeCapacity {
    NodeCapacity {
        cpu: sysinfo.cpus().len() as f64,
        memory: i64::try_from(sysinfo.total_memory()).unwrap_or(i64::MAX),
    }
}

impl NodeCapacity {
    /// Capacity of the host this process runs on.
    pub fn detect() -> Self {
        let mut sysinfo = System::new();
        sysinfo.refresh_cpu_all();
        sysinfo.refresh_memory();
        capacity_of(&sysinfo)
    }
}

impl Node {
    /// Registers the local host, labelled with its hostname and OS.
    pub fn local(id: &str, address: &str) -> Self {
        let hostname = System::host_name().unwrap_or_else(|| "Unknown".to_string());
        let os = System::name().unwrap_or_else(|| "Unknown".to_string());
        Node::new(id, address, NodeCapacity::detect())
            .with_label("hostname", &hostname)
            .with_label("os", &os)
    }
}
