use std::error::Error;

use orchestrator::{
    DockerRuntime, LifecycleClient, OrchestratorConfig,
    events::{Event, EventKind},
    node::{Node, ResourceRequest},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = OrchestratorConfig::load(&path)?;
    config.validate()?;

    info!(
        cluster = %config.cluster_name,
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        services = config.services.len(),
        "starting orchestrator"
    );

    let node = Node::local("local", "127.0.0.1");
    let event = Event::node(EventKind::NodeAdded, &node, "local node registered");
    info!(
        event = %event.id(),
        node = %node.id,
        cpu = node.capacity().cpu,
        memory = node.capacity().memory,
        "{}",
        event.message()
    );

    for service in &config.services {
        let request = ResourceRequest::for_service(service);
        let replicas = f64::from(service.replicas.max(1));
        if request.cpu * replicas > node.capacity().cpu {
            warn!(service = %service.name, "requested cpu exceeds local node capacity");
        }
    }

    let runtime = DockerRuntime::connect()?;
    runtime.ping().await?;
    let client = LifecycleClient::new(runtime, config.lifecycle.clone());
    info!(
        stop_timeout = ?client.options().stop_timeout(),
        "container runtime ready"
    );

    Ok(())
}
