use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use orchestrator::{
    ContainerRuntime, ContainerStatus, LifecycleClient, LifecycleError, OrchestratorConfig,
    StopSignal,
    container::{ContainerSpec, RemoveRequest, RuntimeError, StopRequest},
    events::{Event, EventKind},
    service::ValidationError,
    tasks::{Task, TaskStatus},
};
use tokio_util::sync::CancellationToken;

/// Runtime whose containers ignore SIGTERM requests for the names listed in
/// `stubborn`.
#[derive(Clone, Default)]
struct Daemon {
    containers: Arc<Mutex<HashMap<String, (ContainerSpec, ContainerStatus)>>>,
    stubborn: Arc<Mutex<Vec<String>>>,
}

impl Daemon {
    fn spec(&self, id: &str) -> ContainerSpec {
        self.containers.lock().unwrap()[id].0.clone()
    }
}

#[async_trait]
impl ContainerRuntime for Daemon {
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let mut containers = self.containers.lock().unwrap();
        if containers.values().any(|(s, _)| s.name == spec.name) {
            return Err(RuntimeError::Conflict(spec.name.clone()));
        }
        let id = format!("{:012}", containers.len() + 1);
        containers.insert(id.clone(), (spec.clone(), ContainerStatus::Created));
        Ok(id)
    }

    async fn start(&self, id: &str, _checkpoint: Option<&str>) -> Result<(), RuntimeError> {
        match self.containers.lock().unwrap().get_mut(id) {
            Some((_, status)) => {
                *status = ContainerStatus::Running;
                Ok(())
            }
            None => Err(RuntimeError::NotFound(id.to_string())),
        }
    }

    async fn stop(&self, id: &str, request: &StopRequest) -> Result<(), RuntimeError> {
        let mut containers = self.containers.lock().unwrap();
        let Some((spec, status)) = containers.get_mut(id) else {
            return Err(RuntimeError::NotFound(id.to_string()));
        };
        if request.signal == Some(StopSignal::Term)
            && self.stubborn.lock().unwrap().contains(&spec.name)
        {
            return Err(RuntimeError::Other("daemon timed out sending SIGTERM".to_string()));
        }
        *status = ContainerStatus::Exited;
        Ok(())
    }

    async fn remove(&self, id: &str, request: &RemoveRequest) -> Result<(), RuntimeError> {
        let mut containers = self.containers.lock().unwrap();
        match containers.get(id) {
            Some((_, ContainerStatus::Running)) if !request.force => {
                Err(RuntimeError::Conflict(format!("{} is running", id)))
            }
            Some(_) => {
                containers.remove(id);
                Ok(())
            }
            None => Err(RuntimeError::NotFound(id.to_string())),
        }
    }

    async fn inspect(&self, id: &str) -> Result<ContainerStatus, RuntimeError> {
        self.containers
            .lock()
            .unwrap()
            .get(id)
            .map(|(_, status)| *status)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }
}

const CONFIG: &str = r#"
services:
  - name: web
    image: nginx
    replicas: 2
    ports:
      - container_port: 80
        protocol: tcp
    resources:
      cpu: "0.5"
      memory: 256m
  - name: cache
    image: redis:7
    environment:
      MAXMEMORY: 64mb
"#;

#[tokio::test]
async fn deploy_and_drain_configured_services() {
    let config = OrchestratorConfig::from_yaml(CONFIG).unwrap();
    config.validate().unwrap();

    let daemon = Daemon::default();
    let client = LifecycleClient::new(daemon.clone(), config.lifecycle.clone());
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();
    let mut events = Vec::new();

    for service in &config.services {
        for replica in 0..service.replicas.max(1) {
            let instance = format!("r{}", replica);
            let mut task = Task::new(service, "local", &instance);
            let id = client.create(service, &instance, &cancel).await.unwrap();
            client.start(&id, None, &cancel).await.unwrap();
            task.bind_container(&id);
            events.push(Event::task(EventKind::TaskStarted, &task, "started"));
            tasks.push(task);
        }
    }
    assert_eq!(tasks.len(), 3);

    let web = tasks.iter().find(|t| t.container_name() == "web-r0").unwrap();
    let spec = daemon.spec(web.container_id.as_deref().unwrap());
    assert_eq!(spec.nano_cpus, 500_000_000);
    assert_eq!(spec.memory, 268_435_456);
    assert!(spec.exposed_ports.unwrap().contains("80/tcp"));

    let cache = tasks.iter().find(|t| t.service == "cache").unwrap();
    let spec = daemon.spec(cache.container_id.as_deref().unwrap());
    assert_eq!(spec.env, vec!["MAXMEMORY=64mb"]);
    assert_eq!(spec.port_bindings, None);

    // web-r1 ignores SIGTERM and has to be killed.
    daemon.stubborn.lock().unwrap().push("web-r1".to_string());

    for task in &mut tasks {
        let id = task.container_id.clone().unwrap();
        client.graceful_stop(&id, &cancel).await.unwrap();

        let observed = client.inspect(&id, &cancel).await.unwrap();
        task.transition(TaskStatus::from_container(observed)).unwrap();
        assert_eq!(task.status, TaskStatus::Stopped);

        client.remove(&id, &cancel).await.unwrap();
        events.push(Event::task(EventKind::TaskStopped, task, "drained"));
    }

    assert!(daemon.containers.lock().unwrap().is_empty());
    assert_eq!(events.len(), 6);
}

#[tokio::test]
async fn recreating_a_live_instance_conflicts() {
    let config = OrchestratorConfig::from_yaml(CONFIG).unwrap();
    let client = LifecycleClient::new(Daemon::default(), config.lifecycle.clone());
    let cancel = CancellationToken::new();
    let web = &config.services[0];

    client.create(web, "a1", &cancel).await.unwrap();
    let err = client.create(web, "a1", &cancel).await.unwrap_err();

    match err {
        LifecycleError::Create { name, source, .. } => {
            assert_eq!(name, "web-a1");
            assert!(matches!(source, RuntimeError::Conflict(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn duplicate_port_mappings_never_reach_the_daemon() {
    let doc = r#"
services:
  - name: web
    image: nginx
    ports:
      - container_port: 80
        host_port: 8080
      - container_port: 80
        host_port: 9090
"#;
    // Parsing alone accepts the document; create still refuses it.
    let config = OrchestratorConfig::from_yaml(doc).unwrap();
    let daemon = Daemon::default();
    let client = LifecycleClient::new(daemon.clone(), config.lifecycle.clone());

    let err = client
        .create(&config.services[0], "a1", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::InvalidService {
            source: ValidationError::DuplicatePort { port: 80, .. }
        }
    ));
    assert!(daemon.containers.lock().unwrap().is_empty());
}
