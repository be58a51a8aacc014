//! Recording in-memory runtime for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{
    runtime::{ContainerRuntime, RuntimeError},
    types::{ContainerSpec, ContainerStatus, RemoveRequest, StopRequest, StopSignal},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(ContainerSpec),
    Start {
        id: String,
        checkpoint: Option<String>,
    },
    Stop {
        id: String,
        request: StopRequest,
    },
    Remove {
        id: String,
        request: RemoveRequest,
    },
    Inspect(String),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    /// id -> (name, status)
    containers: HashMap<String, (String, ContainerStatus)>,
    rejected_signals: HashSet<StopSignal>,
    stalled: bool,
    next_id: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MockRuntime {
    state: Arc<Mutex<State>>,
}

impl MockRuntime {
    pub fn reject_signal(&self, signal: StopSignal) {
        self.state.lock().unwrap().rejected_signals.insert(signal);
    }

    /// Every later call is recorded and then never completes.
    pub fn stall(&self) {
        self.state.lock().unwrap().stalled = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn created(&self) -> Vec<ContainerSpec> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn stop_signals(&self) -> Vec<Option<StopSignal>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Stop { request, .. } => Some(request.signal),
                _ => None,
            })
            .collect()
    }

    /// Records `call`, returning whether the runtime is stalled.
    fn record(&self, call: Call) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state.stalled
    }

    async fn stall_if(stalled: bool) {
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    fn set_status(&self, id: &str, status: ContainerStatus) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().unwrap();
        match state.containers.get_mut(id) {
            Some((_, current)) => {
                *current = status;
                Ok(())
            }
            None => Err(RuntimeError::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        Self::stall_if(self.record(Call::Create(spec.clone()))).await;

        let mut state = self.state.lock().unwrap();
        if state.containers.values().any(|(name, _)| *name == spec.name) {
            return Err(RuntimeError::Conflict(format!(
                "container name {} already in use",
                spec.name
            )));
        }
        state.next_id += 1;
        let id = format!("c{}", state.next_id);
        state
            .containers
            .insert(id.clone(), (spec.name.clone(), ContainerStatus::Created));
        Ok(id)
    }

    async fn start(
        &self,
        container_id: &str,
        checkpoint: Option<&str>,
    ) -> Result<(), RuntimeError> {
        Self::stall_if(self.record(Call::Start {
            id: container_id.to_string(),
            checkpoint: checkpoint.map(str::to_string),
        }))
        .await;
        self.set_status(container_id, ContainerStatus::Running)
    }

    async fn stop(&self, container_id: &str, request: &StopRequest) -> Result<(), RuntimeError> {
        Self::stall_if(self.record(Call::Stop {
            id: container_id.to_string(),
            request: request.clone(),
        }))
        .await;

        if let Some(signal) = request.signal {
            if self.state.lock().unwrap().rejected_signals.contains(&signal) {
                return Err(RuntimeError::Other(format!("{} rejected", signal)));
            }
        }
        self.set_status(container_id, ContainerStatus::Exited)
    }

    async fn remove(
        &self,
        container_id: &str,
        request: &RemoveRequest,
    ) -> Result<(), RuntimeError> {
        Self::stall_if(self.record(Call::Remove {
            id: container_id.to_string(),
            request: *request,
        }))
        .await;

        let mut state = self.state.lock().unwrap();
        match state.containers.get(container_id) {
            None => Err(RuntimeError::NotFound(container_id.to_string())),
            Some((_, ContainerStatus::Running)) if !request.force => Err(RuntimeError::Conflict(
                format!("container {} is running", container_id),
            )),
            Some(_) => {
                state.containers.remove(container_id);
                Ok(())
            }
        }
    }

    async fn inspect(&self, container_id: &str) -> Result<ContainerStatus, RuntimeError> {
        Self::stall_if(self.record(Call::Inspect(container_id.to_string()))).await;

        self.state
            .lock()
            .unwrap()
            .containers
            .get(container_id)
            .map(|(_, status)| *status)
            .ok_or_else(|| RuntimeError::NotFound(container_id.to_string()))
    }
}
