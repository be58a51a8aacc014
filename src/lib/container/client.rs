use std::future::Future;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    error::{LifecycleError, LifecycleResult, Operation},
    resources::{self, Limit, LimitOutcome},
    runtime::{ContainerRuntime, RuntimeError},
    types::{
        ContainerSpec, ContainerStatus, LifecycleOptions, RemoveRequest, RestartPolicy,
        ShutdownPhase, StopRequest, StopSignal,
    },
};
use crate::service::ServiceConfig;

/// Drives create/start/stop/remove for service instances on one runtime.
///
/// Holds no per-container state, so one client can serve many workers as
/// long as the runtime handle is shareable.
#[derive(Debug)]
pub struct LifecycleClient<R> {
    runtime: R,
    options: LifecycleOptions,
}

impl<R: ContainerRuntime> LifecycleClient<R> {
    pub fn new(runtime: R, options: LifecycleOptions) -> Self {
        LifecycleClient { runtime, options }
    }

    pub fn options(&self) -> &LifecycleOptions {
        &self.options
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Creates the container `<service>-<instance>`. A second create for the
    /// same pair fails with the runtime's name conflict.
    ///
    /// The service is validated first; an invalid one never reaches the
    /// runtime.
    pub async fn create(
        &self,
        service: &ServiceConfig,
        instance_id: &str,
        cancel: &CancellationToken,
    ) -> LifecycleResult<String> {
        service
            .validate()
            .map_err(|source| LifecycleError::InvalidService { source })?;
        let spec = build_spec(service, instance_id);
        debug!(container = %spec.name, image = %spec.image, "creating container");

        let id = self
            .guarded(Operation::Create, &spec.name, cancel, self.runtime.create(&spec))
            .await?
            .map_err(|source| LifecycleError::Create {
                service: service.name.clone(),
                name: spec.name.clone(),
                source,
            })?;

        info!(service = %service.name, container = %spec.name, id = %id, "container created");
        Ok(id)
    }

    /// Starts a created container, asking the runtime to restore
    /// `checkpoint` when given. [`DockerRuntime`](super::DockerRuntime)
    /// refuses checkpoints, so there this fails with a start error.
    pub async fn start(
        &self,
        container_id: &str,
        checkpoint: Option<&str>,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let checkpoint = checkpoint.filter(|c| !c.is_empty());
        self.guarded(
            Operation::Start,
            container_id,
            cancel,
            self.runtime.start(container_id, checkpoint),
        )
        .await?
        .map_err(|source| LifecycleError::Start {
            container: container_id.to_string(),
            source,
        })?;

        info!(container = %container_id, checkpoint = ?checkpoint, "container started");
        Ok(())
    }

    /// Stops with the configured timeout. `None` uses the runtime's signal.
    pub async fn stop(
        &self,
        container_id: &str,
        signal: Option<StopSignal>,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let request = StopRequest {
            timeout: self.options.stop_timeout(),
            signal,
        };
        debug!(container = %container_id, signal = ?signal, "stopping container");

        self.guarded(
            Operation::Stop,
            container_id,
            cancel,
            self.runtime.stop(container_id, &request),
        )
        .await?
        .map_err(|source| LifecycleError::Stop {
            container: container_id.to_string(),
            source,
        })
    }

    /// SIGTERM, then SIGKILL if the SIGTERM request itself fails.
    pub async fn graceful_stop(
        &self,
        container_id: &str,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        self.graceful_stop_observed(container_id, cancel, |_| {}).await
    }

    /// [`graceful_stop`](Self::graceful_stop), reporting every phase entered.
    ///
    /// Escalation is decided only by the result of the soft stop call; the
    /// runtime's own stop timeout covers a container that ignores SIGTERM.
    /// A cancelled call ends the protocol without escalating and is reported
    /// as a cancelled graceful stop.
    pub async fn graceful_stop_observed<F>(
        &self,
        container_id: &str,
        cancel: &CancellationToken,
        mut observe: F,
    ) -> LifecycleResult<()>
    where
        F: FnMut(ShutdownPhase),
    {
        let cancelled = || LifecycleError::Cancelled {
            op: Operation::GracefulStop,
            container: container_id.to_string(),
        };

        observe(ShutdownPhase::Running);
        observe(ShutdownPhase::TerminatingSoft);
        let soft = match self.stop(container_id, Some(StopSignal::Term), cancel).await {
            Ok(()) => {
                observe(ShutdownPhase::Stopped);
                info!(container = %container_id, "container stopped");
                return Ok(());
            }
            Err(err) if err.is_cancelled() => return Err(cancelled()),
            Err(err) => err,
        };

        warn!(container = %container_id, error = %soft, "soft stop failed, sending SIGKILL");
        observe(ShutdownPhase::TerminatingHard);
        match self.stop(container_id, Some(StopSignal::Kill), cancel).await {
            Ok(()) => {
                observe(ShutdownPhase::Stopped);
                info!(container = %container_id, "container killed");
                Ok(())
            }
            Err(err) if err.is_cancelled() => Err(cancelled()),
            Err(err) => {
                observe(ShutdownPhase::Failed);
                Err(LifecycleError::ForceStop {
                    container: container_id.to_string(),
                    soft: Box::new(soft),
                    source: Box::new(err),
                })
            }
        }
    }

    pub async fn remove(
        &self,
        container_id: &str,
        cancel: &CancellationToken,
    ) -> LifecycleResult<()> {
        let request = RemoveRequest {
            remove_volumes: self.options.remove_volumes,
            force: self.options.force_remove,
        };
        self.guarded(
            Operation::Remove,
            container_id,
            cancel,
            self.runtime.remove(container_id, &request),
        )
        .await?
        .map_err(|source| LifecycleError::Remove {
            container: container_id.to_string(),
            source,
        })?;

        info!(container = %container_id, "container removed");
        Ok(())
    }

    pub async fn inspect(
        &self,
        container_id: &str,
        cancel: &CancellationToken,
    ) -> LifecycleResult<ContainerStatus> {
        self.guarded(
            Operation::Inspect,
            container_id,
            cancel,
            self.runtime.inspect(container_id),
        )
        .await?
        .map_err(|source| LifecycleError::Inspect {
            container: container_id.to_string(),
            source,
        })
    }

    /// Runs one runtime call under the caller's token and the configured
    /// call deadline. The outer error is cancellation, the inner one is the
    /// runtime's.
    async fn guarded<T, Fut>(
        &self,
        op: Operation,
        container: &str,
        cancel: &CancellationToken,
        call: Fut,
    ) -> LifecycleResult<Result<T, RuntimeError>>
    where
        Fut: Future<Output = Result<T, RuntimeError>>,
    {
        let cancelled = || LifecycleError::Cancelled {
            op,
            container: container.to_string(),
        };
        let deadline = self.options.call_timeout();
        let call = async move {
            match deadline {
                Some(limit) => time::timeout(limit, call).await.ok(),
                None => Some(call.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(container = %container, op = %op, "runtime call cancelled");
                Err(cancelled())
            }
            outcome = call => outcome.ok_or_else(|| {
                warn!(container = %container, op = %op, "runtime call timed out");
                cancelled()
            }),
        }
    }
}

/// Runtime configuration for one instance of `service`.
pub fn build_spec(service: &ServiceConfig, instance_id: &str) -> ContainerSpec {
    let name = container_name(&service.name, instance_id);
    let nano_cpus = limit_or_warn(&name, "cpu", resources::parse_cpu(&service.resources.cpu));
    let memory = limit_or_warn(
        &name,
        "memory",
        resources::parse_memory(&service.resources.memory),
    );

    ContainerSpec {
        name,
        image: service.image.clone(),
        env: resources::convert_env(&service.environment),
        exposed_ports: resources::exposed_ports(&service.ports),
        port_bindings: resources::convert_ports(&service.ports),
        nano_cpus,
        memory,
        restart_policy: RestartPolicy::UnlessStopped,
    }
}

/// `<service>-<instance>`, unique per instance on a runtime.
pub fn container_name(service: &str, instance_id: &str) -> String {
    format!("{}-{}", service, instance_id)
}

fn limit_or_warn(container: &str, resource: &str, limit: Limit) -> i64 {
    if let LimitOutcome::Malformed(err) = &limit.outcome {
        warn!(container = %container, resource, error = %err, "ignoring malformed limit");
    }
    limit.value
}
