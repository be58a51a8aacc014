use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};

pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 30;

/// Host interface every published port listens on.
pub const ANY_HOST_IP: &str = "0.0.0.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleOptions {
    /// Seconds the runtime waits after the stop signal before killing.
    /// Zero means [`DEFAULT_STOP_TIMEOUT_SECS`].
    #[serde(default)]
    pub stop_timeout: u64,
    #[serde(default)]
    pub remove_volumes: bool,
    #[serde(default)]
    pub force_remove: bool,
    /// Deadline for a single runtime call, in seconds.
    #[serde(default)]
    pub call_timeout: Option<u64>,
}

impl LifecycleOptions {
    pub fn stop_timeout(&self) -> Duration {
        match self.stop_timeout {
            0 => Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub host_ip: String,
    /// Empty lets the runtime choose.
    pub host_port: String,
}

/// `"<port>/<protocol>"` to the bindings published for it.
pub type PortBindings = HashMap<String, Vec<PortBinding>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    No,
    Always,
    OnFailure,
    UnlessStopped,
}

/// Everything the runtime needs to create one container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub env: Vec<String>,
    pub exposed_ports: Option<BTreeSet<String>>,
    pub port_bindings: Option<PortBindings>,
    /// 0 means no limit.
    pub nano_cpus: i64,
    /// Bytes, 0 means no limit.
    pub memory: i64,
    pub restart_policy: RestartPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopSignal {
    Term,
    Kill,
    Int,
    Quit,
    Hup,
}

impl StopSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopSignal::Term => "SIGTERM",
            StopSignal::Kill => "SIGKILL",
            StopSignal::Int => "SIGINT",
            StopSignal::Quit => "SIGQUIT",
            StopSignal::Hup => "SIGHUP",
        }
    }
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRequest {
    pub timeout: Duration,
    /// `None` leaves the choice to the runtime.
    pub signal: Option<StopSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveRequest {
    pub remove_volumes: bool,
    pub force: bool,
}

/// State reported by the runtime for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ContainerStatus::Created),
            "running" => Ok(ContainerStatus::Running),
            "paused" => Ok(ContainerStatus::Paused),
            "restarting" => Ok(ContainerStatus::Restarting),
            "removing" => Ok(ContainerStatus::Removing),
            "exited" => Ok(ContainerStatus::Exited),
            "dead" => Ok(ContainerStatus::Dead),
            other => Err(format!("unknown container status '{}'", other)),
        }
    }
}

/// Progress of a graceful stop.
///
/// ```text
/// Running -> TerminatingSoft -> Stopped
///                  |
///                  v
///           TerminatingHard -> Stopped | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    TerminatingSoft,
    TerminatingHard,
    Stopped,
    Failed,
}

impl ShutdownPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShutdownPhase::Stopped | ShutdownPhase::Failed)
    }
}
