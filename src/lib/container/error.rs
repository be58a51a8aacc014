use std::fmt;

use thiserror::Error;

use super::runtime::RuntimeError;
use crate::service::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Start,
    Stop,
    GracefulStop,
    Remove,
    Inspect,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::GracefulStop => "graceful stop",
            Operation::Remove => "remove",
            Operation::Inspect => "inspect",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The service failed validation, so nothing was sent to the runtime.
    #[error("invalid service: {source}")]
    InvalidService {
        #[source]
        source: ValidationError,
    },
    #[error("failed to create container {name} for service {service}: {source}")]
    Create {
        service: String,
        name: String,
        #[source]
        source: RuntimeError,
    },
    #[error("failed to start container {container}: {source}")]
    Start {
        container: String,
        #[source]
        source: RuntimeError,
    },
    #[error("failed to stop container {container}: {source}")]
    Stop {
        container: String,
        #[source]
        source: RuntimeError,
    },
    /// Both the soft and the forced stop failed.
    #[error("force stop of container {container} failed: {source}; soft stop failed first: {soft}")]
    ForceStop {
        container: String,
        soft: Box<LifecycleError>,
        #[source]
        source: Box<LifecycleError>,
    },
    #[error("failed to remove container {container}: {source}")]
    Remove {
        container: String,
        #[source]
        source: RuntimeError,
    },
    #[error("failed to inspect container {container}: {source}")]
    Inspect {
        container: String,
        #[source]
        source: RuntimeError,
    },
    /// The call was abandoned. The runtime may still apply it, so the caller
    /// should inspect the container before assuming anything.
    #[error("{op} of {container} cancelled")]
    Cancelled { op: Operation, container: String },
}

impl LifecycleError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LifecycleError::Cancelled { .. })
    }

    /// The runtime failure at the bottom of this error, if any.
    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        match self {
            LifecycleError::Create { source, .. }
            | LifecycleError::Start { source, .. }
            | LifecycleError::Stop { source, .. }
            | LifecycleError::Remove { source, .. }
            | LifecycleError::Inspect { source, .. } => Some(source),
            LifecycleError::ForceStop { source, .. } => source.runtime_error(),
            LifecycleError::InvalidService { .. } | LifecycleError::Cancelled { .. } => None,
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
