use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::LifecycleOptions;
use crate::service::{ServiceConfig, ValidationError};

pub const DEFAULT_LISTEN_ADDR: &str = ":8080";
pub const DEFAULT_DATA_DIR: &str = "./orchestrator-data";
pub const DEFAULT_CLUSTER_NAME: &str = "default-cluster-name";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to create data dir {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("listen_addr is required")]
    MissingListenAddr,
    #[error("service[{index}]: {source}")]
    Service {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("service name '{0}' is used more than once")]
    DuplicateService(String),
}

/// Top-level orchestrator configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub listen_addr: String,
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub lifecycle: LifecycleOptions,
    /// Reject malformed cpu/memory strings instead of running without a limit.
    #[serde(default)]
    pub strict_resources: bool,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}
