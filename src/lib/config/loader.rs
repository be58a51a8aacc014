use std::{collections::HashSet, fs, path::Path};

use tracing::debug;

use super::types::{
    ConfigError, DEFAULT_CLUSTER_NAME, DEFAULT_DATA_DIR, DEFAULT_LISTEN_ADDR, OrchestratorConfig,
};

impl OrchestratorConfig {
    /// Parses a YAML document and fills in defaults. Does not touch disk.
    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        let mut config: OrchestratorConfig = serde_yaml::from_str(data)?;
        config.apply_defaults();
        Ok(config)
    }

    /// Reads `path`, applies defaults and creates the data directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&data)?;

        fs::create_dir_all(&config.data_dir).map_err(|source| ConfigError::DataDir {
            path: config.data_dir.clone(),
            source,
        })?;
        debug!(path = %path.display(), services = config.services.len(), "config loaded");
        Ok(config)
    }

    fn apply_defaults(&mut self) {
        if self.listen_addr.is_empty() {
            self.listen_addr = DEFAULT_LISTEN_ADDR.to_string();
        }
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = DEFAULT_DATA_DIR.into();
        }
        if self.cluster_name.is_empty() {
            self.cluster_name = DEFAULT_CLUSTER_NAME.to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::MissingListenAddr);
        }

        let mut names = HashSet::new();
        for (index, service) in self.services.iter().enumerate() {
            service
                .validate()
                .map_err(|source| ConfigError::Service { index, source })?;
            if self.strict_resources {
                service
                    .check_resources()
                    .map_err(|source| ConfigError::Service { index, source })?;
            }
            if !names.insert(service.name.as_str()) {
                return Err(ConfigError::DuplicateService(service.name.clone()));
            }
        }
        Ok(())
    }
}
