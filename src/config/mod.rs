
use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::target::BackendKind;

/// Path of the configuration file loaded when none is given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/xusbd/config.yaml";

/// Default bound on queued input tasks per slot
pub const DEFAULT_MAX_PENDING_INPUTS: usize = 64;

/// Represents all possible errors loading a [Config]
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Daemon configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Number of input reports that may wait on one slot's queue. Reports
    /// past this bound are dropped; each report carries the full controller
    /// state, so a later one supersedes them.
    pub max_pending_inputs: usize,
    /// Ask wireless adapters to resend the state of already connected
    /// controllers when an interface is attached
    pub presence_query_on_attach: bool,
    /// Show the "not connected" LED pattern when an interface is torn down
    pub teardown_led: bool,
    /// Prefix for the names of virtual devices
    pub device_name_prefix: Option<String>,
    /// Backend used to create virtual devices
    pub backend: BackendKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_pending_inputs: DEFAULT_MAX_PENDING_INPUTS,
            presence_query_on_attach: true,
            teardown_led: true,
            device_name_prefix: None,
            backend: BackendKind::default(),
        }
    }
}

impl Config {
    /// Load a [Config] from the given YAML string
    pub fn from_yaml(content: String) -> Result<Config, LoadError> {
        let config: Config = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load a [Config] from the given YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Config, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Load the configuration from the given path. Without an explicit path
    /// the default file is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Config, LoadError> {
        if let Some(path) = path {
            log::debug!("Loading config from {path:?}");
            return Config::from_yaml_file(path);
        }

        let path = Path::new(DEFAULT_CONFIG_PATH);
        if !path.exists() {
            log::debug!("No config found at {DEFAULT_CONFIG_PATH}, using defaults");
            return Ok(Config::default());
        }
        log::debug!("Loading config from {DEFAULT_CONFIG_PATH}");
        Config::from_yaml_file(path)
    }
}
