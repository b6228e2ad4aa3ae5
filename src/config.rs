use std::fs;
use std::path::{Path, PathBuf};

use log::{info, trace, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    pub addons_dir: PathBuf,
    pub log_level: String,
    pub unknown_command_message: String,
    pub disabled_addons: Vec<String>,
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<HostConfig, ConfigError> {
        load_or_create(path)
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled_addons.iter().any(|disabled| disabled == id)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            addons_dir: PathBuf::from("./addons"),
            log_level: String::from("info"),
            unknown_command_message: String::from("&cUnknown command. Type \"help\" for help."),
            disabled_addons: Vec::new(),
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

pub fn load_or_create<T>(path: &Path) -> Result<T, ConfigError>
where
    T: Serialize + DeserializeOwned + Default + std::fmt::Debug,
{
    if path.exists() {
        let config = read(path)?;

        info!("Successfully loaded {}!", display(path));

        Ok(config)
    } else {
        warn!("Configuration file {} not found, writing defaults.", display(path));
        let config = T::default();

        trace!("Default configuration: {:?}", config);
        save(path, &config)?;

        Ok(config)
    }
}

pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: display(path), source })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: display(path), source })
}

pub fn save<T: Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let raw = toml::to_string(config)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io { path: display(parent), source })?;
    }

    fs::write(path, raw).map_err(|source| ConfigError::Io { path: display(path), source })
}
