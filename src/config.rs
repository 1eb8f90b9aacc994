use std::env;
use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::Result;

/// Environment variable holding the model config list: either a path to a
/// JSON file or the JSON itself.
pub const CONFIG_LIST_ENV: &str = "OAI_CONFIG_LIST";

/// One entry of the model config list.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Non-empty, ordered list of model configurations.
#[derive(Debug, Clone)]
pub struct ConfigList {
    entries: Vec<ModelConfig>,
}

impl ConfigList {
    /// Load from an environment variable whose value is either a path to a
    /// JSON file or inline JSON.
    pub fn from_env(var: &str) -> Result<Self> {
        let value = env::var(var)
            .map_err(|_| crate::string_error!("environment variable {} is not set", var))?;

        if Path::new(&value).is_file() {
            Self::from_file(&value)
        } else {
            Self::from_json(&value)
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        info!("Loaded model config list from {}", path);
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ModelConfig> = serde_json::from_str(json)?;
        if entries.is_empty() {
            crate::bail!("model config list is empty");
        }
        Ok(Self { entries })
    }

    /// Keep only entries whose model name is in the allow-list. Order is
    /// preserved; an empty result is an error.
    pub fn filter_models(&self, allowed: &[&str]) -> Result<Self> {
        let entries: Vec<ModelConfig> = self
            .entries
            .iter()
            .filter(|e| allowed.contains(&e.model.as_str()))
            .cloned()
            .collect();
        if entries.is_empty() {
            crate::bail!("no config entry matches models {:?}", allowed);
        }
        Ok(Self { entries })
    }

    /// The entry used to configure the client. The list is non-empty by
    /// construction.
    pub fn first(&self) -> &ModelConfig {
        &self.entries[0]
    }

    pub fn entries(&self) -> &[ModelConfig] {
        &self.entries
    }
}
