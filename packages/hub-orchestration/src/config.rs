use crate::error::{HubError, Result};
use crate::orchestrator::DEFAULT_MAX_CYCLES;
use crate::source::SourceConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_cycles() -> u32 {
    DEFAULT_MAX_CYCLES
}

/// Hub configuration: the deployment's base index name and the data
/// sources to register at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Base backend index name; suffixed per source when the deployment
    /// serves more than one index.
    pub index_name: String,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
}

impl HubConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(HubError::config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
