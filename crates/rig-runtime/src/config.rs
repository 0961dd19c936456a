//! Engine configuration loaded from YAML.

use std::fs;
use std::path::Path;

use rig_core::Budget;
use rig_oracle::OracleConfig;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// How results of overlapping cascades are merged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOrdering {
    /// Every step result is merged as it lands, whichever run produced it.
    #[default]
    LastFieldWins,
    /// Step results from a run older than the newest merged run are dropped.
    LastRunWins,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub oracle: OracleConfig,
    pub ordering: RunOrdering,
    /// Budget of a fresh session and after a reset.
    pub default_budget: Budget,
    /// Buffer of the cascade event channel.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            ordering: RunOrdering::default(),
            default_budget: Budget::default(),
            event_capacity: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, EngineError> {
        let cfg: EngineConfig =
            serde_yaml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.event_capacity == 0 {
            return Err(EngineError::Config(
                "event_capacity must be at least 1".into(),
            ));
        }
        if self.oracle.max_attempts == 0 {
            return Err(EngineError::Config("oracle.max_attempts must be at least 1".into()));
        }
        if self.oracle.base_url.trim().is_empty() {
            return Err(EngineError::Config("oracle.base_url is empty".into()));
        }
        Ok(())
    }
}
