//! Player configuration
//!
//! Everything here is operator-supplied. The engine tuning is not: it is
//! fixed in [`crate::engine::EngineConfig`].

use crate::{recovery::RecoveryPolicy, resolver::DEFAULT_RELAY_PREFIX, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Preset slots every configuration starts with, unconfigured
pub const DEFAULT_PRESETS: [&str; 2] = ["willow", "sky"];

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Path prefix the relay is mounted under; must start and end with `/`
    pub relay_prefix: String,
    /// Named preset stream URLs. Empty values mean "not configured".
    pub presets: BTreeMap<String, String>,
    /// Recovery ceilings
    pub recovery: RecoveryPolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            relay_prefix: DEFAULT_RELAY_PREFIX.to_string(),
            presets: DEFAULT_PRESETS
                .iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
            recovery: RecoveryPolicy::default(),
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.relay_prefix.starts_with('/') || !self.relay_prefix.ends_with('/') {
            return Err(Error::InvalidConfig(format!(
                "relay_prefix must start and end with '/': {:?}",
                self.relay_prefix
            )));
        }
        Ok(())
    }

    /// Add or replace a preset
    pub fn with_preset(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.presets.insert(name.into(), url.into());
        self
    }

    /// Configured URL for a preset; empty or missing presets yield `None`
    pub fn preset_url(&self, name: &str) -> Option<&str> {
        self.presets
            .get(name)
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
    }
}
