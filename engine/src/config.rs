use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rules config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid rules config: {0}")]
    Invalid(String),
}

/// Tunable constants of the rules core. Every field has a default, so a
/// config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    pub defense_base: i32,
    pub trained_skill_bonus: i32,
    pub skill_focus_bonus: i32,
    /// First character level grants `hit_die * multiplier`.
    pub first_level_hit_die_multiplier: i32,
    pub minimum_hp: i32,
    pub ability_total_min: i32,
    pub ability_total_max: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            defense_base: 10,
            trained_skill_bonus: 5,
            skill_focus_bonus: 5,
            first_level_hit_die_multiplier: 3,
            minimum_hp: 1,
            ability_total_min: 1,
            ability_total_max: 40,
        }
    }
}

impl RulesConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: RulesConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ability_total_min > self.ability_total_max {
            return Err(ConfigError::Invalid(format!(
                "ability_total_min {} exceeds ability_total_max {}",
                self.ability_total_min, self.ability_total_max
            )));
        }
        if self.minimum_hp < 0 {
            return Err(ConfigError::Invalid(format!(
                "minimum_hp must be non-negative, got {}",
                self.minimum_hp
            )));
        }
        if self.first_level_hit_die_multiplier < 1 {
            return Err(ConfigError::Invalid(format!(
                "first_level_hit_die_multiplier must be at least 1, got {}",
                self.first_level_hit_die_multiplier
            )));
        }
        Ok(())
    }
}
