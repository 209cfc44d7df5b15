use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::host::CredentialStore;

/// Key/value settings of one skill (e.g. `API_KEY`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSettings {
    pub values: HashMap<String, String>,
}

impl SkillSettings {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl CredentialStore for SkillSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional override of the provider base URL.
    pub base_url: Option<String>,

    /// Example TOML:
    /// [skills.weather]
    /// API_KEY = "..."
    #[serde(default)]
    pub skills: HashMap<String, SkillSettings>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-skill", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Settings of `skill`; empty if none are stored.
    pub fn skill_settings(&self, skill: &str) -> SkillSettings {
        self.skills.get(skill).cloned().unwrap_or_default()
    }

    /// Set/replace one value of a skill's settings.
    pub fn upsert_skill_value(&mut self, skill: &str, key: &str, value: String) {
        self.skills.entry(skill.to_string()).or_default().set(key, value);
    }

    pub fn is_skill_configured(&self, skill: &str, key: &str) -> bool {
        self.skills.get(skill).is_some_and(|s| s.values.contains_key(key))
    }
}
