//! Configuration management
//!
//! Settings live in `~/.wikai/config.yaml`. Environment variables take
//! precedence over the file:
//! - `WIKAI_PATTERNS_DIR` overrides `patterns_dir`
//! - `WIKAI_STABILITY_THRESHOLD` overrides `stability_threshold`
//! - `WIKAI_SYSTEM_NAME` overrides `system_name`

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::observer::{ObserverConfig, DEFAULT_BUFFER_SIZE, DEFAULT_STABILITY_THRESHOLD};
use crate::storage::UNKNOWN_ORIGIN;

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "patterns_dir",
    "stability_threshold",
    "auto_capture",
    "system_name",
    "require_convergence_event",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where patterns are stored (defaults to `~/.wikai/patterns`)
    pub patterns_dir: Option<PathBuf>,

    /// Observer settings
    pub stability_threshold: f64,
    pub auto_capture: bool,
    pub system_name: String,
    pub require_convergence_event: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patterns_dir: None,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            auto_capture: true,
            system_name: UNKNOWN_ORIGIN.to_string(),
            require_convergence_event: false,
        }
    }
}

impl Config {
    /// Loads the config file (if present) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads a config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_saphyr::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config file atomically, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_saphyr::to_string(self).context("Failed to serialize config")?;

        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, content).context("Failed to write config temp file")?;
        fs::rename(&temp_path, path).context("Failed to rename config file")?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Applies overrides read through `lookup` (normally the environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("WIKAI_PATTERNS_DIR").filter(|v| !v.is_empty()) {
            self.patterns_dir = Some(PathBuf::from(dir));
        }
        if let Some(threshold) = lookup("WIKAI_STABILITY_THRESHOLD") {
            self.stability_threshold = threshold
                .trim()
                .parse()
                .with_context(|| format!("WIKAI_STABILITY_THRESHOLD is not a number: '{threshold}'"))?;
        }
        if let Some(name) = lookup("WIKAI_SYSTEM_NAME").filter(|v| !v.is_empty()) {
            self.system_name = name;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.stability_threshold) {
            bail!(
                "stability_threshold must be between 0 and 1, got {}",
                self.stability_threshold
            );
        }
        Ok(())
    }

    /// Reads a setting by key, formatted for display.
    pub fn get(&self, key: &str) -> Result<String> {
        Ok(match key {
            "patterns_dir" => self.patterns_dir()?.display().to_string(),
            "stability_threshold" => self.stability_threshold.to_string(),
            "auto_capture" => self.auto_capture.to_string(),
            "system_name" => self.system_name.clone(),
            "require_convergence_event" => self.require_convergence_event.to_string(),
            other => bail!(
                "Unknown config key '{other}'. Expected one of: {}",
                CONFIG_KEYS.join(", ")
            ),
        })
    }

    /// Updates a setting from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "patterns_dir" => self.patterns_dir = Some(PathBuf::from(value)),
            "stability_threshold" => {
                self.stability_threshold = value
                    .parse()
                    .with_context(|| format!("'{value}' is not a number"))?;
            }
            "auto_capture" => self.auto_capture = parse_bool(value)?,
            "system_name" => self.system_name = value.to_string(),
            "require_convergence_event" => self.require_convergence_event = parse_bool(value)?,
            other => bail!(
                "Unknown config key '{other}'. Expected one of: {}",
                CONFIG_KEYS.join(", ")
            ),
        }
        self.validate()
    }

    /// Resolved patterns directory.
    pub fn patterns_dir(&self) -> Result<PathBuf> {
        match &self.patterns_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::wikai_dir()?.join("patterns")),
        }
    }

    /// Observer policy derived from these settings.
    pub fn observer_config(&self) -> ObserverConfig {
        ObserverConfig {
            auto_capture: self.auto_capture,
            stability_threshold: self.stability_threshold,
            system_name: self.system_name.clone(),
            require_convergence_event: self.require_convergence_event,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::wikai_dir()?.join("config.yaml"))
    }

    fn wikai_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
            .join(".wikai"))
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("'{other}' is not a boolean (use true or false)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.stability_threshold, 0.8);
        assert!(config.auto_capture);
        assert_eq!(config.system_name, "unknown");
        assert!(config.patterns_dir.is_none());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = Config::from_yaml("stability_threshold: 0.9\nsystem_name: Arena\n").unwrap();
        assert_eq!(config.stability_threshold, 0.9);
        assert_eq!(config.system_name, "Arena");
        assert!(config.auto_capture);
    }

    #[test]
    fn test_from_yaml_empty() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_from_yaml_rejects_out_of_range_threshold() {
        assert!(Config::from_yaml("stability_threshold: 1.5\n").is_err());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.set("system_name", "Forge").unwrap();
        config.set("stability_threshold", "0.75").unwrap();
        config.set("auto_capture", "false").unwrap();
        config.set("patterns_dir", "/tmp/commons").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WIKAI_PATTERNS_DIR", "/srv/patterns"),
            ("WIKAI_STABILITY_THRESHOLD", "0.6"),
            ("WIKAI_SYSTEM_NAME", "Host"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.patterns_dir().unwrap(), PathBuf::from("/srv/patterns"));
        assert_eq!(config.stability_threshold, 0.6);
        assert_eq!(config.system_name, "Host");
    }

    #[test]
    fn test_override_rejects_bad_threshold() {
        let mut config = Config::default();
        let result = config.apply_overrides(|k| {
            (k == "WIKAI_STABILITY_THRESHOLD").then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_get_and_set() {
        let mut config = Config::default();
        config.set("require_convergence_event", "yes").unwrap();
        assert_eq!(config.get("require_convergence_event").unwrap(), "true");
        assert!(config.set("stability_threshold", "2").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert!(config.get("colour").is_err());
    }

    #[test]
    fn test_observer_config() {
        let mut config = Config::default();
        config.system_name = "Forge".to_string();
        config.stability_threshold = 0.7;

        let observer = config.observer_config();
        assert_eq!(observer.system_name, "Forge");
        assert_eq!(observer.stability_threshold, 0.7);
        assert!(observer.auto_capture);
    }
}
