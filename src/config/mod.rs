//! Configuration management for monitord
//!
//! This module handles loading, parsing, and validating configuration
//! from an optional TOML file. Every section falls back to its defaults,
//! so an absent file is equivalent to an empty one.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::OutputNames;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "MONITORD_CONFIG";

/// Config file location used when the environment does not name one
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/monitord/monitord.toml";

/// Main configuration struct containing all monitord settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MonitordConfig {
    /// Which outputs are the external monitor and the internal panel
    #[serde(default)]
    pub outputs: OutputNames,

    /// Display configuration command
    #[serde(default)]
    pub display: DisplayConfig,

    /// Lid-switch inhibitor request parameters
    #[serde(default)]
    pub inhibitor: InhibitorConfig,

    /// General daemon settings
    #[serde(default)]
    pub general: GeneralConfig,
}

/// External display configuration tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Program invoked with xrandr-style arguments
    pub command: String,
}

/// Parameters of the logind Inhibit call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InhibitorConfig {
    /// Colon-separated inhibitor kinds
    pub what: String,

    /// Application name shown by `systemd-inhibit --list`
    pub who: String,

    /// Human readable reason
    pub why: String,

    /// "block" or "delay"
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneralConfig {
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            command: "xrandr".to_string(),
        }
    }
}

impl Default for InhibitorConfig {
    fn default() -> Self {
        Self {
            what: "handle-lid-switch".to_string(),
            who: "monitord".to_string(),
            why: "External monitor in use".to_string(),
            mode: "block".to_string(),
        }
    }
}

impl MonitordConfig {
    /// Resolve the config path from the environment, falling back to the default
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_home(path.as_ref())?;

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: MonitordConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise use defaults
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_home(path.as_ref())?;
        if !expanded_path.exists() {
            info!(
                "No config file at {}, using defaults",
                expanded_path.display()
            );
            return Ok(Self::default());
        }
        Self::load(&expanded_path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let outputs = &self.outputs;
        for (role, name) in [("external", &outputs.external), ("internal", &outputs.internal)] {
            if name.trim().is_empty() {
                anyhow::bail!("Invalid {} output name: must not be empty", role);
            }
            // Would be parsed as an option by the display command
            if name.starts_with('-') {
                anyhow::bail!("Invalid {} output name: {}", role, name);
            }
        }
        if outputs.external == outputs.internal {
            anyhow::bail!(
                "External and internal outputs must differ (both are {})",
                outputs.external
            );
        }

        if self.display.command.trim().is_empty() {
            anyhow::bail!("Invalid display command: must not be empty");
        }

        let valid_modes = ["block", "delay"];
        if !valid_modes.contains(&self.inhibitor.mode.as_str()) {
            anyhow::bail!("Invalid inhibitor mode: {}", self.inhibitor.mode);
        }
        if self.inhibitor.what.is_empty() {
            anyhow::bail!("Invalid inhibitor kind: must not be empty");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}

/// Expand a leading `~` to `$HOME`
fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Ok(Path::new(&home).join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests;
