//! Config file location and `config` command helpers.
//!
//! Loading and layering live in `libreap::config`; this module only knows
//! where the file is and how to write or query it.

use libreap::Config;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the default config file path (`~/.config/reap/config.yaml` on
/// Linux).
pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("reap").join("config.yaml")
    } else {
        // Fallback to current directory
        PathBuf::from("config.yaml")
    }
}

/// Renders a configuration as YAML.
pub fn to_yaml(config: &Config) -> Result<String, String> {
    serde_yaml::to_string(config).map_err(|e| format!("Failed to serialize config: {}", e))
}

/// Writes a config file with default values. Refuses to overwrite.
pub fn init_config(config_path: &Path) -> Result<(), String> {
    if config_path.exists() {
        return Err(format!(
            "Config file already exists at {}. Remove it to recreate.",
            config_path.display()
        ));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let yaml = to_yaml(&Config::default())?;
    fs::write(config_path, yaml).map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

/// Looks up a dotted key (`network.timeout`) in a resolved configuration.
///
/// Scalars print bare; sections and lists print as YAML.
pub fn get_config_value(config: &Config, key: &str) -> Result<String, String> {
    let root =
        serde_yaml::to_value(config).map_err(|e| format!("Failed to serialize config: {}", e))?;

    let mut current = &root;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| format!("Unknown config key: {}", key))?;
    }

    match current {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| format!("Failed to serialize value: {}", e)),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
