//! Terminal settings

use std::io;
use std::path::{Path, PathBuf};

use moas_switch::SwitchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading the settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Terminal settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Switch engine configuration
    #[serde(default)]
    pub switch: SwitchConfig,
    /// Capacity of the in-memory link between terminal and switch, in bytes
    #[serde(default = "default_link_buffer")]
    pub link_buffer: usize,
    /// Print each reply on its own line
    #[serde(default = "default_true")]
    pub reply_per_line: bool,
    /// Log relay/antenna snapshots as they change
    #[serde(default = "default_true")]
    pub log_snapshots: bool,
    /// Script lines run before reading stdin
    #[serde(default)]
    pub startup_script: Vec<String>,
}

fn default_link_buffer() -> usize {
    4096
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            switch: SwitchConfig::default(),
            link_buffer: default_link_buffer(),
            reply_per_line: true,
            log_snapshots: true,
            startup_script: Vec::new(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for moas
    /// Uses $XDG_CONFIG_HOME/moas, falls back to ~/.config/moas
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("moas"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("moas"))
    }

    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings
    ///
    /// An explicit path must exist. Without one the default path is tried
    /// and a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("moas-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_settings() {
        let settings = Settings::from_json(
            r#"{"switch": {"firmware": {"major": 2, "minor": 3}}, "startup_script": ["*AT1;"]}"#,
        )
        .unwrap();
        assert_eq!(settings.switch.firmware.major, 2);
        assert_eq!(settings.switch.command_buffer_len, 128);
        assert_eq!(settings.startup_script, vec!["*AT1;".to_string()]);
        assert!(settings.reply_per_line);
    }

    #[test]
    fn test_load_explicit_path() {
        let path = temp_file("explicit.json", r#"{"log_snapshots": false}"#);
        let settings = Settings::load(Some(&path)).unwrap();
        assert!(!settings.log_snapshots);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let path = std::env::temp_dir().join("moas-does-not-exist.json");
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_invalid_json_names_the_file() {
        let path = temp_file("broken.json", "{ not json");
        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
        std::fs::remove_file(path).unwrap();
    }
}
