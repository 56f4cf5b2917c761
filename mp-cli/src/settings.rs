//! Persisted device settings
//!
//! The only durable state the tester keeps: which role this device plays
//! and which configuration index the interactive selection phase last
//! had highlighted. Everything else (statistics, sweep state) is
//! deliberately per-session.

use std::path::PathBuf;

use mp_protocol::Role;
use serde::{Deserialize, Serialize};

/// Persisted settings, the moral equivalent of the firmware's EEPROM
/// role byte
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Role this device plays on the next run
    pub role: Role,
    /// Configuration index last selected in the interactive phase
    #[serde(default)]
    pub selected_config: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            role: Role::Initiator,
            selected_config: 0,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for marcopolo
    /// Uses $XDG_CONFIG_HOME/marcopolo, falls back to ~/.config/marcopolo
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("marcopolo"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("marcopolo"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine settings path"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        Ok(())
    }
}
