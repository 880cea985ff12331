//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sm_control::address::DEFAULT_DEVICE_ADDRESS;
use sm_control::protocol::DEFAULT_ZONE;
use sm_control::ClientConfig;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Device address used when none is given on the command line
    #[serde(default = "default_host")]
    pub default_host: String,
    /// Handshake and per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Zone whose user EQ is replaced
    #[serde(default = "default_zone")]
    pub zone: String,
    /// Control port, when the device is not on the WebSocket default
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_host() -> String {
    DEFAULT_DEVICE_ADDRESS.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_zone() -> String {
    DEFAULT_ZONE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            timeout_ms: default_timeout_ms(),
            zone: default_zone(),
            port: None,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for rew2streammagic
    /// Uses $XDG_CONFIG_HOME/rew2streammagic, falls back to ~/.config/rew2streammagic
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("rew2streammagic"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("rew2streammagic"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the default location
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load settings from an explicit file, failing if it cannot be used
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings {}", path.display()))
    }

    /// Session configuration derived from these settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            zone: self.zone.clone(),
            port: self.port,
        }
    }
}
