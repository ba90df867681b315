//! Engine configuration.
//!
//! Loads from the plugin's data directory or uses defaults that match the
//! stock Volumio image layout.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Config file path inside the plugin's data directory.
pub const CONFIG_PATH: &str = "/data/plugins/miscellanea/kodi/engine.toml";

/// Everything the engine needs to know about its host system: where the
/// target files live, which unit it manages and how commands are run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bootloader config file, plain key=value lines.
    #[serde(default = "default_boot_config")]
    pub boot_config: PathBuf,

    /// Kodi application-settings XML, one element per line.
    #[serde(default = "default_gui_settings")]
    pub gui_settings: PathBuf,

    /// ALSA routing file carrying the marker-delimited block.
    #[serde(default = "default_asound_conf")]
    pub asound_conf: PathBuf,

    /// Managed systemd unit.
    #[serde(default = "default_unit")]
    pub unit: String,

    /// owner:group the consuming service runs as. Patches are applied
    /// with elevated privilege, so ownership must be handed back.
    #[serde(default = "default_runtime_owner")]
    pub runtime_owner: String,

    #[serde(default = "default_systemctl_bin")]
    pub systemctl_bin: String,

    #[serde(default = "default_sudo_bin")]
    pub sudo_bin: String,

    #[serde(default = "default_chown_bin")]
    pub chown_bin: String,

    #[serde(default = "default_alsactl_bin")]
    pub alsactl_bin: String,

    /// Bound on every external command the engine spawns.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_boot_config() -> PathBuf {
    PathBuf::from("/boot/config.txt")
}

fn default_gui_settings() -> PathBuf {
    PathBuf::from("/home/kodi/.kodi/userdata/guisettings.xml")
}

fn default_asound_conf() -> PathBuf {
    PathBuf::from("/etc/asound.conf")
}

fn default_unit() -> String {
    "kodi.service".to_string()
}

fn default_runtime_owner() -> String {
    "kodi:kodi".to_string()
}

fn default_systemctl_bin() -> String {
    "/bin/systemctl".to_string()
}

fn default_sudo_bin() -> String {
    "/usr/bin/sudo".to_string()
}

fn default_chown_bin() -> String {
    "/bin/chown".to_string()
}

fn default_alsactl_bin() -> String {
    "/usr/sbin/alsactl".to_string()
}

fn default_command_timeout() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            boot_config: default_boot_config(),
            gui_settings: default_gui_settings(),
            asound_conf: default_asound_conf(),
            unit: default_unit(),
            runtime_owner: default_runtime_owner(),
            systemctl_bin: default_systemctl_bin(),
            sudo_bin: default_sudo_bin(),
            chown_bin: default_chown_bin(),
            alsactl_bin: default_alsactl_bin(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl EngineConfig {
    /// Load config from the plugin data directory, or return defaults.
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH).unwrap_or_else(|e| {
            warn!("engine config not found, using defaults: {}", e);
            EngineConfig::default()
        })
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        info!("loaded engine config from {}", path);
        Ok(config)
    }
}
