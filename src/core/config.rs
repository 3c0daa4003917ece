//! Configuration management

use crate::hid::TargetDevice;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Listener timing, all in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerTiming {
    /// Delay between searches while the controller is absent or unsupported
    #[serde(default = "default_device_poll")]
    pub device_poll_ms: u64,
    /// Delay after the controller was found but could not be opened
    #[serde(default = "default_open_retry")]
    pub open_retry_ms: u64,
    /// Delay after an unexpected fault in the read loop
    #[serde(default = "default_fault_backoff")]
    pub fault_backoff_ms: u64,
    /// Upper bound on a single blocking read, i.e. cancellation latency
    #[serde(default = "default_read_poll")]
    pub read_poll_ms: u64,
    /// How long `dispose()` waits for the listener thread to exit
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
}

fn default_device_poll() -> u64 {
    1500
}
fn default_open_retry() -> u64 {
    2500
}
fn default_fault_backoff() -> u64 {
    3000
}
fn default_read_poll() -> u64 {
    250
}
fn default_shutdown_grace() -> u64 {
    1000
}

impl Default for ListenerTiming {
    fn default() -> Self {
        Self {
            device_poll_ms: default_device_poll(),
            open_retry_ms: default_open_retry(),
            fault_backoff_ms: default_fault_backoff(),
            read_poll_ms: default_read_poll(),
            shutdown_grace_ms: default_shutdown_grace(),
        }
    }
}

impl ListenerTiming {
    pub fn device_poll(&self) -> Duration {
        Duration::from_millis(self.device_poll_ms)
    }

    pub fn open_retry(&self) -> Duration {
        Duration::from_millis(self.open_retry_ms)
    }

    pub fn fault_backoff(&self) -> Duration {
        Duration::from_millis(self.fault_backoff_ms)
    }

    pub fn read_poll(&self) -> Duration {
        // Zero would turn the read loop into a spin
        Duration::from_millis(self.read_poll_ms.max(1))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Gamepad hotkey configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamepadConfig {
    /// USB Vendor ID
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    /// USB Product ID
    #[serde(default = "default_product_id")]
    pub product_id: u16,
    /// Button whose release fires the toggle action (empty = unbound)
    #[serde(default = "default_toggle_button")]
    pub toggle_button: String,
    /// Button whose release fires the menu action (empty = unbound)
    #[serde(default = "default_menu_button")]
    pub menu_button: String,
    #[serde(default)]
    pub timing: ListenerTiming,
}

fn default_vendor_id() -> u16 {
    0x057E
}
fn default_product_id() -> u16 {
    0x2009
}
fn default_toggle_button() -> String {
    "BTN_CAPTURE".to_string()
}
fn default_menu_button() -> String {
    "BTN_HOME".to_string()
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            toggle_button: default_toggle_button(),
            menu_button: default_menu_button(),
            timing: ListenerTiming::default(),
        }
    }
}

impl GamepadConfig {
    /// Build the immutable device target for a listener
    pub fn target(&self) -> TargetDevice {
        TargetDevice::new(
            self.vendor_id,
            self.product_id,
            Some(self.toggle_button.as_str()),
            Some(self.menu_button.as_str()),
        )
    }
}

/// Keyboard hotkey configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Register keyboard hotkeys at all
    #[serde(default = "default_keyboard_enabled")]
    pub enabled: bool,
    /// Key combination for the toggle action, e.g. "Ctrl+Shift+Space"
    #[serde(default = "default_toggle_key")]
    pub toggle_key: String,
    /// Key combination for the menu action
    #[serde(default = "default_menu_key")]
    pub menu_key: String,
}

fn default_keyboard_enabled() -> bool {
    true
}
fn default_toggle_key() -> String {
    "Ctrl+Shift+Space".to_string()
}
fn default_menu_key() -> String {
    "Ctrl+Shift+M".to_string()
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_keyboard_enabled(),
            toggle_key: default_toggle_key(),
            menu_key: default_menu_key(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gamepad listener configuration
    #[serde(default)]
    pub gamepad: GamepadConfig,
    /// Keyboard hotkey configuration
    #[serde(default)]
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Load configuration from the per-user config file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, falling back to defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the per-user config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "gamepad-hotkeys", "GamepadHotkeys")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Get the default configuration embedded in the binary
    pub fn default_config_str() -> &'static str {
        include_str!("../../config/default.toml")
    }
}
