mod binding;
mod loader;

use serde::{Deserialize, Serialize};

pub use binding::{HotkeyBinding, Modifier, ResolvedBinding};
pub use loader::{
    config_dir, config_path, load, log_dir, try_load, try_load_valid, write_default,
};

use crate::log::LogConfig;

/// Top-level configuration for Summon.
///
/// Loaded from `~/.config/summon/config.toml`. Missing sections
/// fall back to defaults thanks to `#[serde(default)]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The global shortcut.
    pub hotkey: HotkeyBinding,
    /// Notification-area icon settings.
    pub tray: TrayConfig,
    /// File logging settings.
    pub log: LogConfig,
}

/// Notification-area icon settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// Tooltip shown when hovering the icon.
    pub tooltip: String,
    /// Whether the icon is shown.
    pub visible: bool,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            tooltip: "Summon".into(),
            visible: true,
        }
    }
}
