//! Configuration module for the layout popup.
//!
//! Handles loading and saving application settings from JSON file.

use crate::popup::PopupSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";

/// Hotkey configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Whether the layout hotkey is registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Combination that cycles the layout (e.g., "shift+alt").
    #[serde(default = "default_combination")]
    pub combination: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            combination: default_combination(),
        }
    }
}

/// Colors configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorsConfig {
    /// Background of the active layout cell (hex).
    #[serde(default = "default_active_bg")]
    pub active_bg: String,
    /// Text of the active layout cell (hex).
    #[serde(default = "default_active_fg")]
    pub active_fg: String,
    /// Background of other cells (hex).
    #[serde(default = "default_idle_bg")]
    pub idle_bg: String,
    /// Text of other cells (hex).
    #[serde(default = "default_idle_fg")]
    pub idle_fg: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            active_bg: default_active_bg(),
            active_fg: default_active_fg(),
            idle_bg: default_idle_bg(),
            idle_fg: default_idle_fg(),
        }
    }
}

/// Popup appearance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupConfig {
    /// Width of one layout cell in pixels.
    #[serde(default = "default_cell_width")]
    pub cell_width: i32,
    /// Height of the popup in pixels.
    #[serde(default = "default_cell_height")]
    pub cell_height: i32,
    /// Distance from the pointer in pixels.
    #[serde(default = "default_pointer_offset")]
    pub pointer_offset: i32,
    /// Font family.
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// Opacity percent (0-100).
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    /// Show every installed layout with the active one highlighted.
    #[serde(default = "default_true")]
    pub show_all_layouts: bool,
    /// Colors configuration.
    #[serde(default)]
    pub colors: ColorsConfig,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            pointer_offset: default_pointer_offset(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            opacity: default_opacity(),
            show_all_layouts: true,
            colors: ColorsConfig::default(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hide delay in milliseconds.
    #[serde(default = "default_hide_delay")]
    pub hide_delay_ms: u64,
    /// Wait after a key release before reading the layout.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u32,
    /// Also check the layout when the foreground window changes.
    #[serde(default = "default_true")]
    pub watch_foreground: bool,
    /// Hotkey configuration.
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    /// Popup configuration.
    #[serde(default)]
    pub popup: PopupConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: default_hide_delay(),
            settle_delay_ms: default_settle_delay(),
            watch_foreground: true,
            hotkey: HotkeyConfig::default(),
            popup: PopupConfig::default(),
        }
    }
}

impl AppConfig {
    /// Geometry and timing for the popup controller.
    pub fn popup_settings(&self) -> PopupSettings {
        PopupSettings {
            hide_delay: Duration::from_millis(self.hide_delay_ms),
            cell_width: self.popup.cell_width.max(1),
            cell_height: self.popup.cell_height.max(1),
            pointer_offset: self.popup.pointer_offset,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}
fn default_combination() -> String {
    "shift+alt".to_string()
}
fn default_active_bg() -> String {
    "#017AFF".to_string()
}
fn default_active_fg() -> String {
    "#FFFFFF".to_string()
}
fn default_idle_bg() -> String {
    "#FFFFFF".to_string()
}
fn default_idle_fg() -> String {
    "#000000".to_string()
}
fn default_cell_width() -> i32 {
    24
}
fn default_cell_height() -> i32 {
    18
}
fn default_pointer_offset() -> i32 {
    10
}
fn default_font_family() -> String {
    "Segoe UI".to_string()
}
fn default_font_size() -> u32 {
    14
}
fn default_opacity() -> u8 {
    100
}
fn default_hide_delay() -> u64 {
    2000
}
fn default_settle_delay() -> u32 {
    50
}

/// Configuration manager.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new configuration manager.
    pub fn new() -> Self {
        let config_path = Self::get_config_path();
        Self { config_path }
    }

    /// Creates a manager for an explicit file.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Gets the path to the configuration file.
    fn get_config_path() -> PathBuf {
        // Try to use the directory where the executable is located
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                return exe_dir.join(CONFIG_FILE);
            }
        }
        if let Some(dir) = dirs::config_dir() {
            return dir.join("langpop").join(CONFIG_FILE);
        }
        PathBuf::from(CONFIG_FILE)
    }

    /// Loads configuration from file.
    ///
    /// If the file doesn't exist, creates it with default values.
    pub fn load(&self) -> AppConfig {
        if !self.config_path.exists() {
            let config = AppConfig::default();
            if let Err(e) = self.save(&config) {
                log::warn!("Failed to write default config: {}", e);
            }
            return config;
        }

        match fs::read_to_string(&self.config_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Failed to parse config: {}, using defaults", e);
                AppConfig::default()
            }),
            Err(e) => {
                log::warn!("Failed to read config: {}, using defaults", e);
                AppConfig::default()
            }
        }
    }

    /// Saves configuration to file.
    pub fn save(&self, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dir) = self.config_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Returns the config file path.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a hex color string to RGB values.
pub fn parse_hex_color(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    if hex.len() >= 6 && hex.is_ascii() {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);
        (r, g, b)
    } else {
        (255, 255, 255)
    }
}
