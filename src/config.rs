//! Configuration system for Admiral
//!
//! Loads configuration from TOML file at `~/.config/admiral/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::wm::keyboard::Action;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decorations: DecorationConfig,
    pub colors: FrameColors,
    pub behavior: BehaviorConfig,
    pub keybindings: KeybindingsConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config = Self::from_toml(&content)?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;
        config.behavior.desktop_count = config.behavior.desktop_count.clamp(1, 32);
        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("admiral");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Frame geometry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Title strip height in pixels
    pub title_height: u32,
    /// Inset between the frame edge and the content on the left, right and bottom
    pub border_width: u32,
    /// X border drawn around decorated frames
    pub frame_border: u32,
    /// Smallest width or height a client can be given
    pub min_size: u32,
    /// Core X font used for titles
    pub font: String,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            title_height: 20,
            border_width: 4,
            frame_border: 1,
            min_size: 15,
            font: "-misc-fixed-medium-r-normal--13-*-*-*-*-*-iso8859-1".to_string(),
        }
    }
}

/// Frame colors (hex: 0xRRGGBB)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameColors {
    pub active: u32,
    pub inactive: u32,
    pub text: u32,
    pub bevel_light: u32,
    pub bevel_dark: u32,
    pub frame_border: u32,
    pub root_background: u32,
}

impl Default for FrameColors {
    fn default() -> Self {
        Self {
            active: 0xff0000,
            inactive: 0x888888,
            text: 0xffffff,
            bevel_light: 0xdddddd,
            bevel_dark: 0x222222,
            frame_border: 0x000000,
            root_background: 0x446688,
        }
    }
}

/// How pointer movement interacts with focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusPolicy {
    FocusFollowsMouse,
    ClickToFocus,
}

/// Window behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Number of virtual desktops (1..=32)
    pub desktop_count: u32,
    /// Gap left on every side by the fill command
    pub fill_margin: u32,
    pub focus_policy: FocusPolicy,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            desktop_count: 9,
            fill_margin: 4,
            focus_policy: FocusPolicy::FocusFollowsMouse,
        }
    }
}

/// Keyboard shortcuts configuration
///
/// Binding specs are `[S-][C-][A-][M-]<keysym>`, e.g. `"M-S-c"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    /// Used when `$TERMINAL` is unset
    pub terminal: String,
    /// Generate view/send/flip bindings on the digit keys for every desktop
    pub desktop_bindings: bool,
    pub bindings: BTreeMap<String, Action>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        let bindings = [
            ("M-Return", Action::Terminal),
            ("M-r", Action::Spawn("dmenu_run".to_string())),
            ("M-c", Action::Close),
            ("M-S-c", Action::Kill),
            ("M-q", Action::Quit),
            ("M-f", Action::ToggleFullscreen),
            ("M-s", Action::ToggleShade),
            ("M-d", Action::ToggleDecorations),
            ("M-m", Action::Fill),
            ("M-Prior", Action::Lower),
            ("M-Next", Action::Raise),
            ("M-t", Action::ToggleSticky),
            ("M-comma", Action::PrevDesktop),
            ("M-period", Action::NextDesktop),
        ]
        .into_iter()
        .map(|(spec, action)| (spec.to_string(), action))
        .collect();

        Self {
            terminal: "gnome-terminal".to_string(),
            desktop_bindings: true,
            bindings,
        }
    }
}
