//! Configuration for logsift
//!
//! Loaded from `<config dir>/logsift/config.toml` when present, then
//! overridden from `LOGSIFT_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "config.toml";

/// Default size of channels between producers and the UI
pub const DEFAULT_CHANNEL_BUFFER: usize = 1000;

/// Default number of existing lines a followed file is seeded with
pub const DEFAULT_TAIL_LINES: u32 = 1000;

/// Knobs of a single [`LogView`](crate::view::LogView)
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewConfig {
    /// How close to the maximum scroll extent still counts as "at bottom",
    /// in the surface's own units. One row suits a terminal; pixel-based
    /// surfaces want something closer to 10.
    pub bottom_tolerance: u32,
    /// Whether the view exposes a clear-log action
    pub clear_action: bool,
    /// Render even while the view is hidden
    pub render_when_hidden: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            bottom_tolerance: 1,
            clear_action: true,
            render_when_hidden: false,
        }
    }
}

/// Configuration for the terminal host
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub view: ViewConfig,
    /// Wrap long lines instead of clipping them
    pub soft_wrap: bool,
    /// Color lines by detected log level
    pub level_colors: bool,
    /// Delay before a filter edit is applied; 0 applies on every keystroke
    pub filter_debounce_ms: u64,
    /// Existing lines to show when following a file
    pub tail_lines: u32,
    /// Capacity of the source status channel
    pub channel_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view: ViewConfig::default(),
            soft_wrap: true,
            level_colors: true,
            filter_debounce_ms: 0,
            tail_lines: DEFAULT_TAIL_LINES,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

impl Config {
    /// Load the config file if there is one, then apply env overrides.
    /// A broken file is logged and ignored.
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to load config: {:#}", e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("Using default config");
                Self::default()
            }
        };

        config.apply_env();
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from `LOGSIFT_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("LOGSIFT_BOTTOM_TOLERANCE").and_then(|s| s.parse().ok()) {
            self.view.bottom_tolerance = v;
        }
        if let Some(v) = var("LOGSIFT_SOFT_WRAP").and_then(|s| parse_bool(&s)) {
            self.soft_wrap = v;
        }
        if let Some(v) = var("LOGSIFT_TAIL_LINES").and_then(|s| s.parse().ok()) {
            self.tail_lines = v;
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Path of the config file, if the platform has a config directory
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("logsift").join(CONFIG_FILE))
}
