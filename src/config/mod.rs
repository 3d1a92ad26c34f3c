//! Configuration management for Paneflow
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files: transition defaults, the canvas fade, the bundled clip
//! animator, the frame clock, and window definitions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::window::{ControlId, WindowCategory, WindowKind};

/// Main configuration struct containing all Paneflow settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PaneflowConfig {
    /// Window stack behaviour
    #[serde(default)]
    pub stack: StackConfig,

    /// Whole-canvas fade settings
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Open/close clip timings
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Frame clock settings
    #[serde(default)]
    pub clock: ClockConfig,

    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Window kinds known to the registry
    #[serde(default)]
    pub windows: Vec<WindowDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackConfig {
    /// Animate open/close when the caller does not say otherwise
    pub animate_by_default: bool,

    /// Animation layer sampled while waiting for a clip
    pub animation_layer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    /// Duration of hide/show canvas fades (milliseconds)
    pub fade_duration_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Attach a clip animator to configured windows
    pub enabled: bool,

    /// Open clip length (milliseconds)
    pub open_duration_ms: u32,

    /// Close clip length (milliseconds)
    pub close_duration_ms: u32,

    /// Leading part of each clip reported as a blend (milliseconds)
    pub blend_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    /// Interval of the built-in frame driver (milliseconds)
    pub frame_interval_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable debug logging
    pub debug: bool,
}

/// A window kind declared in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowDefinition {
    pub kind: String,

    #[serde(default)]
    pub category: WindowCategory,

    /// Hide everything beneath this window while it is open
    #[serde(default)]
    pub hide_other: bool,

    /// Control selected when the window gains focus for the first time
    #[serde(default)]
    pub default_control: Option<u32>,
}

impl WindowDefinition {
    pub fn new(kind: impl Into<String>, category: WindowCategory, hide_other: bool) -> Self {
        Self {
            kind: kind.into(),
            category,
            hide_other,
            default_control: None,
        }
    }

    pub fn window_kind(&self) -> WindowKind {
        WindowKind::new(self.kind.as_str())
    }

    pub fn default_control(&self) -> Option<ControlId> {
        self.default_control.map(ControlId)
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            animate_by_default: true,
            animation_layer: 0,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            fade_duration_ms: 250,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open_duration_ms: 200,
            close_duration_ms: 150,
            blend_ms: 0,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
        }
    }
}

impl CanvasConfig {
    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms as u64)
    }
}

impl ClockConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms as u64)
    }
}

impl PaneflowConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let relative = path.strip_prefix("~").unwrap_or(path);
            Path::new(&home).join(relative)
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: PaneflowConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.clock.frame_interval_ms == 0 || self.clock.frame_interval_ms > 1000 {
            anyhow::bail!("Invalid frame_interval_ms: must be between 1 and 1000");
        }

        if self.animation.blend_ms > self.animation.open_duration_ms.max(self.animation.close_duration_ms) {
            anyhow::bail!("Invalid blend_ms: longer than both clips");
        }

        let mut seen = HashSet::new();
        for window in &self.windows {
            if window.kind.trim().is_empty() {
                anyhow::bail!("Window definition with an empty kind");
            }
            if !seen.insert(window.kind.as_str()) {
                anyhow::bail!("Duplicate window kind: {}", window.kind);
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Non-default sections of the partial config override this config
    pub fn merge_partial(mut self, partial: PaneflowConfig) -> Self {
        let default_config = PaneflowConfig::default();

        if partial.stack != default_config.stack {
            self.stack = partial.stack;
        }
        if partial.canvas != default_config.canvas {
            self.canvas = partial.canvas;
        }
        if partial.animation != default_config.animation {
            self.animation = partial.animation;
        }
        if partial.clock != default_config.clock {
            self.clock = partial.clock;
        }
        if partial.general != default_config.general {
            self.general = partial.general;
        }
        if !partial.windows.is_empty() {
            self.windows = partial.windows;
        }

        self
    }

    pub fn window(&self, kind: &str) -> Option<&WindowDefinition> {
        self.windows.iter().find(|w| w.kind == kind)
    }
}

#[cfg(test)]
mod tests;
