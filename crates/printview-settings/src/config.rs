//! Configuration management
//!
//! Parser and viewer settings, persisted as JSON or TOML.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use printview_core::constants::{
    DEFAULT_CURRENT_LAYER_SLACK, DEFAULT_FAMILY_PREFIX, DEFAULT_LAYER_STEP, DEFAULT_PATH_WIDTH,
    DEFAULT_STEP_PRECISION_DIGITS, MAX_STEP_PRECISION_DIGITS,
};
use printview_visualizer::{BuilderOptions, CursorMode, StepInference, Toolpath, WindowEngine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command interpretation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Command family whose unhandled codes are reported
    pub family_prefix: char,
    /// Accept X/Y/Z words on set-position commands
    pub allow_xyz_reset: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            family_prefix: DEFAULT_FAMILY_PREFIX,
            allow_xyz_reset: true,
        }
    }
}

/// Model and playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Nominal line width in mm
    pub path_width: f64,
    /// Layer step used when none can be inferred
    pub fallback_layer_step: f64,
    /// Decimal digits kept when bucketing layer differences
    pub step_precision_digits: u32,
    /// Narrowing of the current-layer band below one step
    pub current_layer_slack: f64,
    pub cursor_mode: CursorMode,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            path_width: DEFAULT_PATH_WIDTH,
            fallback_layer_step: DEFAULT_LAYER_STEP,
            step_precision_digits: DEFAULT_STEP_PRECISION_DIGITS,
            current_layer_slack: DEFAULT_CURRENT_LAYER_SLACK,
            cursor_mode: CursorMode::default(),
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub parser: ParserSettings,
    pub viewer: ViewerSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("none").to_string()).into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform location of the configuration file
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::UnsupportedPlatform("no configuration directory".to_string())
        })?;
        Ok(dir.join("printview").join("config.json"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if !self.parser.family_prefix.is_ascii_alphabetic() {
            return Err(SettingsError::invalid(
                "parser.family_prefix",
                "must be an ASCII letter",
            ));
        }

        let viewer = &self.viewer;
        if viewer.path_width.is_nan() || viewer.path_width <= 0.0 {
            return Err(SettingsError::invalid("viewer.path_width", "must be > 0"));
        }

        if viewer.fallback_layer_step.is_nan() || viewer.fallback_layer_step <= 0.0 {
            return Err(SettingsError::invalid(
                "viewer.fallback_layer_step",
                "must be > 0",
            ));
        }

        if viewer.current_layer_slack.is_nan() || viewer.current_layer_slack < 0.0 {
            return Err(SettingsError::invalid(
                "viewer.current_layer_slack",
                "must be >= 0",
            ));
        }

        if viewer.current_layer_slack >= viewer.fallback_layer_step {
            return Err(SettingsError::invalid(
                "viewer.current_layer_slack",
                "must be smaller than the fallback layer step",
            ));
        }

        if viewer.step_precision_digits > MAX_STEP_PRECISION_DIGITS {
            return Err(SettingsError::invalid(
                "viewer.step_precision_digits",
                format!("must be <= {}", MAX_STEP_PRECISION_DIGITS),
            ));
        }

        Ok(())
    }

    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            family_prefix: self.parser.family_prefix.to_ascii_uppercase(),
            allow_xyz_reset: self.parser.allow_xyz_reset,
            path_width: self.viewer.path_width,
        }
    }

    pub fn step_inference(&self) -> StepInference {
        StepInference {
            precision_digits: self.viewer.step_precision_digits,
            fallback_step: self.viewer.fallback_layer_step,
        }
    }

    /// Window engine for a toolpath with the given layer step
    pub fn window_engine(&self, step: f64) -> WindowEngine {
        WindowEngine::new(
            self.viewer.cursor_mode,
            step,
            self.viewer.current_layer_slack,
        )
    }

    /// An empty toolpath configured from these settings
    pub fn toolpath(&self) -> Toolpath {
        Toolpath::new(self.builder_options(), self.step_inference())
            .with_window(self.viewer.cursor_mode, self.viewer.current_layer_slack)
    }
}
