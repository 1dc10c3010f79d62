//! Shared configuration for the sculpting engine
//!
//! This crate provides the single source of truth for masking brush defaults,
//! mask command step sizes and undo depth. Values can be overridden from a
//! JSON document; missing fields fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default brush hardness (0 = quadratic soft edge, 1 = flat)
pub const DEFAULT_HARDNESS: f32 = 0.25;

/// Default brush intensity
pub const DEFAULT_INTENSITY: f32 = 1.0;

/// Masking brushes subtract by default (painting protects vertices)
pub const DEFAULT_NEGATIVE: bool = true;

/// Back-face culling is off by default
pub const DEFAULT_CULLING: bool = false;

/// Dab spacing as a fraction of the brush radius
pub const DEFAULT_SPACING: f32 = 0.15;

/// Step applied to mask values above 0.5 by the sharpen command
pub const DEFAULT_SHARPEN_RAISE_STEP: f32 = 0.1;

/// Step applied to mask values at or below 0.5 by the sharpen command
pub const DEFAULT_SHARPEN_LOWER_STEP: f32 = 1.0;

/// Ring expansion applied before blurring the mask
pub const DEFAULT_BLUR_EXPAND_HOPS: usize = 1;

/// Maximum number of undo levels kept per tool
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 20;

/// Errors produced while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("max_undo_levels must be at least 1")]
    NoUndoLevels,
}

/// Brush and command configuration for the masking tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// Edge sharpness of the falloff (0.0 to 1.0)
    pub hardness: f32,
    /// Strength multiplier (0.0 to 1.0)
    pub intensity: f32,
    /// Subtract from the mask instead of adding to it
    pub negative: bool,
    /// Skip vertices facing away from the viewer
    pub culling: bool,
    /// Whether stylus pressure scales the intensity
    pub pressure_affects_intensity: bool,
    /// Distance between dabs as a fraction of the brush radius
    pub spacing: f32,
    /// Sharpen step for values above 0.5
    pub sharpen_raise_step: f32,
    /// Sharpen step for values at or below 0.5
    pub sharpen_lower_step: f32,
    /// Graph hops added around the masked region before blurring
    pub blur_expand_hops: usize,
    /// Maximum undo entries kept (oldest are discarded)
    pub max_undo_levels: usize,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            hardness: DEFAULT_HARDNESS,
            intensity: DEFAULT_INTENSITY,
            negative: DEFAULT_NEGATIVE,
            culling: DEFAULT_CULLING,
            pressure_affects_intensity: true,
            spacing: DEFAULT_SPACING,
            sharpen_raise_step: DEFAULT_SHARPEN_RAISE_STEP,
            sharpen_lower_step: DEFAULT_SHARPEN_LOWER_STEP,
            blur_expand_hops: DEFAULT_BLUR_EXPAND_HOPS,
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
        }
    }
}

impl MaskingConfig {
    /// Parse a config from JSON and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading masking config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("hardness", self.hardness, 0.0, 1.0)?;
        check_range("intensity", self.intensity, 0.0, 1.0)?;
        check_range("spacing", self.spacing, 0.0, 1.0)?;
        check_range("sharpen_raise_step", self.sharpen_raise_step, 0.0, 1.0)?;
        check_range("sharpen_lower_step", self.sharpen_lower_step, 0.0, 1.0)?;
        if self.max_undo_levels == 0 {
            return Err(ConfigError::NoUndoLevels);
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    // NaN fails both comparisons, so test for containment
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
