//! Brush parameters and falloff evaluation.
//!
//! Every masking dab is weighted by a hardness-driven falloff: the brush is
//! flat at hardness 1 and decays quadratically towards the edge at hardness 0.

use sculpting_config::MaskingConfig;
use serde::{Deserialize, Serialize};

/// Falloff curve derived from brush hardness.
///
/// `weight = (1 - d)^softness` with `softness = 2 * (1 - hardness)` and `d`
/// the distance to the dab center divided by the radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    softness: f32,
}

impl Falloff {
    /// Build the falloff for a hardness in `[0, 1]` (clamped).
    pub fn from_hardness(hardness: f32) -> Self {
        let hardness = if hardness.is_nan() {
            0.0
        } else {
            hardness.clamp(0.0, 1.0)
        };
        Self {
            softness: 2.0 * (1.0 - hardness),
        }
    }

    /// Exponent applied to `1 - d`.
    pub fn softness(&self) -> f32 {
        self.softness
    }

    /// Weight at a normalized distance (0.0 = center, 1.0 = edge).
    ///
    /// Distances outside `[0, 1]` are clamped; the result is always in `[0, 1]`.
    pub fn evaluate(&self, normalized_distance: f32) -> f32 {
        let d = if normalized_distance.is_nan() {
            1.0
        } else {
            normalized_distance.clamp(0.0, 1.0)
        };
        // 0^0 == 1, so a flat brush keeps full weight at the rim
        (1.0 - d).powf(self.softness)
    }
}

/// Evaluate the masking falloff for one vertex.
pub fn falloff_weight(normalized_distance: f32, hardness: f32) -> f32 {
    Falloff::from_hardness(hardness).evaluate(normalized_distance)
}

/// Brush settings for the masking tool.
///
/// The radius is not stored here: it comes from the camera distance with each
/// picking result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushParameters {
    /// Edge sharpness of the falloff (0.0 to 1.0)
    pub hardness: f32,
    /// Strength multiplier (0.0 to 1.0)
    pub intensity: f32,
    /// Subtract from the mask instead of adding
    pub negative: bool,
    /// Only paint vertices facing the viewer
    pub culling: bool,
    /// Whether stylus pressure scales the intensity
    pub pressure_affects_intensity: bool,
    /// Spacing between dabs as fraction of radius (0 = one dab per sample)
    pub spacing: f32,
}

impl Default for BrushParameters {
    fn default() -> Self {
        Self::from(&MaskingConfig::default())
    }
}

impl From<&MaskingConfig> for BrushParameters {
    fn from(config: &MaskingConfig) -> Self {
        Self {
            hardness: config.hardness,
            intensity: config.intensity,
            negative: config.negative,
            culling: config.culling,
            pressure_affects_intensity: config.pressure_affects_intensity,
            spacing: config.spacing,
        }
    }
}

impl BrushParameters {
    /// -1 for subtractive brushes, +1 otherwise.
    pub fn polarity_sign(&self) -> f32 {
        if self.negative { -1.0 } else { 1.0 }
    }

    /// Get effective intensity based on pressure.
    pub fn effective_intensity(&self, pressure: f32) -> f32 {
        if self.pressure_affects_intensity {
            self.intensity * pressure.clamp(0.0, 1.0)
        } else {
            self.intensity
        }
    }

    /// Falloff curve for the current hardness.
    pub fn falloff(&self) -> Falloff {
        Falloff::from_hardness(self.hardness)
    }
}
