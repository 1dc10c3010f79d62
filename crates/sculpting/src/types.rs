//! Core masking types.
//!
//! The per-vertex material record keeps the 3-wide `(roughness, metalness,
//! mask)` layout used by the material vertex buffer, so a whole channel can be
//! handed to the renderer as a flat float slice.

use serde::{Deserialize, Serialize};

/// Lower bound of the mask channel (fully exposed).
pub const MASK_MIN: f32 = 0.0;

/// Upper bound of the mask channel (fully unmasked).
pub const MASK_MAX: f32 = 1.0;

/// Brush radii at or below this are treated as degenerate.
pub const MIN_BRUSH_RADIUS: f32 = 1e-6;

/// Default roughness of a freshly loaded vertex.
pub const DEFAULT_ROUGHNESS: f32 = 0.18;

/// Default metalness of a freshly loaded vertex.
pub const DEFAULT_METALNESS: f32 = 0.08;

/// Clamp a mask value into `[MASK_MIN, MASK_MAX]`.
///
/// NaN collapses to `MASK_MIN` so no write can escape the valid range.
#[inline]
pub fn clamp_mask(value: f32) -> f32 {
    value.max(MASK_MIN).min(MASK_MAX)
}

/// One float channel of the per-vertex material record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MaterialChannel {
    Roughness = 0,
    Metalness = 1,
    /// Protection weight used by every sculpting brush
    #[default]
    Mask = 2,
}

impl MaterialChannel {
    /// Offset of this channel inside the 3-wide record.
    pub fn offset(self) -> usize {
        self as usize
    }
}

/// Per-vertex material record.
///
/// Layout matches the flat material buffer: `[roughness, metalness, mask]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexMaterial {
    pub roughness: f32,
    pub metalness: f32,
    /// 1.0 = unmasked, 0.0 = fully protected
    pub mask: f32,
}

impl Default for VertexMaterial {
    fn default() -> Self {
        Self {
            roughness: DEFAULT_ROUGHNESS,
            metalness: DEFAULT_METALNESS,
            mask: MASK_MAX,
        }
    }
}

impl VertexMaterial {
    /// Read one channel.
    pub fn get(&self, channel: MaterialChannel) -> f32 {
        match channel {
            MaterialChannel::Roughness => self.roughness,
            MaterialChannel::Metalness => self.metalness,
            MaterialChannel::Mask => self.mask,
        }
    }

    /// Write one channel. Mask values are clamped to `[0, 1]`.
    pub fn set(&mut self, channel: MaterialChannel, value: f32) {
        match channel {
            MaterialChannel::Roughness => self.roughness = value,
            MaterialChannel::Metalness => self.metalness = value,
            MaterialChannel::Mask => self.mask = clamp_mask(value),
        }
    }
}

/// Whole-selection mask commands triggered from the tool panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskCommand {
    /// Laplacian blur of the masked region
    Blur,
    /// Push masked values away from 0.5
    Sharpen,
    /// Reset the masked region to fully unmasked
    Clear,
    /// Flip every vertex of the mesh
    Invert,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_mask() {
        assert_eq!(clamp_mask(-0.5), 0.0);
        assert_eq!(clamp_mask(0.25), 0.25);
        assert_eq!(clamp_mask(3.0), 1.0);
        assert_eq!(clamp_mask(f32::NAN), 0.0);
        assert_eq!(clamp_mask(f32::INFINITY), 1.0);
        assert_eq!(clamp_mask(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_material_layout_is_three_floats() {
        assert_eq!(std::mem::size_of::<VertexMaterial>(), 3 * std::mem::size_of::<f32>());
        let record = VertexMaterial {
            roughness: 0.1,
            metalness: 0.2,
            mask: 0.3,
        };
        let flat: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&record));
        assert_eq!(flat[MaterialChannel::Mask.offset()], 0.3);
        assert_eq!(flat[MaterialChannel::Roughness.offset()], 0.1);
    }

    #[test]
    fn test_channel_get_set() {
        let mut record = VertexMaterial::default();
        assert_eq!(record.get(MaterialChannel::Mask), MASK_MAX);
        record.set(MaterialChannel::Metalness, 0.7);
        assert_eq!(record.metalness, 0.7);
        assert_eq!(record.get(MaterialChannel::Metalness), 0.7);
    }
}
