//! Picking input handed to the brush for each pointer sample.
//!
//! Ray construction and the radius computation belong to the camera; this
//! type only carries their result. It is built per sample and dropped after
//! use.

use glam::Vec3;

/// Texture-modulated brush strength sampled at a mesh-space position.
pub trait AlphaSampler {
    /// Weight in `[0, 1]` at `position`.
    fn alpha_at(&self, position: Vec3) -> f32;
}

impl<F> AlphaSampler for F
where
    F: Fn(Vec3) -> f32,
{
    fn alpha_at(&self, position: Vec3) -> f32 {
        self(position)
    }
}

/// Result of intersecting a pick ray with a mesh.
#[derive(Clone, Copy)]
pub struct PickingResult<'a> {
    /// Lookup key of the picked mesh
    pub mesh_id: u32,
    /// Intersection point in mesh space
    pub intersection_point: Vec3,
    /// Squared brush radius in mesh space
    pub radius_squared: f32,
    /// View direction, used for back-face culling
    pub eye_direction: Option<Vec3>,
    /// Brush alpha texture, if one is active
    pub alpha: Option<&'a dyn AlphaSampler>,
}

impl std::fmt::Debug for PickingResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickingResult")
            .field("mesh_id", &self.mesh_id)
            .field("intersection_point", &self.intersection_point)
            .field("radius_squared", &self.radius_squared)
            .field("eye_direction", &self.eye_direction)
            .field("alpha", &self.alpha.is_some())
            .finish()
    }
}

impl<'a> PickingResult<'a> {
    pub fn new(mesh_id: u32, intersection_point: Vec3, radius: f32) -> Self {
        Self {
            mesh_id,
            intersection_point,
            radius_squared: radius * radius,
            eye_direction: None,
            alpha: None,
        }
    }

    pub fn with_eye_direction(mut self, eye_direction: Vec3) -> Self {
        self.eye_direction = Some(eye_direction);
        self
    }

    pub fn with_alpha(mut self, alpha: &'a dyn AlphaSampler) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Brush radius in mesh space.
    pub fn radius(&self) -> f32 {
        self.radius_squared.sqrt()
    }

    /// Alpha weight at `position`; 1.0 without an alpha texture.
    pub fn alpha_at(&self, position: Vec3) -> f32 {
        match self.alpha {
            Some(sampler) => {
                let alpha = sampler.alpha_at(position);
                if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) }
            }
            None => 1.0,
        }
    }
}
