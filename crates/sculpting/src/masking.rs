//! Mask painting and whole-selection mask commands.
//!
//! The mask channel is the third float of each vertex material record:
//! 1.0 leaves a vertex free for other brushes, 0.0 fully protects it. Every
//! write goes through [`clamp_mask`] so the channel never leaves `[0, 1]`.
//!
//! Commands (`blur`, `sharpen`, `clear`) act on the masked region, i.e. the
//! vertices with a mask below 1.0, and do nothing when that region is empty.

use glam::Vec3;
use sculpting_config::MaskingConfig;
use tracing::{debug, trace, warn};

use crate::brush::{BrushParameters, Falloff};
use crate::mesh::SculptMesh;
use crate::picking::PickingResult;
use crate::refresh::RefreshRegion;
use crate::smoothing::laplacian_smooth;
use crate::stroke::{Dab, PaintOperation};
use crate::types::{MASK_MAX, MIN_BRUSH_RADIUS, MaskCommand, MaterialChannel, clamp_mask};
use crate::undo::{ActionKind, UndoStack};

/// Vertices with a mask below 1.0, ascending; `None` when there are none.
pub fn masked_vertices<M: SculptMesh + ?Sized>(mesh: &M) -> Option<Vec<usize>> {
    let masked: Vec<usize> = mesh
        .materials()
        .iter()
        .enumerate()
        .filter(|(_, m)| m.mask < MASK_MAX)
        .map(|(i, _)| i)
        .collect();
    if masked.is_empty() { None } else { Some(masked) }
}

/// Flip every vertex: `mask = 1 - mask`.
///
/// Applying it twice restores the original values (exactly for values in
/// `[0.5, 1]`, within float epsilon below that).
pub fn invert_mask<M: SculptMesh + ?Sized>(mesh: &mut M) {
    for material in mesh.materials_mut() {
        material.mask = clamp_mask(MASK_MAX - material.mask);
    }
    mesh.request_visual_refresh(RefreshRegion::All);
}

/// Masking brush and commands.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPainter {
    /// Brush settings used by strokes
    pub brush: BrushParameters,
    /// Sharpen step for values above 0.5
    pub sharpen_raise_step: f32,
    /// Sharpen step for values at or below 0.5
    pub sharpen_lower_step: f32,
    /// Rings added around the masked region before blurring
    pub blur_expand_hops: usize,
}

impl Default for MaskPainter {
    fn default() -> Self {
        Self::from(&MaskingConfig::default())
    }
}

impl From<&MaskingConfig> for MaskPainter {
    fn from(config: &MaskingConfig) -> Self {
        Self {
            brush: BrushParameters::from(config),
            sharpen_raise_step: config.sharpen_raise_step,
            sharpen_lower_step: config.sharpen_lower_step,
            blur_expand_hops: config.blur_expand_hops,
        }
    }
}

impl MaskPainter {
    pub fn new(brush: BrushParameters) -> Self {
        Self {
            brush,
            ..Default::default()
        }
    }

    /// Add a falloff-weighted increment to the mask of each vertex.
    ///
    /// The increment is `falloff(|p - center| / radius, hardness) * intensity
    /// * sign * alpha(p)`, with the sign taken from the brush polarity. The
    /// radius must be positive; a degenerate radius is logged and ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn paint<M: SculptMesh + ?Sized>(
        &self,
        mesh: &mut M,
        indices: &[usize],
        center: Vec3,
        radius_squared: f32,
        intensity: f32,
        hardness: f32,
        picking: &PickingResult<'_>,
    ) {
        let radius = radius_squared.sqrt();
        if !(radius > MIN_BRUSH_RADIUS) {
            warn!("paint: degenerate brush radius {}, skipping dab", radius);
            return;
        }

        let falloff = Falloff::from_hardness(hardness);
        let signed_intensity = intensity * self.brush.polarity_sign();

        // First pass: increments from positions, second pass: write masks
        let positions = mesh.positions();
        let increments: Vec<(usize, f32)> = indices
            .iter()
            .filter_map(|&index| {
                let position = *positions.get(index)?;
                let distance = position.distance(center) / radius;
                let weight = falloff.evaluate(distance) * signed_intensity * picking.alpha_at(position);
                Some((index, weight))
            })
            .collect();

        let materials = mesh.materials_mut();
        for &(index, increment) in &increments {
            let material = &mut materials[index];
            material.mask = clamp_mask(material.mask + increment);
        }

        let painted: Vec<usize> = increments.iter().map(|&(index, _)| index).collect();
        trace!("paint: {} vertices around {:?}", painted.len(), center);
        mesh.request_visual_refresh(RefreshRegion::Vertices(&painted));
    }

    /// Laplacian blur of the masked region (grown by `blur_expand_hops`).
    ///
    /// Returns false when nothing is masked.
    pub fn blur<M: SculptMesh + ?Sized>(
        &self,
        mesh_id: u32,
        mesh: &mut M,
        undo: &mut UndoStack,
    ) -> bool {
        let Some(masked) = masked_vertices(mesh) else {
            debug!("blur: no masked vertices");
            return false;
        };
        // Grow the region so the border of the mask is smoothed too
        let region = mesh.expand_vertices(&masked, self.blur_expand_hops);
        undo.capture_vertex_snapshot(mesh_id, mesh, &region, ActionKind::Command(MaskCommand::Blur));

        let smoothed = laplacian_smooth(mesh, &region, MaterialChannel::Mask);
        let materials = mesh.materials_mut();
        for (&index, value) in region.iter().zip(smoothed) {
            materials[index].mask = clamp_mask(value);
        }

        debug!("blur: smoothed {} vertices", region.len());
        mesh.request_visual_refresh(RefreshRegion::Vertices(&region));
        true
    }

    /// Push masked values away from 0.5 to harden the mask border.
    ///
    /// Returns false when nothing is masked.
    pub fn sharpen<M: SculptMesh + ?Sized>(
        &self,
        mesh_id: u32,
        mesh: &mut M,
        undo: &mut UndoStack,
    ) -> bool {
        let Some(masked) = masked_vertices(mesh) else {
            debug!("sharpen: no masked vertices");
            return false;
        };
        undo.capture_vertex_snapshot(mesh_id, mesh, &masked, ActionKind::Command(MaskCommand::Sharpen));

        let materials = mesh.materials_mut();
        for &index in &masked {
            let value = materials[index].mask;
            materials[index].mask = if value > 0.5 {
                clamp_mask(value + self.sharpen_raise_step)
            } else {
                clamp_mask(value - self.sharpen_lower_step)
            };
        }

        debug!("sharpen: {} vertices", masked.len());
        mesh.request_visual_refresh(RefreshRegion::Vertices(&masked));
        true
    }

    /// Unmask every masked vertex.
    ///
    /// Returns false when nothing is masked.
    pub fn clear<M: SculptMesh + ?Sized>(
        &self,
        mesh_id: u32,
        mesh: &mut M,
        undo: &mut UndoStack,
    ) -> bool {
        let Some(masked) = masked_vertices(mesh) else {
            debug!("clear: no masked vertices");
            return false;
        };
        undo.capture_vertex_snapshot(mesh_id, mesh, &masked, ActionKind::Command(MaskCommand::Clear));

        let materials = mesh.materials_mut();
        for &index in &masked {
            materials[index].mask = MASK_MAX;
        }

        debug!("clear: {} vertices", masked.len());
        mesh.request_visual_refresh(RefreshRegion::Vertices(&masked));
        true
    }

    /// Invert the whole mask. Always recorded, even on an unmasked mesh.
    pub fn invert<M: SculptMesh + ?Sized>(&self, mesh_id: u32, mesh: &mut M, undo: &mut UndoStack) {
        undo.capture_full_mesh_inverse(mesh_id, ActionKind::Command(MaskCommand::Invert));
        invert_mask(mesh);
        debug!("invert: {} vertices", mesh.vertex_count());
    }

    /// Run a tool-panel command on mesh `mesh_id`. Returns whether the mesh
    /// changed.
    pub fn execute<M: SculptMesh + ?Sized>(
        &self,
        command: MaskCommand,
        mesh_id: u32,
        mesh: &mut M,
        undo: &mut UndoStack,
    ) -> bool {
        match command {
            MaskCommand::Blur => self.blur(mesh_id, mesh, undo),
            MaskCommand::Sharpen => self.sharpen(mesh_id, mesh, undo),
            MaskCommand::Clear => self.clear(mesh_id, mesh, undo),
            MaskCommand::Invert => {
                self.invert(mesh_id, mesh, undo);
                true
            }
        }
    }
}

impl PaintOperation for MaskPainter {
    fn brush(&self) -> &BrushParameters {
        &self.brush
    }

    fn apply<M: SculptMesh + ?Sized>(
        &self,
        mesh: &mut M,
        indices: &[usize],
        dab: &Dab,
        picking: &PickingResult<'_>,
    ) {
        self.paint(
            mesh,
            indices,
            dab.center,
            dab.radius_squared,
            dab.intensity,
            dab.hardness,
            picking,
        );
    }
}
