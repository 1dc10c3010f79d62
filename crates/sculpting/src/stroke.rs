//! Stroke controller.
//!
//! Turns the pointer samples of one gesture into evenly spaced dabs, hands each
//! dab to a [`PaintOperation`] and records a single undo entry for the whole
//! gesture. Each vertex is captured the first time a dab reaches it, so undo
//! restores the state from before the stroke began.

use glam::Vec3;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::brush::BrushParameters;
use crate::mesh::SculptMesh;
use crate::neighborhood::select_within_radius;
use crate::picking::PickingResult;
use crate::types::MIN_BRUSH_RADIUS;
use crate::undo::{ActionKind, SnapshotBuilder, UndoAction, UndoEntry, UndoStack};

/// Errors raised at the stroke boundary
#[derive(Debug, Error, PartialEq)]
pub enum StrokeError {
    #[error("No stroke in progress")]
    NoActiveStroke,
    #[error("Stroke {0} is already in progress")]
    AlreadyStroking(u64),
    #[error("Brush radius {0} is too small to paint")]
    DegenerateRadius(f32),
    #[error("Picked mesh {picked} differs from stroke mesh {stroke}")]
    MeshMismatch { picked: u32, stroke: u32 },
}

/// Upper bound on dabs placed for a single pointer sample.
pub const MAX_DABS_PER_SAMPLE: usize = 256;

/// One brush stamp along a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dab {
    /// Stamp center in mesh space
    pub center: Vec3,
    pub radius_squared: f32,
    /// Pressure-adjusted strength
    pub intensity: f32,
    pub hardness: f32,
}

/// Per-vertex edit applied by a stroke.
pub trait PaintOperation {
    /// Brush settings driving the stroke.
    fn brush(&self) -> &BrushParameters;

    /// Apply one dab to the selected vertices.
    fn apply<M: SculptMesh + ?Sized>(
        &self,
        mesh: &mut M,
        indices: &[usize],
        dab: &Dab,
        picking: &PickingResult<'_>,
    );
}

/// Outcome of a finished (or cancelled) stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeSummary {
    pub stroke_id: u64,
    pub dab_count: usize,
    /// Distinct vertices the stroke touched
    pub vertices_touched: usize,
    /// Whether an undo entry was recorded
    pub committed: bool,
}

/// State for an active stroke.
#[derive(Debug)]
struct ActiveStroke {
    stroke_id: u64,
    mesh_id: u32,
    /// Position of the previous sample
    last_sample_position: Vec3,
    /// Distance travelled since the last dab
    distance_since_dab: f32,
    /// Pre-stroke values of every touched vertex
    snapshot: SnapshotBuilder,
    dab_count: usize,
}

/// Drives a [`PaintOperation`] across a continuous gesture.
#[derive(Debug)]
pub struct BrushStroke<O> {
    /// The edit applied per dab
    pub operation: O,
    active_stroke: Option<ActiveStroke>,
    next_stroke_id: u64,
}

impl<O: PaintOperation> BrushStroke<O> {
    pub fn new(operation: O) -> Self {
        Self {
            operation,
            active_stroke: None,
            next_stroke_id: 0,
        }
    }

    /// Check if currently stroking
    pub fn is_stroking(&self) -> bool {
        self.active_stroke.is_some()
    }

    pub fn active_stroke_id(&self) -> Option<u64> {
        self.active_stroke.as_ref().map(|stroke| stroke.stroke_id)
    }

    /// Begin a stroke and apply the first dab at the picked point.
    ///
    /// Returns the stroke ID.
    pub fn begin_stroke<M: SculptMesh + ?Sized>(
        &mut self,
        mesh: &mut M,
        picking: &PickingResult<'_>,
        pressure: f32,
    ) -> Result<u64, StrokeError> {
        if let Some(stroke) = &self.active_stroke {
            return Err(StrokeError::AlreadyStroking(stroke.stroke_id));
        }
        check_radius(picking)?;

        let stroke_id = self.next_stroke_id;
        self.next_stroke_id += 1;

        let mut stroke = ActiveStroke {
            stroke_id,
            mesh_id: picking.mesh_id,
            last_sample_position: picking.intersection_point,
            distance_since_dab: 0.0,
            snapshot: SnapshotBuilder::new(),
            dab_count: 0,
        };
        self.apply_dab(&mut stroke, mesh, picking.intersection_point, picking, pressure);
        self.active_stroke = Some(stroke);

        debug!("Begin stroke {} on mesh {}", stroke_id, picking.mesh_id);
        Ok(stroke_id)
    }

    /// Continue the stroke to a new sample.
    ///
    /// Emits dabs every `spacing * radius` along the path from the last dab
    /// and returns how many were applied (possibly zero). A spacing of zero
    /// applies one dab per sample. At most [`MAX_DABS_PER_SAMPLE`] dabs are
    /// placed per sample; beyond that they are spread evenly over the segment.
    pub fn stroke_to<M: SculptMesh + ?Sized>(
        &mut self,
        mesh: &mut M,
        picking: &PickingResult<'_>,
        pressure: f32,
    ) -> Result<usize, StrokeError> {
        // Take the stroke out to avoid borrow conflicts
        let Some(mut stroke) = self.active_stroke.take() else {
            return Err(StrokeError::NoActiveStroke);
        };
        if let Err(err) = Self::check_sample(&stroke, picking) {
            self.active_stroke = Some(stroke);
            return Err(err);
        }

        let target = picking.intersection_point;
        let spacing_distance = picking.radius() * self.operation.brush().spacing;
        let applied = if !(spacing_distance > 0.0) {
            self.apply_dab(&mut stroke, mesh, target, picking, pressure);
            stroke.distance_since_dab = 0.0;
            1
        } else {
            let start = stroke.last_sample_position;
            let length = target.distance(start);
            let direction = (target - start).normalize_or_zero();

            // Carry over at most one spacing, so a shrinking radius never
            // places a dab behind the segment start
            let carried = stroke.distance_since_dab.min(spacing_distance);
            let travelled = carried + length;
            let due = (travelled / spacing_distance).floor();

            if due > MAX_DABS_PER_SAMPLE as f32 {
                warn!(
                    "Stroke {}: {} dabs due over {} units, spreading {} evenly",
                    stroke.stroke_id, due, length, MAX_DABS_PER_SAMPLE
                );
                for i in 1..=MAX_DABS_PER_SAMPLE {
                    let offset = length * i as f32 / MAX_DABS_PER_SAMPLE as f32;
                    self.apply_dab(&mut stroke, mesh, start + direction * offset, picking, pressure);
                }
                stroke.distance_since_dab = 0.0;
                MAX_DABS_PER_SAMPLE
            } else {
                let count = due as usize;
                for i in 1..=count {
                    let offset = i as f32 * spacing_distance - carried;
                    self.apply_dab(&mut stroke, mesh, start + direction * offset, picking, pressure);
                }
                stroke.distance_since_dab = (travelled - count as f32 * spacing_distance).max(0.0);
                count
            }
        };
        stroke.last_sample_position = target;

        trace!("Stroke {}: {} dabs toward {:?}", stroke.stroke_id, applied, target);
        // Put the stroke back
        self.active_stroke = Some(stroke);
        Ok(applied)
    }

    /// Finish the stroke and record it on the undo stack.
    pub fn end_stroke(&mut self, undo: &mut UndoStack) -> Result<StrokeSummary, StrokeError> {
        let stroke = self.active_stroke.take().ok_or(StrokeError::NoActiveStroke)?;
        let summary = Self::commit(stroke, undo);
        debug!(
            "End stroke {}: {} dabs, {} vertices",
            summary.stroke_id, summary.dab_count, summary.vertices_touched
        );
        Ok(summary)
    }

    /// Abort the stroke. The partial edit stays and is still undoable.
    ///
    /// Returns `None` when no stroke was active.
    pub fn cancel_stroke(&mut self, undo: &mut UndoStack) -> Option<StrokeSummary> {
        let stroke = self.active_stroke.take()?;
        let summary = Self::commit(stroke, undo);
        debug!("Cancel stroke {} after {} dabs", summary.stroke_id, summary.dab_count);
        Some(summary)
    }

    fn commit(stroke: ActiveStroke, undo: &mut UndoStack) -> StrokeSummary {
        let mut summary = StrokeSummary {
            stroke_id: stroke.stroke_id,
            dab_count: stroke.dab_count,
            vertices_touched: stroke.snapshot.len(),
            committed: false,
        };
        if stroke.snapshot.is_empty() {
            debug!("Stroke {} touched no vertices, nothing to record", stroke.stroke_id);
            return summary;
        }
        undo.push(UndoEntry {
            mesh_id: stroke.mesh_id,
            kind: ActionKind::Stroke {
                stroke_id: stroke.stroke_id,
            },
            action: UndoAction::VertexSnapshot(stroke.snapshot.finish()),
        });
        summary.committed = true;
        summary
    }

    fn check_sample(stroke: &ActiveStroke, picking: &PickingResult<'_>) -> Result<(), StrokeError> {
        if picking.mesh_id != stroke.mesh_id {
            return Err(StrokeError::MeshMismatch {
                picked: picking.mesh_id,
                stroke: stroke.mesh_id,
            });
        }
        check_radius(picking)
    }

    fn apply_dab<M: SculptMesh + ?Sized>(
        &self,
        stroke: &mut ActiveStroke,
        mesh: &mut M,
        center: Vec3,
        picking: &PickingResult<'_>,
        pressure: f32,
    ) {
        let brush = self.operation.brush();
        let mut indices = select_within_radius(mesh, center, picking.radius_squared);
        if brush.culling {
            if let Some(eye_direction) = picking.eye_direction {
                indices.retain(|&i| faces_viewer(mesh.vertex_normal(i), eye_direction));
            }
        }
        stroke.dab_count += 1;
        if indices.is_empty() {
            return;
        }

        stroke.snapshot.capture(mesh, &indices);
        let dab = Dab {
            center,
            radius_squared: picking.radius_squared,
            intensity: brush.effective_intensity(pressure),
            hardness: brush.hardness,
        };
        self.operation.apply(mesh, &indices, &dab, picking);
    }
}

/// Front-facing test for back-face culling; zero normals pass.
fn faces_viewer(normal: Vec3, eye_direction: Vec3) -> bool {
    normal.dot(eye_direction) <= 0.0
}

fn check_radius(picking: &PickingResult<'_>) -> Result<(), StrokeError> {
    let radius = picking.radius();
    if radius > MIN_BRUSH_RADIUS {
        Ok(())
    } else {
        warn!("Rejecting stroke sample with radius {}", radius);
        Err(StrokeError::DegenerateRadius(radius))
    }
}
