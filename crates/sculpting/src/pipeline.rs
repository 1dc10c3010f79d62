//! Masking tool orchestration.
//!
//! Ties the stroke controller, the mask commands and the undo history of one
//! masking tool together:
//! 1. Pointer samples → stroke dabs → mask paint
//! 2. Tool-panel commands → blur / sharpen / clear / invert
//! 3. Undo / redo over both
//!
//! The mesh is borrowed per call; the pipeline never holds on to it.

use sculpting_config::{ConfigError, MaskingConfig};
use tracing::debug;

use crate::brush::BrushParameters;
use crate::masking::MaskPainter;
use crate::mesh::SculptMesh;
use crate::picking::PickingResult;
use crate::stroke::{BrushStroke, StrokeError, StrokeSummary};
use crate::types::MaskCommand;
use crate::undo::UndoStack;

/// The masking pipeline: stroke → paint → undo capture, plus commands.
#[derive(Debug)]
pub struct MaskingPipeline {
    /// Stroke controller wrapping the mask painter
    pub stroke: BrushStroke<MaskPainter>,
    /// Undo history for the mask channel
    pub undo: UndoStack,
    config: MaskingConfig,
}

impl Default for MaskingPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskingPipeline {
    /// Create a pipeline with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(MaskingConfig::default())
    }

    /// Create a pipeline from a custom configuration.
    pub fn with_config(config: MaskingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: MaskingConfig) -> Self {
        Self {
            stroke: BrushStroke::new(MaskPainter::from(&config)),
            undo: UndoStack::new(config.max_undo_levels),
            config,
        }
    }

    pub fn config(&self) -> &MaskingConfig {
        &self.config
    }

    pub fn painter(&self) -> &MaskPainter {
        &self.stroke.operation
    }

    /// Get the current brush settings.
    pub fn brush(&self) -> &BrushParameters {
        &self.stroke.operation.brush
    }

    /// Replace the brush settings. Takes effect from the next dab.
    pub fn set_brush(&mut self, brush: BrushParameters) {
        self.stroke.operation.brush = brush;
    }

    /// Check if a stroke is currently active.
    pub fn is_stroke_active(&self) -> bool {
        self.stroke.is_stroking()
    }

    /// Begin a new stroke. Returns the stroke ID.
    pub fn begin_stroke<M: SculptMesh + ?Sized>(
        &mut self,
        mesh: &mut M,
        picking: &PickingResult<'_>,
        pressure: f32,
    ) -> Result<u64, StrokeError> {
        self.stroke.begin_stroke(mesh, picking, pressure)
    }

    /// Continue the active stroke. Returns the number of dabs applied.
    pub fn stroke_to<M: SculptMesh + ?Sized>(
        &mut self,
        mesh: &mut M,
        picking: &PickingResult<'_>,
        pressure: f32,
    ) -> Result<usize, StrokeError> {
        self.stroke.stroke_to(mesh, picking, pressure)
    }

    /// End the current stroke and record it for undo.
    pub fn end_stroke(&mut self) -> Result<StrokeSummary, StrokeError> {
        self.stroke.end_stroke(&mut self.undo)
    }

    /// Cancel the current stroke; its partial edit stays undoable.
    pub fn cancel_stroke(&mut self) -> Option<StrokeSummary> {
        self.stroke.cancel_stroke(&mut self.undo)
    }

    /// Run a tool-panel command on mesh `mesh_id`. Returns whether the mesh
    /// changed.
    ///
    /// A stroke still in progress is ended first so its undo entry comes
    /// before the command's.
    pub fn execute<M: SculptMesh + ?Sized>(
        &mut self,
        command: MaskCommand,
        mesh_id: u32,
        mesh: &mut M,
    ) -> bool {
        if let Some(summary) = self.stroke.cancel_stroke(&mut self.undo) {
            debug!("Finalized stroke {} before {:?}", summary.stroke_id, command);
        }
        let changed = self.stroke.operation.execute(command, mesh_id, mesh, &mut self.undo);
        debug!("Executed {:?} (changed: {})", command, changed);
        changed
    }

    /// Undo the most recent stroke or command on mesh `mesh_id`.
    ///
    /// Returns false when there is nothing to undo or the most recent entry
    /// belongs to another mesh.
    pub fn undo<M: SculptMesh + ?Sized>(&mut self, mesh_id: u32, mesh: &mut M) -> bool {
        if self.stroke.is_stroking() {
            self.stroke.cancel_stroke(&mut self.undo);
        }
        self.undo.undo(mesh_id, mesh)
    }

    /// Redo the most recently undone stroke or command on mesh `mesh_id`.
    pub fn redo<M: SculptMesh + ?Sized>(&mut self, mesh_id: u32, mesh: &mut M) -> bool {
        if self.stroke.is_stroking() {
            self.stroke.cancel_stroke(&mut self.undo);
        }
        self.undo.redo(mesh_id, mesh)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::{grid, line};
    use crate::undo::ActionKind;
    use glam::Vec3;

    #[test]
    fn test_pipeline_creation() {
        let pipeline = MaskingPipeline::new();
        assert!(!pipeline.is_stroke_active());
        assert!(!pipeline.can_undo());
        assert_eq!(pipeline.brush().hardness, 0.25);
        assert!(pipeline.brush().negative);
        assert_eq!(pipeline.painter().blur_expand_hops, 1);
    }

    #[test]
    fn test_pipeline_with_custom_config() {
        let config = MaskingConfig {
            hardness: 0.8,
            max_undo_levels: 3,
            ..Default::default()
        };
        let pipeline = MaskingPipeline::with_config(config).unwrap();
        assert_eq!(pipeline.brush().hardness, 0.8);
        assert_eq!(pipeline.config().max_undo_levels, 3);

        let bad = MaskingConfig {
            hardness: 2.0,
            ..Default::default()
        };
        assert!(MaskingPipeline::with_config(bad).is_err());
    }

    #[test]
    fn test_pipeline_stroke_lifecycle() {
        let mut mesh = grid(5);
        let mut pipeline = MaskingPipeline::new();

        let start = PickingResult::new(7, Vec3::new(1.0, 2.0, 0.0), 1.2);
        let stroke_id = pipeline.begin_stroke(&mut mesh, &start, 1.0).unwrap();
        assert_eq!(stroke_id, 0);
        assert!(pipeline.is_stroke_active());

        let next = PickingResult::new(7, Vec3::new(3.0, 2.0, 0.0), 1.2);
        assert!(pipeline.stroke_to(&mut mesh, &next, 1.0).unwrap() > 0);

        let summary = pipeline.end_stroke().unwrap();
        assert!(summary.committed);
        assert!(!pipeline.is_stroke_active());
        assert!(mesh.mask(12) < 1.0);

        assert!(pipeline.undo(7, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![1.0; 25]);
        assert!(pipeline.redo(7, &mut mesh));
        assert!(mesh.mask(12) < 1.0);
    }

    #[test]
    fn test_clear_scenario() {
        // Vertices 1-3 masked; clear unmasks them and undo brings them back
        let mut mesh = line(5);
        let masked = vec![1.0, 0.2, 0.0, 0.6, 1.0];
        mesh.set_mask_values(&masked);
        let mut pipeline = MaskingPipeline::new();

        assert!(pipeline.execute(MaskCommand::Clear, 0, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![1.0; 5]);
        assert!(!pipeline.execute(MaskCommand::Clear, 0, &mut mesh));

        assert!(pipeline.undo(0, &mut mesh));
        assert_eq!(mesh.mask_values(), masked);
        assert!(!pipeline.undo(0, &mut mesh));
    }

    #[test]
    fn test_execute_finalizes_active_stroke() {
        let mut mesh = line(5);
        let mut pipeline = MaskingPipeline::new();
        let picking = PickingResult::new(0, Vec3::new(2.0, 0.0, 0.0), 0.5);
        pipeline.begin_stroke(&mut mesh, &picking, 1.0).unwrap();
        let painted = mesh.mask_values();

        assert!(pipeline.execute(MaskCommand::Invert, 0, &mut mesh));
        assert!(!pipeline.is_stroke_active());
        assert_eq!(pipeline.undo.undo_count(), 2);

        assert!(pipeline.undo(0, &mut mesh));
        assert_eq!(mesh.mask_values(), painted);
        assert_eq!(pipeline.undo.peek(), Some(ActionKind::Stroke { stroke_id: 0 }));
        assert!(pipeline.undo(0, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![1.0; 5]);
    }

    #[test]
    fn test_undo_depth_from_config() {
        let mut mesh = line(3);
        mesh.set_mask_values(&[0.5, 0.5, 0.5]);
        let config = MaskingConfig {
            max_undo_levels: 2,
            ..Default::default()
        };
        let mut pipeline = MaskingPipeline::with_config(config).unwrap();
        for _ in 0..4 {
            pipeline.execute(MaskCommand::Invert, 0, &mut mesh);
        }
        assert_eq!(pipeline.undo.undo_count(), 2);
    }

    #[test]
    fn test_undo_on_other_mesh_leaves_history_intact() {
        let mut mesh = line(5);
        let masked = vec![1.0, 0.2, 0.0, 0.6, 1.0];
        mesh.set_mask_values(&masked);
        let mut pipeline = MaskingPipeline::new();
        assert!(pipeline.execute(MaskCommand::Clear, 0, &mut mesh));

        // Same id but fewer vertices than the snapshot covers
        let mut small = line(3);
        small.set_mask_values(&[0.3, 0.3, 0.3]);
        assert!(!pipeline.undo(0, &mut small));
        assert_eq!(small.mask_values(), vec![0.3; 3]);

        // Entry belongs to mesh 0
        assert!(!pipeline.undo(1, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![1.0; 5]);

        assert!(pipeline.can_undo());
        assert!(pipeline.undo(0, &mut mesh));
        assert_eq!(mesh.mask_values(), masked);
    }

    #[test]
    fn test_set_brush() {
        let mut mesh = line(3);
        let mut pipeline = MaskingPipeline::new();
        let brush = BrushParameters {
            negative: false,
            ..pipeline.brush().clone()
        };
        pipeline.set_brush(brush);
        mesh.set_mask_values(&[0.0, 0.0, 0.0]);

        let picking = PickingResult::new(0, Vec3::ZERO, 0.5);
        pipeline.begin_stroke(&mut mesh, &picking, 1.0).unwrap();
        pipeline.end_stroke().unwrap();
        assert_eq!(mesh.mask(0), 1.0);
    }
}
