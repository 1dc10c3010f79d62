//! Undo/redo for mask edits.
//!
//! Local edits (strokes, blur, sharpen, clear) store the pre-edit mask values
//! of every vertex they touch. Whole-mesh inversion is its own inverse and is
//! stored as a data-free marker. Every entry carries the lookup key of the mesh
//! it was recorded on and only applies to that mesh.

use std::collections::HashSet;

use sculpting_config::DEFAULT_MAX_UNDO_LEVELS;
use tracing::{debug, warn};

use crate::masking::invert_mask;
use crate::mesh::SculptMesh;
use crate::refresh::RefreshRegion;
use crate::types::MaskCommand;

/// Mask values of a vertex set at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexSnapshot {
    pub indices: Vec<usize>,
    pub mask_values: Vec<f32>,
}

impl VertexSnapshot {
    /// Record the current mask values of `indices`.
    ///
    /// Indices outside the mesh are skipped.
    pub fn capture<M: SculptMesh + ?Sized>(mesh: &M, indices: &[usize]) -> Self {
        let materials = mesh.materials();
        let (indices, mask_values) = indices
            .iter()
            .filter_map(|&i| materials.get(i).map(|m| (i, m.mask)))
            .unzip();
        Self {
            indices,
            mask_values,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether every stored index exists in `mesh`.
    pub fn fits<M: SculptMesh + ?Sized>(&self, mesh: &M) -> bool {
        let vertex_count = mesh.vertex_count();
        self.indices.iter().all(|&i| i < vertex_count)
    }

    /// Write the stored values back and return the values they replaced.
    ///
    /// Values are copied bit for bit; they were valid when captured. The
    /// caller checks [`Self::fits`] first.
    pub(crate) fn swap_into<M: SculptMesh + ?Sized>(&self, mesh: &mut M) -> VertexSnapshot {
        let current = Self::capture(mesh, &self.indices);
        let materials = mesh.materials_mut();
        // Reverse so the earliest capture of a repeated index wins
        for (&index, &value) in self.indices.iter().zip(&self.mask_values).rev() {
            if let Some(material) = materials.get_mut(index) {
                material.mask = value;
            }
        }
        mesh.request_visual_refresh(RefreshRegion::Vertices(&self.indices));
        current
    }
}

/// Collects first-touch mask values over the course of one action.
///
/// A stroke visits the same vertex many times; only the value from before
/// the first dab is needed to revert it.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    seen: HashSet<usize>,
    snapshot: VertexSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture any of `indices` not captured yet.
    pub fn capture<M: SculptMesh + ?Sized>(&mut self, mesh: &M, indices: &[usize]) {
        let materials = mesh.materials();
        for &index in indices {
            let Some(material) = materials.get(index) else {
                continue;
            };
            if self.seen.insert(index) {
                self.snapshot.indices.push(index);
                self.snapshot.mask_values.push(material.mask);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn finish(self) -> VertexSnapshot {
        self.snapshot
    }
}

/// What to do to revert an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    /// Restore these pre-edit values
    VertexSnapshot(VertexSnapshot),
    /// Invert the whole mask again
    FullMeshInverse,
}

/// Origin of an undo entry, for logging and UI labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Stroke { stroke_id: u64 },
    Command(MaskCommand),
}

/// One reversible unit on the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    /// Lookup key of the mesh the action was recorded on
    pub mesh_id: u32,
    pub kind: ActionKind,
    pub action: UndoAction,
}

/// Bounded undo/redo history for the mask channel.
#[derive(Debug)]
pub struct UndoStack {
    /// Undo stack (most recent at end)
    undo_stack: Vec<UndoEntry>,
    /// Entries undone since the last new action (most recent at end)
    redo_stack: Vec<UndoEntry>,
    max_undo_levels: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_LEVELS)
    }
}

impl UndoStack {
    /// Create a stack keeping at most `max_undo_levels` entries (minimum 1).
    pub fn new(max_undo_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo_levels: max_undo_levels.max(1),
        }
    }

    /// Record a new reversible action. Clears the redo history.
    pub fn push(&mut self, entry: UndoEntry) {
        self.redo_stack.clear();
        self.undo_stack.push(entry);

        // Limit undo stack size
        while self.undo_stack.len() > self.max_undo_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Snapshot `indices` of mesh `mesh_id` before a local edit.
    pub fn capture_vertex_snapshot<M: SculptMesh + ?Sized>(
        &mut self,
        mesh_id: u32,
        mesh: &M,
        indices: &[usize],
        kind: ActionKind,
    ) {
        let snapshot = VertexSnapshot::capture(mesh, indices);
        debug!("Captured {} vertices of mesh {} for {:?}", snapshot.len(), mesh_id, kind);
        self.push(UndoEntry {
            mesh_id,
            kind,
            action: UndoAction::VertexSnapshot(snapshot),
        });
    }

    /// Record a whole-mesh inversion of mesh `mesh_id`.
    pub fn capture_full_mesh_inverse(&mut self, mesh_id: u32, kind: ActionKind) {
        debug!("Captured full mesh inverse of mesh {} for {:?}", mesh_id, kind);
        self.push(UndoEntry {
            mesh_id,
            kind,
            action: UndoAction::FullMeshInverse,
        });
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Kind of the entry the next undo would revert.
    pub fn peek(&self) -> Option<ActionKind> {
        self.undo_stack.last().map(|entry| entry.kind)
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Revert the most recent entry on mesh `mesh_id`.
    ///
    /// Returns true if an undo was performed. The stack is left untouched and
    /// false returned when it is empty or the top entry belongs to another
    /// mesh.
    pub fn undo<M: SculptMesh + ?Sized>(&mut self, mesh_id: u32, mesh: &mut M) -> bool {
        let Some(entry) = self.undo_stack.last() else {
            debug!("Undo: no entries available");
            return false;
        };
        if !Self::applies_to(entry, mesh_id, mesh) {
            return false;
        }
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        debug!("Undoing {:?} on mesh {}", entry.kind, mesh_id);
        let inverse = Self::apply(entry, mesh);
        self.redo_stack.push(inverse);
        true
    }

    /// Re-apply the most recently undone entry on mesh `mesh_id`.
    ///
    /// Returns true if a redo was performed, false if nothing was undone or
    /// the entry belongs to another mesh.
    pub fn redo<M: SculptMesh + ?Sized>(&mut self, mesh_id: u32, mesh: &mut M) -> bool {
        let Some(entry) = self.redo_stack.last() else {
            debug!("Redo: no entries available");
            return false;
        };
        if !Self::applies_to(entry, mesh_id, mesh) {
            return false;
        }
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        debug!("Redoing {:?} on mesh {}", entry.kind, mesh_id);
        let inverse = Self::apply(entry, mesh);
        self.undo_stack.push(inverse);
        true
    }

    fn applies_to<M: SculptMesh + ?Sized>(entry: &UndoEntry, mesh_id: u32, mesh: &M) -> bool {
        if entry.mesh_id != mesh_id {
            warn!(
                "{:?} was recorded on mesh {}, not mesh {}",
                entry.kind, entry.mesh_id, mesh_id
            );
            return false;
        }
        if let UndoAction::VertexSnapshot(snapshot) = &entry.action {
            if !snapshot.fits(mesh) {
                warn!(
                    "{:?} references vertices missing from mesh {} ({} vertices)",
                    entry.kind,
                    mesh_id,
                    mesh.vertex_count()
                );
                return false;
            }
        }
        true
    }

    /// Apply an entry and return the entry that reverts it.
    fn apply<M: SculptMesh + ?Sized>(entry: UndoEntry, mesh: &mut M) -> UndoEntry {
        let action = match entry.action {
            UndoAction::VertexSnapshot(snapshot) => {
                UndoAction::VertexSnapshot(snapshot.swap_into(mesh))
            }
            UndoAction::FullMeshInverse => {
                invert_mask(mesh);
                UndoAction::FullMeshInverse
            }
        };
        UndoEntry {
            mesh_id: entry.mesh_id,
            kind: entry.kind,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::line;

    const MESH: u32 = 4;
    const STROKE: ActionKind = ActionKind::Stroke { stroke_id: 7 };

    #[test]
    fn test_empty_stack_is_noop() {
        let mut mesh = line(3);
        let mut stack = UndoStack::default();
        assert!(!stack.can_undo());
        assert!(!stack.undo(MESH, &mut mesh));
        assert!(!stack.redo(MESH, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_capture_then_undo_is_bit_identical() {
        let mut mesh = line(4);
        mesh.set_mask_values(&[0.1, 0.333, 0.9, 0.0]);
        let before: Vec<u32> = mesh.mask_values().iter().map(|v| v.to_bits()).collect();

        let mut stack = UndoStack::default();
        stack.capture_vertex_snapshot(MESH, &mesh, &[1, 2], STROKE);
        mesh.set_mask(1, 0.77);
        mesh.set_mask(2, 0.0);

        assert!(stack.undo(MESH, &mut mesh));
        let after: Vec<u32> = mesh.mask_values().iter().map(|v| v.to_bits()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_redo_reapplies_edit() {
        let mut mesh = line(3);
        let mut stack = UndoStack::default();
        stack.capture_vertex_snapshot(MESH, &mesh, &[0, 1], STROKE);
        mesh.set_mask(0, 0.25);
        mesh.set_mask(1, 0.5);

        assert!(stack.undo(MESH, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![1.0, 1.0, 1.0]);
        assert!(stack.can_redo());

        assert!(stack.redo(MESH, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![0.25, 0.5, 1.0]);
        assert_eq!(stack.undo_count(), 1);
        assert_eq!(stack.redo_count(), 0);
    }

    #[test]
    fn test_new_action_clears_redo() {
        let mut mesh = line(2);
        let mut stack = UndoStack::default();
        stack.capture_vertex_snapshot(MESH, &mesh, &[0], STROKE);
        mesh.set_mask(0, 0.5);
        stack.undo(MESH, &mut mesh);
        assert!(stack.can_redo());

        stack.capture_full_mesh_inverse(MESH, ActionKind::Command(MaskCommand::Invert));
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_full_mesh_inverse_undo() {
        let mut mesh = line(3);
        mesh.set_mask_values(&[0.25, 0.5, 1.0]);
        let mut stack = UndoStack::default();
        stack.capture_full_mesh_inverse(MESH, ActionKind::Command(MaskCommand::Invert));
        invert_mask(&mut mesh);
        assert_eq!(mesh.mask_values(), vec![0.75, 0.5, 0.0]);

        assert!(stack.undo(MESH, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![0.25, 0.5, 1.0]);
        assert!(stack.redo(MESH, &mut mesh));
        assert_eq!(mesh.mask_values(), vec![0.75, 0.5, 0.0]);
    }

    #[test]
    fn test_max_levels_drops_oldest() {
        let mesh = line(1);
        let mut stack = UndoStack::new(2);
        for stroke_id in 0..4 {
            stack.capture_vertex_snapshot(MESH, &mesh, &[0], ActionKind::Stroke { stroke_id });
        }
        assert_eq!(stack.undo_count(), 2);
        assert_eq!(stack.peek(), Some(ActionKind::Stroke { stroke_id: 3 }));
    }

    #[test]
    fn test_builder_keeps_first_touch() {
        let mut mesh = line(3);
        let mut builder = SnapshotBuilder::new();
        builder.capture(&mesh, &[0, 1]);
        mesh.set_mask(1, 0.2);
        builder.capture(&mesh, &[1, 2]);
        let snapshot = builder.finish();
        assert_eq!(snapshot.indices, vec![0, 1, 2]);
        assert_eq!(snapshot.mask_values, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_restore_flags_refresh() {
        let mut mesh = line(3);
        let mut stack = UndoStack::default();
        stack.capture_vertex_snapshot(MESH, &mesh, &[2], STROKE);
        mesh.set_mask(2, 0.0);
        mesh.take_dirty();
        stack.undo(MESH, &mut mesh);
        let dirty = mesh.take_dirty();
        assert!(dirty.modified.contains(&2));
    }

    #[test]
    fn test_undo_ignores_other_mesh() {
        let mut mesh = line(3);
        let mut stack = UndoStack::default();
        stack.capture_vertex_snapshot(MESH, &mesh, &[0], STROKE);
        mesh.set_mask(0, 0.5);

        let mut other = line(3);
        assert!(!stack.undo(MESH + 1, &mut other));
        assert_eq!(other.mask_values(), vec![1.0, 1.0, 1.0]);
        assert_eq!(stack.undo_count(), 1);

        assert!(stack.undo(MESH, &mut mesh));
        assert_eq!(mesh.mask(0), 1.0);
    }

    #[test]
    fn test_undo_on_smaller_mesh_is_rejected() {
        let mut mesh = line(5);
        let mut stack = UndoStack::default();
        stack.capture_vertex_snapshot(MESH, &mesh, &[1, 3, 4], STROKE);
        mesh.set_mask(4, 0.0);

        let mut small = line(3);
        assert!(!stack.undo(MESH, &mut small));
        assert_eq!(small.mask_values(), vec![1.0, 1.0, 1.0]);
        assert!(stack.can_undo());
    }

    #[test]
    fn test_capture_skips_unknown_vertices() {
        let mesh = line(2);
        let snapshot = VertexSnapshot::capture(&mesh, &[1, 2, 0]);
        assert_eq!(snapshot.indices, vec![1, 0]);
        let mut builder = SnapshotBuilder::new();
        builder.capture(&mesh, &[5, 0]);
        assert_eq!(builder.finish().indices, vec![0]);
    }
}
