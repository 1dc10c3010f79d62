//! Visual refresh tracking for masked meshes.
//!
//! The masking engine never talks to the renderer. After each mutation it
//! reports which vertices changed; the render collaborator drains the tracker
//! and re-uploads the material buffer for those vertices.

use std::collections::BTreeSet;

/// Region of a mesh whose material data must be re-uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRegion<'a> {
    /// Only these vertices changed
    Vertices(&'a [usize]),
    /// Every vertex may have changed
    All,
}

/// Tracks which vertices have been modified since the last upload.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirtyVertices {
    /// Set of modified vertex indices (ascending)
    pub modified: BTreeSet<usize>,
    /// Whole mesh needs re-upload
    pub all: bool,
}

impl DirtyVertices {
    /// Create a new empty dirty vertex tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark multiple vertices as modified.
    pub fn mark_all(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.modified.extend(indices);
    }

    /// Record a refresh request.
    pub fn record(&mut self, region: RefreshRegion<'_>) {
        match region {
            RefreshRegion::Vertices(indices) => self.mark_all(indices.iter().copied()),
            RefreshRegion::All => self.all = true,
        }
    }

    /// Check if anything is dirty.
    pub fn is_empty(&self) -> bool {
        !self.all && self.modified.is_empty()
    }

    /// Get the number of individually dirty vertices.
    pub fn len(&self) -> usize {
        self.modified.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_vertices() {
        let mut dirty = DirtyVertices::new();
        assert!(dirty.is_empty());

        dirty.mark_all([0, 1]);
        assert_eq!(dirty.len(), 2);

        dirty.mark_all([0]); // Duplicate
        assert_eq!(dirty.len(), 2);
        assert!(!dirty.is_empty());
    }

    #[test]
    fn test_record_regions() {
        let mut dirty = DirtyVertices::new();
        dirty.record(RefreshRegion::Vertices(&[4, 2, 4]));
        assert_eq!(dirty.modified.iter().copied().collect::<Vec<_>>(), vec![2, 4]);
        assert!(!dirty.all);

        dirty.record(RefreshRegion::All);
        assert!(dirty.all);
        assert!(!dirty.is_empty());
    }
}
