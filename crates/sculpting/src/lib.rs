//! Mask painting for mesh sculpting.
//!
//! This crate provides the masking tool of the sculpting system:
//! - Brush-based mask painting with a hardness-controlled falloff
//! - Whole-selection commands (blur, sharpen, clear, invert)
//! - Laplacian smoothing of per-vertex material channels
//! - Stroke-scoped undo/redo snapshots
//!
//! # Architecture
//!
//! The mask is the third float of each vertex's material record. A value of
//! 1.0 leaves the vertex free for other brushes, 0.0 fully protects it.
//!
//! ## Key Components
//!
//! - **Brush**: Falloff curve and brush settings
//! - **Mesh**: The [`SculptMesh`] capability trait and the [`MaskedMesh`] reference mesh
//! - **Neighborhood**: Radius selection and ring expansion
//! - **Masking**: Paint and the mask commands
//! - **Smoothing**: Laplacian averaging over 1-ring neighbors
//! - **Undo**: Snapshots and whole-mesh inverse actions
//! - **Stroke**: Dab spacing and per-stroke undo capture
//! - **Pipeline**: Orchestrates stroke → paint → undo, plus commands

pub mod brush;
pub mod masking;
pub mod mesh;
pub mod neighborhood;
pub mod picking;
pub mod pipeline;
pub mod refresh;
pub mod smoothing;
pub mod spatial;
pub mod stroke;
pub mod types;
pub mod undo;

pub use brush::{BrushParameters, Falloff, falloff_weight};
pub use masking::{MaskPainter, invert_mask, masked_vertices};
pub use mesh::{MaskedMesh, MeshError, SculptMesh};
pub use picking::{AlphaSampler, PickingResult};
pub use pipeline::MaskingPipeline;
pub use refresh::{DirtyVertices, RefreshRegion};
pub use stroke::{
    BrushStroke, Dab, MAX_DABS_PER_SAMPLE, PaintOperation, StrokeError, StrokeSummary,
};
pub use types::{MaskCommand, MaterialChannel, VertexMaterial, clamp_mask};
pub use undo::{ActionKind, UndoAction, UndoEntry, UndoStack, VertexSnapshot};

pub use sculpting_config::{ConfigError, MaskingConfig};
