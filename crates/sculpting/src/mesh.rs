//! Mesh capability consumed by the masking engine.
//!
//! The engine only needs positions, normals, the material channel, 1-ring
//! adjacency, boundary flags and a radius query. [`SculptMesh`] describes that
//! surface; [`MaskedMesh`] is an indexed-triangle implementation with an octree
//! for brush queries, used by tools that do not bring their own topology.

use std::collections::HashMap;

use glam::Vec3;
use thiserror::Error;
use tracing::debug;

use crate::neighborhood;
use crate::refresh::{DirtyVertices, RefreshRegion};
use crate::spatial::VertexOctree;
use crate::types::{MASK_MAX, MaterialChannel, VertexMaterial, clamp_mask};

/// Errors that can occur while building a mesh
#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("Position buffer length {0} is not a multiple of 3")]
    RaggedPositions(usize),
    #[error("Vertex index {index} out of range ({vertex_count} vertices)")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("Degenerate element {0:?} repeats a vertex")]
    DegenerateElement(Vec<u32>),
}

/// Capability interface of a sculptable mesh.
///
/// Indices passed to these methods come from the mesh's own queries; an index
/// outside `0..vertex_count()` is a caller bug.
pub trait SculptMesh {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Vertex positions in mesh space.
    fn positions(&self) -> &[Vec3];

    /// Vertex normals (zero where undefined).
    fn normals(&self) -> &[Vec3];

    /// Per-vertex material records.
    fn materials(&self) -> &[VertexMaterial];

    /// Mutable view of the material records.
    fn materials_mut(&mut self) -> &mut [VertexMaterial];

    /// 1-ring neighbors of a vertex, without the vertex itself.
    fn adjacent_vertices(&self, index: usize) -> &[usize];

    /// Whether the vertex lies on an open border of the surface.
    fn is_boundary_vertex(&self, index: usize) -> bool;

    /// Flag changed material data for the render collaborator.
    fn request_visual_refresh(&mut self, region: RefreshRegion<'_>);

    /// Vertices within `sqrt(radius_squared)` of `center`.
    ///
    /// The default is a linear scan; implementations with a spatial index
    /// should override it.
    fn vertices_in_sphere(&self, center: Vec3, radius_squared: f32) -> Vec<usize> {
        self.positions()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance_squared(center) <= radius_squared)
            .map(|(i, _)| i)
            .collect()
    }

    /// Grow a vertex set by `hops` rings of neighbors.
    fn expand_vertices(&self, indices: &[usize], hops: usize) -> Vec<usize> {
        neighborhood::expand(self, indices, hops)
    }

    fn vertex_position(&self, index: usize) -> Vec3 {
        self.positions()[index]
    }

    fn vertex_normal(&self, index: usize) -> Vec3 {
        self.normals()[index]
    }

    /// Mask value of one vertex.
    fn mask(&self, index: usize) -> f32 {
        self.materials()[index].mask
    }

    /// Write a mask value, clamped to `[0, 1]`.
    fn set_mask(&mut self, index: usize, value: f32) {
        self.materials_mut()[index].mask = clamp_mask(value);
    }

    /// Read one material channel of one vertex.
    fn channel(&self, index: usize, channel: MaterialChannel) -> f32 {
        self.materials()[index].get(channel)
    }

    /// Write one material channel of one vertex.
    fn set_channel(&mut self, index: usize, channel: MaterialChannel, value: f32) {
        self.materials_mut()[index].set(channel, value);
    }
}

/// Indexed mesh with cached adjacency, boundary flags and an octree.
#[derive(Debug, Clone)]
pub struct MaskedMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    materials: Vec<VertexMaterial>,
    /// Sorted 1-ring per vertex
    rings: Vec<Vec<usize>>,
    on_boundary: Vec<bool>,
    octree: VertexOctree,
    dirty: DirtyVertices,
}

impl MaskedMesh {
    /// Build from positions and triangle indices.
    pub fn from_triangles(positions: Vec<Vec3>, triangles: &[[u32; 3]]) -> Result<Self, MeshError> {
        let vertex_count = positions.len();
        for triangle in triangles {
            for &index in triangle {
                check_index(index, vertex_count)?;
            }
            let [a, b, c] = *triangle;
            if a == b || b == c || a == c {
                return Err(MeshError::DegenerateElement(triangle.to_vec()));
            }
        }

        // Face count per undirected edge; edges used by one face are borders
        let mut edge_faces: HashMap<(usize, usize), u32> = HashMap::new();
        let mut normals = vec![Vec3::ZERO; vertex_count];
        for &[a, b, c] in triangles {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_faces.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
            // Area-weighted face normal
            let face_normal = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }
        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }

        let mut rings = vec![Vec::new(); vertex_count];
        let mut on_boundary = vec![false; vertex_count];
        for (&(u, v), &count) in &edge_faces {
            rings[u].push(v);
            rings[v].push(u);
            if count == 1 {
                on_boundary[u] = true;
                on_boundary[v] = true;
            }
        }

        debug!(
            "MaskedMesh::from_triangles: {} vertices, {} triangles, {} edges",
            vertex_count,
            triangles.len(),
            edge_faces.len()
        );
        Ok(Self::assemble(positions, normals, rings, on_boundary))
    }

    /// Build a face-less mesh (polyline or graph) from explicit edges.
    ///
    /// Without faces no vertex is on a boundary and normals are zero.
    pub fn from_edges(positions: Vec<Vec3>, edges: &[[u32; 2]]) -> Result<Self, MeshError> {
        let vertex_count = positions.len();
        let mut rings = vec![Vec::new(); vertex_count];
        for &[a, b] in edges {
            check_index(a, vertex_count)?;
            check_index(b, vertex_count)?;
            if a == b {
                return Err(MeshError::DegenerateElement(vec![a, b]));
            }
            rings[a as usize].push(b as usize);
            rings[b as usize].push(a as usize);
        }
        let normals = vec![Vec3::ZERO; vertex_count];
        let on_boundary = vec![false; vertex_count];
        Ok(Self::assemble(positions, normals, rings, on_boundary))
    }

    /// Build from a flat `[x, y, z, x, y, z, ...]` buffer and triangles.
    pub fn from_flat_positions(flat: &[f32], triangles: &[[u32; 3]]) -> Result<Self, MeshError> {
        if flat.len() % 3 != 0 {
            return Err(MeshError::RaggedPositions(flat.len()));
        }
        let positions = flat
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        Self::from_triangles(positions, triangles)
    }

    fn assemble(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        mut rings: Vec<Vec<usize>>,
        on_boundary: Vec<bool>,
    ) -> Self {
        for ring in &mut rings {
            ring.sort_unstable();
            ring.dedup();
        }
        let octree = VertexOctree::from_positions(&positions);
        let materials = vec![VertexMaterial::default(); positions.len()];
        Self {
            positions,
            normals,
            materials,
            rings,
            on_boundary,
            octree,
            dirty: DirtyVertices::new(),
        }
    }

    /// Positions as a flat float buffer (3 floats per vertex).
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Materials as a flat float buffer; the mask is every third float from 2.
    pub fn materials_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.materials)
    }

    /// Copy of the mask channel.
    pub fn mask_values(&self) -> Vec<f32> {
        self.materials.iter().map(|m| m.mask).collect()
    }

    /// Overwrite the mask channel (values are clamped).
    ///
    /// Extra values are ignored; missing ones leave vertices unchanged.
    pub fn set_mask_values(&mut self, values: &[f32]) {
        for (material, &value) in self.materials.iter_mut().zip(values) {
            material.mask = clamp_mask(value);
        }
        self.dirty.record(RefreshRegion::All);
    }

    /// Explicit reset: every vertex fully unmasked.
    pub fn reset_mask(&mut self) {
        for material in &mut self.materials {
            material.mask = MASK_MAX;
        }
        self.dirty.record(RefreshRegion::All);
    }

    /// Whether material data changed since the last [`Self::take_dirty`].
    pub fn needs_refresh(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drain the pending refresh set.
    pub fn take_dirty(&mut self) -> DirtyVertices {
        std::mem::take(&mut self.dirty)
    }
}

fn check_index(index: u32, vertex_count: usize) -> Result<(), MeshError> {
    if (index as usize) < vertex_count {
        Ok(())
    } else {
        Err(MeshError::IndexOutOfRange {
            index,
            vertex_count,
        })
    }
}

impl SculptMesh for MaskedMesh {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    fn materials(&self) -> &[VertexMaterial] {
        &self.materials
    }

    fn materials_mut(&mut self) -> &mut [VertexMaterial] {
        &mut self.materials
    }

    fn adjacent_vertices(&self, index: usize) -> &[usize] {
        &self.rings[index]
    }

    fn is_boundary_vertex(&self, index: usize) -> bool {
        self.on_boundary[index]
    }

    fn request_visual_refresh(&mut self, region: RefreshRegion<'_>) {
        self.dirty.record(region);
    }

    fn vertices_in_sphere(&self, center: Vec3, radius_squared: f32) -> Vec<usize> {
        self.octree.query_sphere(center, radius_squared)
    }
}
