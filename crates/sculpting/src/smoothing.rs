//! Laplacian smoothing of material channels.
//!
//! Two-pass: every target value is computed
//! from the unmodified channel first, so the result does not depend on the
//! order of the input vertices.

use crate::mesh::SculptMesh;
use crate::types::MaterialChannel;

/// Mean of the 1-ring neighbors of each vertex, for one channel.
///
/// Returns one value per entry of `indices`. Border vertices only average the
/// neighbors that are also on the border when at least two exist, and the
/// whole ring otherwise. A vertex without neighbors keeps its own value.
pub fn laplacian_smooth<M: SculptMesh + ?Sized>(
    mesh: &M,
    indices: &[usize],
    channel: MaterialChannel,
) -> Vec<f32> {
    let materials = mesh.materials();
    indices
        .iter()
        .map(|&index| {
            let own = materials[index].get(channel);
            let neighbors = mesh.adjacent_vertices(index);

            let ring_mean = || {
                neighbors.iter().fold((0.0f32, 0usize), |(sum, count), &n| {
                    (sum + materials[n].get(channel), count + 1)
                })
            };

            let (sum, count) = if mesh.is_boundary_vertex(index) {
                let (sum, count) = neighbors
                    .iter()
                    .filter(|&&n| mesh.is_boundary_vertex(n))
                    .fold((0.0f32, 0usize), |(sum, count), &n| {
                        (sum + materials[n].get(channel), count + 1)
                    });
                if count >= 2 { (sum, count) } else { ring_mean() }
            } else {
                ring_mean()
            };

            if count == 0 { own } else { sum / count as f32 }
        })
        .collect()
}

/// Smooth a channel in place over `indices`.
///
/// Reads all inputs before writing any output.
pub fn smooth_in_place<M: SculptMesh + ?Sized>(mesh: &mut M, indices: &[usize], channel: MaterialChannel) {
    let smoothed = laplacian_smooth(mesh, indices, channel);
    let materials = mesh.materials_mut();
    for (&index, value) in indices.iter().zip(smoothed) {
        materials[index].set(channel, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::{grid, line};

    #[test]
    fn test_uniform_field_is_fixed_point() {
        let mut mesh = grid(5);
        mesh.set_mask_values(&[0.375; 25]);
        let all: Vec<usize> = (0..25).collect();
        let smoothed = laplacian_smooth(&mesh, &all, MaterialChannel::Mask);
        assert!(smoothed.iter().all(|&v| v == 0.375));

        let mut line_mesh = line(5);
        line_mesh.set_mask_values(&[0.5; 5]);
        let smoothed = laplacian_smooth(&line_mesh, &[0, 1, 2, 3, 4], MaterialChannel::Mask);
        assert!(smoothed.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_mean_excludes_self() {
        let mut mesh = line(3);
        mesh.set_mask_values(&[0.0, 1.0, 0.5]);
        let smoothed = laplacian_smooth(&mesh, &[1], MaterialChannel::Mask);
        assert!((smoothed[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_order_independent() {
        let mut mesh = line(5);
        mesh.set_mask_values(&[0.0, 0.2, 0.9, 0.4, 1.0]);
        let forward = laplacian_smooth(&mesh, &[0, 1, 2, 3, 4], MaterialChannel::Mask);
        let backward = laplacian_smooth(&mesh, &[4, 3, 2, 1, 0], MaterialChannel::Mask);
        let reversed: Vec<f32> = backward.into_iter().rev().collect();
        assert_eq!(forward, reversed);

        // In-place write uses the same pre-smoothing snapshot
        let mut a = mesh.clone();
        let mut b = mesh.clone();
        smooth_in_place(&mut a, &[0, 1, 2, 3, 4], MaterialChannel::Mask);
        smooth_in_place(&mut b, &[4, 3, 2, 1, 0], MaterialChannel::Mask);
        assert_eq!(a.mask_values(), b.mask_values());
    }

    #[test]
    fn test_border_vertices_follow_border() {
        let mut mesh = grid(3);
        // Interior vertex 4 is very different from the border
        let mut values = [1.0; 9];
        values[4] = 0.0;
        mesh.set_mask_values(&values);
        // Corner 0 has border neighbors 1 and 3 and interior neighbor 4
        let smoothed = laplacian_smooth(&mesh, &[0, 4], MaterialChannel::Mask);
        assert_eq!(smoothed[0], 1.0);
        assert_eq!(smoothed[1], 1.0);
    }

    #[test]
    fn test_isolated_vertex_keeps_value() {
        let mut mesh = line(1);
        mesh.set_mask_values(&[0.3]);
        let smoothed = laplacian_smooth(&mesh, &[0], MaterialChannel::Mask);
        assert_eq!(smoothed, vec![0.3]);
    }

    #[test]
    fn test_other_channels() {
        let mut mesh = line(3);
        mesh.materials_mut()[0].roughness = 0.0;
        mesh.materials_mut()[2].roughness = 1.0;
        smooth_in_place(&mut mesh, &[1], MaterialChannel::Roughness);
        assert!((mesh.materials()[1].roughness - 0.5).abs() < 1e-6);
        // Mask untouched
        assert_eq!(mesh.mask(1), 1.0);
    }

    /// Hand-built topology for cases the fixtures cannot produce.
    struct RingMesh {
        positions: Vec<glam::Vec3>,
        materials: Vec<crate::types::VertexMaterial>,
        rings: Vec<Vec<usize>>,
        on_boundary: Vec<bool>,
    }

    impl SculptMesh for RingMesh {
        fn vertex_count(&self) -> usize {
            self.positions.len()
        }
        fn positions(&self) -> &[glam::Vec3] {
            &self.positions
        }
        fn normals(&self) -> &[glam::Vec3] {
            &self.positions
        }
        fn materials(&self) -> &[crate::types::VertexMaterial] {
            &self.materials
        }
        fn materials_mut(&mut self) -> &mut [crate::types::VertexMaterial] {
            &mut self.materials
        }
        fn adjacent_vertices(&self, index: usize) -> &[usize] {
            &self.rings[index]
        }
        fn is_boundary_vertex(&self, index: usize) -> bool {
            self.on_boundary[index]
        }
        fn request_visual_refresh(&mut self, _region: crate::refresh::RefreshRegion<'_>) {}
    }

    #[test]
    fn test_border_vertex_with_one_border_neighbor_uses_ring() {
        // Vertex 0 is on the border but only neighbor 1 is
        let mut materials = vec![crate::types::VertexMaterial::default(); 4];
        materials[1].mask = 0.0;
        materials[2].mask = 0.5;
        materials[3].mask = 1.0;
        let mesh = RingMesh {
            positions: vec![glam::Vec3::ZERO; 4],
            materials,
            rings: vec![vec![1, 2, 3], vec![0], vec![0], vec![0]],
            on_boundary: vec![true, true, false, false],
        };
        let smoothed = laplacian_smooth(&mesh, &[0], MaterialChannel::Mask);
        assert!((smoothed[0] - 0.5).abs() < 1e-6);
    }
}
