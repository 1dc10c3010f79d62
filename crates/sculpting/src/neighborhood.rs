//! Brush neighborhood selection.
//!
//! Both queries are deterministic: the same inputs on an unmodified mesh give
//! the same vertices in the same order. Undo snapshots depend on it.

use std::collections::HashSet;

use glam::Vec3;

use crate::mesh::SculptMesh;

/// Vertices within the brush sphere, ascending and without duplicates.
pub fn select_within_radius<M: SculptMesh + ?Sized>(
    mesh: &M,
    center: Vec3,
    radius_squared: f32,
) -> Vec<usize> {
    let mut indices = mesh.vertices_in_sphere(center, radius_squared);
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Grow `indices` by `hops` rings of 1-ring neighbors.
///
/// The input vertices come first (deduplicated, in their original order),
/// followed by each new ring in discovery order.
pub fn expand<M: SculptMesh + ?Sized>(mesh: &M, indices: &[usize], hops: usize) -> Vec<usize> {
    let mut seen: HashSet<usize> = HashSet::with_capacity(indices.len() * 2);
    let mut result: Vec<usize> = Vec::with_capacity(indices.len() * 2);
    for &index in indices {
        if seen.insert(index) {
            result.push(index);
        }
    }

    let mut frontier_start = 0;
    for _ in 0..hops {
        let frontier_end = result.len();
        if frontier_start == frontier_end {
            break;
        }
        for i in frontier_start..frontier_end {
            let vertex = result[i];
            for &neighbor in mesh.adjacent_vertices(vertex) {
                if seen.insert(neighbor) {
                    result.push(neighbor);
                }
            }
        }
        frontier_start = frontier_end;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures::{grid, line};

    #[test]
    fn test_select_within_radius_on_line() {
        let mesh = line(5);
        let selected = select_within_radius(&mesh, Vec3::new(2.0, 0.0, 0.0), 1.5 * 1.5);
        assert_eq!(selected, vec![1, 2, 3]);
    }

    #[test]
    fn test_select_is_repeatable() {
        let mesh = grid(8);
        let center = Vec3::new(3.3, 4.1, 0.0);
        let first = select_within_radius(&mesh, center, 6.0);
        let second = select_within_radius(&mesh, center, 6.0);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_select_empty_outside_mesh() {
        let mesh = line(5);
        assert!(select_within_radius(&mesh, Vec3::new(0.0, 50.0, 0.0), 1.0).is_empty());
    }

    #[test]
    fn test_expand_rings_on_line() {
        let mesh = line(7);
        assert_eq!(expand(&mesh, &[3], 0), vec![3]);
        assert_eq!(expand(&mesh, &[3], 1), vec![3, 2, 4]);
        assert_eq!(expand(&mesh, &[3], 2), vec![3, 2, 4, 1, 5]);
    }

    #[test]
    fn test_expand_keeps_inputs_first_without_duplicates() {
        let mesh = line(5);
        let expanded = expand(&mesh, &[2, 1, 2], 1);
        assert_eq!(expanded, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_expand_saturates() {
        let mesh = line(3);
        let expanded = expand(&mesh, &[0], 10);
        assert_eq!(expanded, vec![0, 1, 2]);
    }

    #[test]
    fn test_mesh_expand_delegates() {
        let mesh = grid(4);
        assert_eq!(mesh.expand_vertices(&[5], 1), expand(&mesh, &[5], 1));
    }
}
