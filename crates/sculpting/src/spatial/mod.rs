//! Spatial index for brush radius queries.
//!
//! The octree stores vertex indices by position. Query results are returned in
//! ascending index order so the same brush over the same mesh always visits
//! the same vertices in the same order.

use glam::Vec3;

/// Limits for octree subdivision.
#[derive(Debug, Clone)]
struct OctreeConfig {
    max_depth: u32,
    /// Maximum items per leaf node before splitting.
    max_items_per_leaf: usize,
    /// Minimum node size (prevents infinite subdivision).
    min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_items_per_leaf: 16,
            min_node_size: 0.01,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn intersects_sphere(&self, center: Vec3, radius_squared: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius_squared
    }

    /// Get the octant index for a point (0-7).
    fn octant_for_point(&self, point: Vec3) -> usize {
        let center = self.center();
        let mut index = 0;
        if point.x >= center.x {
            index |= 1;
        }
        if point.y >= center.y {
            index |= 2;
        }
        if point.z >= center.z {
            index |= 4;
        }
        index
    }

    /// Get the bounds for a specific octant.
    fn octant_bounds(&self, octant: usize) -> Aabb {
        let center = self.center();
        let min = Vec3::new(
            if octant & 1 != 0 { center.x } else { self.min.x },
            if octant & 2 != 0 { center.y } else { self.min.y },
            if octant & 4 != 0 { center.z } else { self.min.z },
        );
        let max = Vec3::new(
            if octant & 1 != 0 { self.max.x } else { center.x },
            if octant & 2 != 0 { self.max.y } else { center.y },
            if octant & 4 != 0 { self.max.z } else { center.z },
        );
        Aabb::new(min, max)
    }
}

#[derive(Debug, Clone, Copy)]
struct OctreeItem {
    index: usize,
    position: Vec3,
}

#[derive(Debug, Clone)]
enum OctreeNode {
    Leaf {
        bounds: Aabb,
        items: Vec<OctreeItem>,
    },
    Internal {
        bounds: Aabb,
        children: Box<[Option<OctreeNode>; 8]>,
    },
}

/// Octree over vertex positions, keyed by vertex index.
#[derive(Debug, Clone)]
pub struct VertexOctree {
    root: OctreeNode,
    config: OctreeConfig,
    len: usize,
}

impl VertexOctree {
    /// Create a new empty octree with the given bounds.
    pub fn new(bounds: Aabb) -> Self {
        Self {
            root: OctreeNode::Leaf {
                bounds,
                items: Vec::new(),
            },
            config: OctreeConfig::default(),
            len: 0,
        }
    }

    /// Build an octree indexing `positions[i]` as vertex `i`.
    pub fn from_positions(positions: &[Vec3]) -> Self {
        let mut bounds = Aabb::empty();
        for &position in positions {
            bounds.include_point(position);
        }
        if positions.is_empty() {
            bounds = Aabb::new(Vec3::ZERO, Vec3::ZERO);
        }

        // Expand bounds slightly so points on the faces land inside
        let padding = bounds.size() * 0.01 + Vec3::splat(0.001);
        bounds.min -= padding;
        bounds.max += padding;

        let mut octree = Self::new(bounds);
        for (index, &position) in positions.iter().enumerate() {
            octree.insert(index, position);
        }
        octree
    }

    /// Insert a vertex into the octree.
    fn insert(&mut self, index: usize, position: Vec3) {
        let config = self.config.clone();
        Self::insert_into_node(&mut self.root, OctreeItem { index, position }, 0, &config);
        self.len += 1;
    }

    fn insert_into_node(node: &mut OctreeNode, item: OctreeItem, depth: u32, config: &OctreeConfig) {
        match node {
            OctreeNode::Leaf { bounds, items } => {
                items.push(item);

                if items.len() > config.max_items_per_leaf
                    && depth < config.max_depth
                    && bounds.size().min_element() > config.min_node_size * 2.0
                {
                    let old_items = std::mem::take(items);
                    let old_bounds = *bounds;

                    *node = OctreeNode::Internal {
                        bounds: old_bounds,
                        children: Box::new([None, None, None, None, None, None, None, None]),
                    };

                    for item in old_items {
                        Self::insert_into_node(node, item, depth, config);
                    }
                }
            }
            OctreeNode::Internal { bounds, children } => {
                let octant = bounds.octant_for_point(item.position);
                let child = children[octant].get_or_insert_with(|| OctreeNode::Leaf {
                    bounds: bounds.octant_bounds(octant),
                    items: Vec::new(),
                });
                Self::insert_into_node(child, item, depth + 1, config);
            }
        }
    }

    /// All vertices with `|p - center|² <= radius_squared`, ascending.
    pub fn query_sphere(&self, center: Vec3, radius_squared: f32) -> Vec<usize> {
        let mut results = Vec::new();
        Self::query_sphere_node(&self.root, center, radius_squared, &mut results);
        results.sort_unstable();
        results
    }

    fn query_sphere_node(node: &OctreeNode, center: Vec3, radius_squared: f32, results: &mut Vec<usize>) {
        match node {
            OctreeNode::Leaf { bounds, items } => {
                if !bounds.intersects_sphere(center, radius_squared) {
                    return;
                }
                results.extend(
                    items
                        .iter()
                        .filter(|item| item.position.distance_squared(center) <= radius_squared)
                        .map(|item| item.index),
                );
            }
            OctreeNode::Internal { bounds, children } => {
                if !bounds.intersects_sphere(center, radius_squared) {
                    return;
                }
                for child in children.iter().flatten() {
                    Self::query_sphere_node(child, center, radius_squared, results);
                }
            }
        }
    }

    /// Get the total number of items in the octree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
