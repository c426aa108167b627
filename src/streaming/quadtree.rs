//! Level-of-detail quadtree over the ground plane
//!
//! Nodes near a point of interest split into four children until they reach
//! the minimum size or the depth limit. The leaves tile the root bounds
//! without overlap and shrink toward every inserted point.

use crate::core::types::Vec2;
use crate::math::Rect;

use super::region::Region;

/// Subdivision limits
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadTreeParams {
    /// Nodes at or below this edge length never split
    pub min_node_size: f32,
    /// Root is depth 0
    pub max_depth: u32,
    /// Split when the point is closer than `split_factor * node_size` to the node center
    pub split_factor: f32,
}

impl Default for QuadTreeParams {
    fn default() -> Self {
        Self {
            min_node_size: 500.0,
            max_depth: 16,
            split_factor: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
struct QuadNode {
    bounds: Rect,
    depth: u32,
    children: Vec<QuadNode>,
}

impl QuadNode {
    fn new(bounds: Rect, depth: u32) -> Self {
        Self { bounds, depth, children: Vec::new() }
    }

    fn size(&self) -> f32 {
        self.bounds.size().x
    }
}

/// Quadtree built fresh each reconciliation from the current viewpoint(s)
#[derive(Clone, Debug)]
pub struct QuadTree {
    root: QuadNode,
    params: QuadTreeParams,
}

impl QuadTree {
    /// `bounds` should be square; the X extent is used as node size
    pub fn new(bounds: Rect, params: QuadTreeParams) -> Self {
        Self {
            root: QuadNode::new(bounds, 0),
            params,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    pub fn params(&self) -> &QuadTreeParams {
        &self.params
    }

    /// Refine the tree around `point`. Earlier subdivisions are kept.
    pub fn insert(&mut self, point: Vec2) {
        Self::insert_node(&mut self.root, point, &self.params);
    }

    fn should_split(node: &QuadNode, point: Vec2, params: &QuadTreeParams) -> bool {
        let size = node.size();
        node.bounds.center().distance(point) < size * params.split_factor
            && size > params.min_node_size
            && node.depth < params.max_depth
    }

    fn insert_node(node: &mut QuadNode, point: Vec2, params: &QuadTreeParams) {
        if !Self::should_split(node, point, params) {
            return;
        }

        if node.children.is_empty() {
            node.children = (0..4)
                .map(|i| QuadNode::new(node.bounds.child_quadrant(i), node.depth + 1))
                .collect();
        }
        for child in &mut node.children {
            Self::insert_node(child, point, params);
        }
    }

    /// Leaf regions, in depth-first quadrant order
    pub fn leaves(&self) -> Vec<Region> {
        let mut out = Vec::new();
        Self::collect_leaves(&self.root, &mut out);
        out
    }

    fn collect_leaves(node: &QuadNode, out: &mut Vec<Region>) {
        if node.children.is_empty() {
            out.push(Region::from_rect(&node.bounds));
            return;
        }
        for child in &node.children {
            Self::collect_leaves(child, out);
        }
    }

    /// Total nodes including the root
    pub fn node_count(&self) -> usize {
        fn count(node: &QuadNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Deepest level reached
    pub fn depth(&self) -> u32 {
        fn deepest(node: &QuadNode) -> u32 {
            node.children.iter().map(deepest).max().unwrap_or(node.depth)
        }
        deepest(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> QuadTree {
        QuadTree::new(Rect::square(32_000.0), QuadTreeParams::default())
    }

    #[test]
    fn test_far_point_leaves_root_whole() {
        let mut tree = QuadTree::new(Rect::square(1000.0), QuadTreeParams::default());
        tree.insert(Vec2::new(1e7, 1e7));
        assert_eq!(tree.leaves(), vec![Region::new(Vec2::ZERO, 2000.0)]);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_leaf_under_viewpoint_is_min_size() {
        let mut tree = world();
        let viewpoint = Vec2::new(475.0, 900.0);
        tree.insert(viewpoint);

        let leaves = tree.leaves();
        let under: Vec<_> = leaves
            .iter()
            .filter(|r| r.bounds().contains_point(viewpoint))
            .collect();
        assert!(!under.is_empty());
        for r in under {
            assert_eq!(r.size, 500.0);
        }
    }

    #[test]
    fn test_leaves_tile_bounds() {
        let mut tree = world();
        tree.insert(Vec2::new(-1234.0, 5678.0));
        let leaves = tree.leaves();

        let area: f64 = leaves.iter().map(|r| (r.size as f64) * (r.size as f64)).sum();
        assert_eq!(area, 64_000.0 * 64_000.0);

        for (i, a) in leaves.iter().enumerate() {
            for b in &leaves[i + 1..] {
                assert!(!a.bounds().overlaps(&b.bounds()), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_lod_rule_holds_for_every_leaf() {
        let params = QuadTreeParams::default();
        let viewpoint = Vec2::new(3100.0, -740.0);
        let mut tree = world();
        tree.insert(viewpoint);

        for leaf in tree.leaves() {
            let d = leaf.distance_to(viewpoint);
            // leaf did not qualify to split further
            if leaf.size > params.min_node_size {
                assert!(d >= leaf.size * params.split_factor, "{:?} should have split", leaf);
            }
            // its parent (twice the size) did qualify, unless it is the root
            if leaf.size < 64_000.0 {
                let parent_axis = |c: f32| {
                    let index = ((c + 32_000.0) / leaf.size).floor() as i64;
                    if index % 2 == 0 { c + leaf.size * 0.5 } else { c - leaf.size * 0.5 }
                };
                let parent_center = Vec2::new(parent_axis(leaf.center.x), parent_axis(leaf.center.y));
                assert!(parent_center.distance(viewpoint) < leaf.size * 2.0 * params.split_factor);
            }
        }
    }

    #[test]
    fn test_size_monotone_along_ancestry() {
        // Walking from the viewpoint outward, leaves never get smaller than
        // leaves strictly nested closer in: check for every pair where one
        // leaf's whole footprint is nearer than the other's center.
        let viewpoint = Vec2::new(200.0, 300.0);
        let mut tree = world();
        tree.insert(viewpoint);
        let leaves = tree.leaves();

        for near in &leaves {
            let near_far_edge = near.distance_to(viewpoint) + near.size * std::f32::consts::SQRT_2 * 0.5;
            for far in &leaves {
                if far.distance_to(viewpoint) - far.size * std::f32::consts::SQRT_2 * 0.5 > near_far_edge {
                    assert!(near.size <= far.size, "{:?} nearer but larger than {:?}", near, far);
                }
            }
        }
    }

    #[test]
    fn test_max_depth_caps_subdivision() {
        let params = QuadTreeParams { max_depth: 2, ..Default::default() };
        let mut tree = QuadTree::new(Rect::square(32_000.0), params);
        tree.insert(Vec2::ZERO);
        assert_eq!(tree.depth(), 2);
        assert!(tree.leaves().iter().all(|r| r.size >= 16_000.0));
    }

    #[test]
    fn test_multiple_points_refine_both() {
        let mut tree = world();
        let a = Vec2::new(-20_000.0, -20_000.0);
        let b = Vec2::new(20_000.0, 20_000.0);
        tree.insert(a);
        tree.insert(b);

        let leaves = tree.leaves();
        for p in [a, b] {
            let under = leaves.iter().find(|r| r.bounds().contains_point(p)).unwrap();
            assert_eq!(under.size, 500.0);
        }
    }

    #[test]
    fn test_repeated_insert_is_stable() {
        let mut once = world();
        once.insert(Vec2::new(10.0, 10.0));
        let mut twice = world();
        twice.insert(Vec2::new(10.0, 10.0));
        twice.insert(Vec2::new(10.0, 10.0));
        assert_eq!(once.leaves(), twice.leaves());
    }
}
