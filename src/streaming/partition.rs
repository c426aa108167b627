//! Viewpoint-driven partitioning of the ground plane into desired regions

use serde::{Deserialize, Serialize};

use crate::config::StreamingConfig;
use crate::core::types::Vec2;
use crate::math::Rect;

use super::quadtree::{QuadTree, QuadTreeParams};
use super::region::{Region, RegionSet};

/// How the ground plane is split into chunk regions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Distance-driven LOD quadtree over the world bounds
    #[default]
    Quadtree,
    /// Uniform grid of `min_cell_size` cells, `radius` cells around the viewpoint cell
    FixedGrid { radius: u32 },
    /// The single cell under the viewpoint
    Single,
}

/// Integer grid cell containing `p`; cell `k` spans `[k*size - size/2, k*size + size/2)`
pub fn cell_index(p: Vec2, cell_size: f32) -> (i32, i32) {
    let idx = ((p + Vec2::splat(cell_size * 0.5)) / cell_size).floor();
    (idx.x as i32, idx.y as i32)
}

/// Upper bound on the cells one viewpoint's fixed grid may cover
pub const MAX_GRID_CELLS: usize = 1 << 16;

/// Cells in a `(2 * radius + 1)` square block, or `None` if that overflows `usize`
pub fn grid_cell_count(radius: u32) -> Option<usize> {
    let side = 2 * u64::from(radius) + 1;
    side.checked_mul(side).and_then(|n| usize::try_from(n).ok())
}

fn cell_region(x: i64, z: i64, cell_size: f32) -> Region {
    Region::new(Vec2::new(x as f32 * cell_size, z as f32 * cell_size), cell_size)
}

/// Quadtree leaves refined around every viewpoint
pub fn quadtree_regions(config: &StreamingConfig, viewpoints: &[Vec2]) -> Vec<Region> {
    let params = QuadTreeParams {
        min_node_size: config.min_cell_size,
        max_depth: config.max_depth,
        split_factor: config.split_factor,
    };
    let mut tree = QuadTree::new(Rect::square(config.world_half_extent), params);
    for &point in viewpoints {
        tree.insert(point);
    }
    tree.leaves()
}

/// Square block of grid cells around each viewpoint
pub fn grid_regions(cell_size: f32, radius: u32, viewpoints: &[Vec2]) -> Vec<Region> {
    let r = i64::from(radius);
    let per_viewpoint = grid_cell_count(radius).unwrap_or(usize::MAX).min(MAX_GRID_CELLS);
    let mut out = Vec::with_capacity(viewpoints.len().saturating_mul(per_viewpoint));
    for &point in viewpoints {
        let (cx, cz) = cell_index(point, cell_size);
        let (cx, cz) = (i64::from(cx), i64::from(cz));
        for z in (cz - r)..=(cz + r) {
            for x in (cx - r)..=(cx + r) {
                out.push(cell_region(x, z, cell_size));
            }
        }
    }
    out
}

/// Desired region set for the given viewpoints (XZ plane)
pub fn desired_regions(config: &StreamingConfig, viewpoints: &[Vec2]) -> RegionSet {
    let regions = match config.strategy {
        PartitionStrategy::Quadtree => quadtree_regions(config, viewpoints),
        PartitionStrategy::FixedGrid { radius } => grid_regions(config.min_cell_size, radius, viewpoints),
        PartitionStrategy::Single => grid_regions(config.min_cell_size, 0, viewpoints),
    };
    regions.into_iter().map(|r| (r.key(), r)).collect()
}
