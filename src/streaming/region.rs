//! Square chunk footprints produced by the partitioner

use std::collections::HashMap;
use std::fmt;

use crate::core::types::Vec2;
use crate::math::Rect;

/// Footprint of one desired chunk: a square on the XZ plane
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    /// World XZ center
    pub center: Vec2,
    /// Edge length
    pub size: f32,
}

impl Region {
    pub fn new(center: Vec2, size: f32) -> Self {
        Self { center, size }
    }

    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            center: rect.center(),
            size: rect.size().x,
        }
    }

    pub fn key(&self) -> RegionKey {
        RegionKey::new(self.center, self.size)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_center_half_extent(self.center, Vec2::splat(self.size * 0.5))
    }

    /// Distance from the region center to `point`
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.center.distance(point)
    }
}

/// Exact identity of a region: center and size compared bit-for-bit.
///
/// Displays as `"{x}/{z} [{size}]"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey {
    x: u32,
    z: u32,
    size: u32,
}

impl RegionKey {
    pub fn new(center: Vec2, size: f32) -> Self {
        // +0.0 folds -0.0 into 0.0 so both hash the same
        Self {
            x: (center.x + 0.0).to_bits(),
            z: (center.y + 0.0).to_bits(),
            size: (size + 0.0).to_bits(),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(f32::from_bits(self.x), f32::from_bits(self.z))
    }

    pub fn size(&self) -> f32 {
        f32::from_bits(self.size)
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.center();
        write!(f, "{}/{} [{}]", c.x, c.y, self.size())
    }
}

/// Desired region set for one tick, keyed by identity
pub type RegionSet = HashMap<RegionKey, Region>;

/// Collect regions into a keyed set
pub fn region_set(regions: impl IntoIterator<Item = Region>) -> RegionSet {
    regions.into_iter().map(|r| (r.key(), r)).collect()
}
