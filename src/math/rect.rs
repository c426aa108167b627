//! Axis-aligned rectangle on the XZ ground plane

use crate::core::types::Vec2;

/// Axis-aligned rectangle defined by min and max corners.
///
/// `x` maps to world X and `y` maps to world Z.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Create rect from min and max corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a square centered on the origin
    pub fn square(half_extent: f32) -> Self {
        Self::from_center_half_extent(Vec2::ZERO, Vec2::splat(half_extent))
    }

    /// Create rect from center and half-extents
    pub fn from_center_half_extent(center: Vec2, half_extent: Vec2) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Area covered by the rect
    pub fn area(&self) -> f32 {
        let s = self.size();
        s.x * s.y
    }

    /// Check if point is inside (inclusive)
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y
    }

    /// Check if two rects overlap with positive area
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y
    }

    /// Get child quadrant for quadtree subdivision
    /// index: 0-3 (bit 0 = +x, bit 1 = +y)
    pub fn child_quadrant(&self, index: u8) -> Rect {
        let center = self.center();
        let quarter = self.size() * 0.25;

        let offset = Vec2::new(
            if index & 1 != 0 { quarter.x } else { -quarter.x },
            if index & 2 != 0 { quarter.y } else { -quarter.y },
        );

        Rect::from_center_half_extent(center + offset, quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let rect = Rect::new(Vec2::ZERO, Vec2::new(2.0, 4.0));
        assert_eq!(rect.center(), Vec2::new(1.0, 2.0));
        assert_eq!(rect.size(), Vec2::new(2.0, 4.0));
        assert_eq!(rect.area(), 8.0);
    }

    #[test]
    fn test_square() {
        let rect = Rect::square(32000.0);
        assert_eq!(rect.min, Vec2::splat(-32000.0));
        assert_eq!(rect.max, Vec2::splat(32000.0));
        assert_eq!(rect.center(), Vec2::ZERO);
    }

    #[test]
    fn test_contains_point() {
        let rect = Rect::new(Vec2::ZERO, Vec2::ONE);
        assert!(rect.contains_point(Vec2::splat(0.5)));
        assert!(rect.contains_point(Vec2::ONE));
        assert!(!rect.contains_point(Vec2::splat(2.0)));
    }

    #[test]
    fn test_overlaps_excludes_shared_edges() {
        let a = Rect::new(Vec2::ZERO, Vec2::ONE);
        let b = Rect::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        let c = Rect::new(Vec2::splat(0.5), Vec2::splat(1.5));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_child_quadrants_tile_parent() {
        let parent = Rect::new(Vec2::ZERO, Vec2::splat(2.0));
        let child0 = parent.child_quadrant(0); // -x, -y
        assert_eq!(child0.min, Vec2::ZERO);
        assert_eq!(child0.max, Vec2::ONE);

        let child3 = parent.child_quadrant(3); // +x, +y
        assert_eq!(child3.min, Vec2::ONE);
        assert_eq!(child3.max, Vec2::splat(2.0));

        let total: f32 = (0..4).map(|i| parent.child_quadrant(i).area()).sum();
        assert_eq!(total, parent.area());
    }
}
