//! Height generators and weighted blending

use std::sync::Arc;

use super::color::Color;
use super::heightmap::Heightmap;
use super::noise::NoiseGenerator;
use super::tints::ColorGenerator;
use crate::core::types::Vec2;
use crate::math::scalar::{sat, smoothstep};

/// Raw height source behind a radial generator
#[derive(Clone, Debug)]
pub enum HeightSource {
    Noise(Arc<NoiseGenerator>),
    Heightmap(Arc<Heightmap>),
}

impl HeightSource {
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        match self {
            HeightSource::Noise(noise) => noise.sample(x, z),
            HeightSource::Heightmap(heightmap) => heightmap.sample(x, z),
        }
    }
}

/// Height source attenuated by distance from a center.
///
/// Full weight inside `min_radius`, smoothly falling to zero at `max_radius`.
#[derive(Clone, Debug)]
pub struct RadialHeightGenerator {
    pub source: HeightSource,
    pub center: Vec2,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl RadialHeightGenerator {
    pub fn new(source: HeightSource, center: Vec2, min_radius: f32, max_radius: f32) -> Self {
        Self { source, center, min_radius, max_radius }
    }

    /// Falloff weight at world (x, z)
    pub fn weight(&self, x: f32, z: f32) -> f32 {
        let distance = self.center.distance(Vec2::new(x, z));
        let span = self.max_radius - self.min_radius;
        if span <= 0.0 {
            // Degenerate band: hard edge at min_radius
            return if distance <= self.min_radius { 1.0 } else { 0.0 };
        }
        let t = 1.0 - sat((distance - self.min_radius) / span);
        smoothstep(t, 0.0, 1.0)
    }

    pub fn get(&self, x: f32, z: f32) -> (f32, f32) {
        (self.source.sample(x, z), self.weight(x, z))
    }
}

/// Constant height with full weight
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedHeightGenerator {
    pub height: f32,
}

impl FixedHeightGenerator {
    pub fn new(height: f32) -> Self {
        Self { height }
    }

    pub fn get(&self, _x: f32, _z: f32) -> (f32, f32) {
        (self.height, 1.0)
    }
}

/// One `(height, weight)` contribution at a world coordinate
#[derive(Clone, Debug)]
pub enum HeightGenerator {
    Radial(RadialHeightGenerator),
    Fixed(FixedHeightGenerator),
    /// Bilinear heightmap lookup with weight 1
    Heightmap(Arc<Heightmap>),
}

impl HeightGenerator {
    pub fn get(&self, x: f32, z: f32) -> (f32, f32) {
        match self {
            HeightGenerator::Radial(radial) => radial.get(x, z),
            HeightGenerator::Fixed(fixed) => fixed.get(x, z),
            HeightGenerator::Heightmap(heightmap) => (heightmap.sample(x, z), 1.0),
        }
    }
}

/// Weight-normalized sum of every generator at (x, z).
///
/// Returns `fallback` when the total weight is not positive.
pub fn blend_heights(generators: &[HeightGenerator], x: f32, z: f32, fallback: f32) -> f32 {
    let mut total_weight = 0.0;
    let mut weighted = 0.0;
    for generator in generators {
        let (height, weight) = generator.get(x, z);
        total_weight += weight;
        weighted += height * weight;
    }

    if total_weight > 0.0 {
        weighted / total_weight
    } else {
        fallback
    }
}

/// Everything a chunk needs to shape and color its vertices
#[derive(Clone, Debug)]
pub struct GeneratorSet {
    pub heights: Vec<HeightGenerator>,
    pub color: ColorGenerator,
    /// Height used where no generator has weight
    pub fallback_height: f32,
}

impl GeneratorSet {
    pub fn new(heights: Vec<HeightGenerator>, color: ColorGenerator) -> Self {
        Self { heights, color, fallback_height: 0.0 }
    }

    /// Flat terrain at a fixed height with a single color
    pub fn flat(height: f32, color: Color) -> Self {
        Self::new(
            vec![HeightGenerator::Fixed(FixedHeightGenerator::new(height))],
            ColorGenerator::Fixed(color),
        )
    }

    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        blend_heights(&self.heights, x, z, self.fallback_height)
    }

    pub fn color_at(&self, x: f32, height: f32, z: f32) -> Color {
        self.color.get(x, height, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::heightmap::HeightmapParams;
    use crate::terrain::noise::NoiseParams;

    fn noise_source() -> HeightSource {
        HeightSource::Noise(Arc::new(NoiseGenerator::new(NoiseParams::default())))
    }

    fn constant_source(value: f32) -> HeightSource {
        let params = HeightmapParams { height: 1.0, ..Default::default() };
        HeightSource::Heightmap(Arc::new(Heightmap::from_raw(1, 1, vec![value], params).unwrap()))
    }

    #[test]
    fn test_radial_weight_profile() {
        let radial = RadialHeightGenerator::new(noise_source(), Vec2::ZERO, 10.0, 20.0);
        assert_eq!(radial.weight(0.0, 0.0), 1.0);
        assert_eq!(radial.weight(10.0, 0.0), 1.0);
        assert_eq!(radial.weight(0.0, 15.0), 0.5);
        assert_eq!(radial.weight(20.0, 0.0), 0.0);
        assert_eq!(radial.weight(-500.0, 0.0), 0.0);

        let near = radial.weight(12.0, 0.0);
        let far = radial.weight(18.0, 0.0);
        assert!(near > far && near < 1.0 && far > 0.0);
    }

    #[test]
    fn test_radial_degenerate_band() {
        let radial = RadialHeightGenerator::new(noise_source(), Vec2::ZERO, 5.0, 5.0);
        assert_eq!(radial.weight(4.0, 0.0), 1.0);
        assert_eq!(radial.weight(6.0, 0.0), 0.0);
    }

    #[test]
    fn test_radial_height_from_source() {
        let radial = RadialHeightGenerator::new(constant_source(0.75), Vec2::new(3.0, 4.0), 1.0, 2.0);
        assert_eq!(radial.get(3.0, 4.0), (0.75, 1.0));
    }

    #[test]
    fn test_fixed_generator() {
        let fixed = HeightGenerator::Fixed(FixedHeightGenerator::new(50.0));
        assert_eq!(fixed.get(123.0, -9.0), (50.0, 1.0));
    }

    #[test]
    fn test_zero_total_weight_is_exactly_zero() {
        let far_away = HeightGenerator::Radial(RadialHeightGenerator::new(
            constant_source(0.9),
            Vec2::new(10_000.0, 10_000.0),
            1.0,
            2.0,
        ));
        assert_eq!(blend_heights(&[far_away.clone()], 0.0, 0.0, 0.0), 0.0);
        assert_eq!(blend_heights(&[], 0.0, 0.0, 0.0), 0.0);
        assert_eq!(blend_heights(&[far_away], 0.0, 0.0, 7.0), 7.0);
    }

    #[test]
    fn test_single_full_weight_generator_passes_through() {
        let noise = NoiseGenerator::new(NoiseParams::default());
        let radial = HeightGenerator::Radial(RadialHeightGenerator::new(
            HeightSource::Noise(Arc::new(noise.clone())),
            Vec2::ZERO,
            100_000.0,
            100_001.0,
        ));
        for (x, z) in [(0.0, 0.0), (250.0, -125.0), (-999.0, 31.0)] {
            assert_eq!(blend_heights(std::slice::from_ref(&radial), x, z, 0.0), noise.sample(x, z));
        }
    }

    #[test]
    fn test_weighted_average() {
        let generators = vec![
            HeightGenerator::Fixed(FixedHeightGenerator::new(10.0)),
            HeightGenerator::Fixed(FixedHeightGenerator::new(30.0)),
        ];
        assert_eq!(blend_heights(&generators, 0.0, 0.0, 0.0), 20.0);

        // Half-weight radial pulls less than a full-weight fixed layer
        let generators = vec![
            HeightGenerator::Fixed(FixedHeightGenerator::new(0.0)),
            HeightGenerator::Radial(RadialHeightGenerator::new(constant_source(0.9), Vec2::ZERO, 0.0, 2.0)),
        ];
        // distance 1 -> t = 0.5 -> weight 0.5; (0 * 1 + 0.9 * 0.5) / 1.5
        let h = blend_heights(&generators, 1.0, 0.0, 0.0);
        assert!((h - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_generator_set_flat() {
        let set = GeneratorSet::flat(50.0, Color::WHITE);
        assert_eq!(set.height_at(-3.0, 8.0), 50.0);
        assert_eq!(set.color_at(-3.0, 50.0, 8.0), Color::WHITE);
    }
}
