//! Surface color generators
//!
//! Cross-blended hypsometric tints: two height ramps (arid and humid) are
//! blended per point by a low-frequency moisture field.

use serde::{Deserialize, Serialize};

use super::color::Color;
use super::color_ramp::ColorRamp;
use super::noise::NoiseGenerator;

/// Parameters for [`HypsometricTints`]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TintParams {
    /// Height that maps to the top of the ramps (normalized height 1.0)
    pub height_normalizer: f32,
    /// Normalized height below which the water color is used
    pub water_level: f32,
    pub water: Color,
    pub arid: ColorRamp<Color>,
    pub humid: ColorRamp<Color>,
}

impl Default for TintParams {
    fn default() -> Self {
        let snow = Color::from_hex(0xffffff);
        Self {
            height_normalizer: 100.0,
            water_level: 0.05,
            water: Color::from_hex(0xd9d592),
            arid: ColorRamp::default()
                .with_point(0.0, Color::from_hex(0xb7a67d))
                .with_point(0.5, Color::from_hex(0xf1e1bc))
                .with_point(1.0, snow),
            humid: ColorRamp::default()
                .with_point(0.0, Color::from_hex(0x29c100))
                .with_point(0.5, Color::from_hex(0xcee59c))
                .with_point(1.0, snow),
        }
    }
}

/// Height/moisture driven terrain colors
#[derive(Clone, Debug)]
pub struct HypsometricTints {
    params: TintParams,
    biomes: NoiseGenerator,
}

impl HypsometricTints {
    pub fn new(params: TintParams, biomes: NoiseGenerator) -> Self {
        Self { params, biomes }
    }

    pub fn params(&self) -> &TintParams {
        &self.params
    }

    /// Moisture in [0, 1] at world (x, z)
    pub fn moisture_at(&self, x: f32, z: f32) -> f32 {
        self.biomes.sample(x, z).clamp(0.0, 1.0)
    }

    /// Color for a surface point at world (x, z) with the given elevation
    pub fn get(&self, x: f32, height: f32, z: f32) -> Color {
        let p = &self.params;
        let h = if p.height_normalizer > 0.0 { height / p.height_normalizer } else { 0.0 };

        if h < p.water_level {
            return p.water;
        }

        let arid = p.arid.get(h).unwrap_or(p.water);
        let humid = p.humid.get(h).unwrap_or(p.water);
        arid.lerp_hsl(&humid, self.moisture_at(x, z))
    }
}

/// Color generator attached to a chunk
#[derive(Clone, Debug)]
pub enum ColorGenerator {
    Hypsometric(HypsometricTints),
    Fixed(Color),
}

impl ColorGenerator {
    pub fn get(&self, x: f32, height: f32, z: f32) -> Color {
        match self {
            ColorGenerator::Hypsometric(tints) => tints.get(x, height, z),
            ColorGenerator::Fixed(color) => *color,
        }
    }
}
