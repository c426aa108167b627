//! Procedural terrain generation: height sources, blending and surface colors

pub mod noise;
pub use noise::{NoiseGenerator, NoiseParams, NoiseType};

pub mod heightmap;
pub use heightmap::{Heightmap, HeightmapParams};

pub mod generator;
pub use generator::{
    blend_heights, FixedHeightGenerator, GeneratorSet, HeightGenerator, HeightSource,
    RadialHeightGenerator,
};

pub mod color;
pub use color::Color;

pub mod color_ramp;
pub use color_ramp::{ColorRamp, Lerp};

pub mod tints;
pub use tints::{ColorGenerator, HypsometricTints, TintParams};

pub mod source;
pub use source::TerrainSource;
