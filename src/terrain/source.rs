//! Per-chunk generator sets built from a [`TerrainConfig`]

use std::sync::Arc;

use super::generator::{GeneratorSet, HeightGenerator, HeightSource, RadialHeightGenerator};
use super::heightmap::Heightmap;
use super::noise::NoiseGenerator;
use super::tints::{ColorGenerator, HypsometricTints};
use crate::config::TerrainConfig;
use crate::core::Result;
use crate::core::types::Vec2;

/// Shared generator state; hands out a [`GeneratorSet`] per chunk
#[derive(Clone, Debug)]
pub struct TerrainSource {
    config: TerrainConfig,
    noise: Arc<NoiseGenerator>,
    heightmap: Option<Arc<Heightmap>>,
    color: ColorGenerator,
}

impl TerrainSource {
    /// Build the generators, loading the heightmap layer if one is configured
    pub fn from_config(config: TerrainConfig) -> Result<Self> {
        let heightmap = match &config.heightmap {
            Some(layer) => Some(Arc::new(Heightmap::load(&layer.path, layer.params.clone())?)),
            None => None,
        };
        Ok(Self::with_heightmap(config, heightmap))
    }

    /// Build with an already-loaded heightmap (or none), ignoring `config.heightmap.path`
    pub fn with_heightmap(config: TerrainConfig, heightmap: Option<Arc<Heightmap>>) -> Self {
        let noise = Arc::new(NoiseGenerator::new(config.noise.clone()));
        let tints = HypsometricTints::new(config.tints.clone(), NoiseGenerator::new(config.biomes.clone()));
        Self {
            config,
            noise,
            heightmap,
            color: ColorGenerator::Hypsometric(tints),
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Generators for a chunk centered at `center`.
    ///
    /// The noise layer is radial around the chunk's own center, so with the
    /// default radii every vertex gets full weight.
    pub fn generators_for(&self, center: Vec2) -> Arc<GeneratorSet> {
        let mut heights = vec![HeightGenerator::Radial(RadialHeightGenerator::new(
            HeightSource::Noise(Arc::clone(&self.noise)),
            center,
            self.config.radial.min_radius,
            self.config.radial.max_radius,
        ))];
        if let Some(heightmap) = &self.heightmap {
            heights.push(HeightGenerator::Heightmap(Arc::clone(heightmap)));
        }

        Arc::new(GeneratorSet {
            heights,
            color: self.color.clone(),
            fallback_height: self.config.fallback_height,
        })
    }
}
