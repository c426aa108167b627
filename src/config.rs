//! World configuration: terrain generators plus streaming parameters.
//!
//! Loaded from / saved to JSON. Every field has a default, so a partial file
//! only needs to name what it overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::streaming::partition::{MAX_GRID_CELLS, PartitionStrategy, grid_cell_count};
use crate::terrain::heightmap::HeightmapParams;
use crate::terrain::noise::NoiseParams;
use crate::terrain::tints::TintParams;

/// Optional heightmap layer blended with the noise terrain
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapLayer {
    /// Image file; the red channel is read as height in [0, 1]
    pub path: PathBuf,
    pub params: HeightmapParams,
}

/// Falloff band of the per-chunk radial noise generator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialParams {
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for RadialParams {
    fn default() -> Self {
        // Wide enough that every vertex of a chunk sees full weight
        Self {
            min_radius: 100_000.0,
            max_radius: 100_001.0,
        }
    }
}

/// Terrain generator configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Elevation noise
    pub noise: NoiseParams,
    /// Moisture noise used to blend the tint ramps
    pub biomes: NoiseParams,
    pub radial: RadialParams,
    pub heightmap: Option<HeightmapLayer>,
    pub tints: TintParams,
    /// Height assigned where the generators carry no weight
    pub fallback_height: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseParams::terrain(),
            biomes: NoiseParams::biomes(),
            radial: RadialParams::default(),
            heightmap: None,
            tints: TintParams::default(),
            fallback_height: 0.0,
        }
    }
}

/// Chunk streaming configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Smallest chunk width; also the cell size of the grid strategies
    pub min_cell_size: f32,
    /// Grid segments per chunk edge (vertices per edge = resolution + 1)
    pub resolution: u32,
    /// Work units (vertices or faces) per build resumption
    pub step_quota: usize,
    /// Half extent of the square partitioned by the quadtree
    pub world_half_extent: f32,
    /// Maximum quadtree subdivision depth
    pub max_depth: u32,
    /// A node splits when the viewpoint is within `split_factor * node_size` of its center
    pub split_factor: f32,
    pub strategy: PartitionStrategy,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            min_cell_size: 500.0,
            resolution: 64,
            step_quota: 2000,
            world_half_extent: 32_000.0,
            max_depth: 16,
            split_factor: 1.0,
            strategy: PartitionStrategy::Quadtree,
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub terrain: TerrainConfig,
    pub streaming: StreamingConfig,
}

impl WorldConfig {
    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: WorldConfig = serde_json::from_str(&json)?;
        config.validate()?;
        log::debug!("Loaded world config from {}", path.display());
        Ok(config)
    }

    /// Save as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the streaming system cannot work with
    pub fn validate(&self) -> Result<()> {
        let s = &self.streaming;
        if !(s.min_cell_size > 0.0) {
            return Err(Error::Config(format!("min_cell_size must be positive, got {}", s.min_cell_size)));
        }
        if s.resolution == 0 {
            return Err(Error::Config("resolution must be at least 1".into()));
        }
        if s.step_quota == 0 {
            return Err(Error::Config("step_quota must be at least 1".into()));
        }
        if !(s.world_half_extent > 0.0) {
            return Err(Error::Config(format!(
                "world_half_extent must be positive, got {}",
                s.world_half_extent
            )));
        }
        if !(s.split_factor > 0.0) {
            return Err(Error::Config(format!("split_factor must be positive, got {}", s.split_factor)));
        }
        if let PartitionStrategy::FixedGrid { radius } = s.strategy {
            match grid_cell_count(radius) {
                Some(cells) if cells <= MAX_GRID_CELLS => {}
                _ => {
                    return Err(Error::Config(format!(
                        "fixed_grid radius {} covers more than {} cells per viewpoint",
                        radius, MAX_GRID_CELLS
                    )));
                }
            }
        }
        if s.world_half_extent * 2.0 < s.min_cell_size {
            log::warn!(
                "world extent {} is smaller than min_cell_size {}; the quadtree will never split",
                s.world_half_extent * 2.0,
                s.min_cell_size
            );
        }

        let t = &self.terrain;
        if !(t.noise.scale > 0.0) || !(t.biomes.scale > 0.0) {
            return Err(Error::Config("noise scale must be positive".into()));
        }
        if t.radial.max_radius < t.radial.min_radius {
            return Err(Error::Config(format!(
                "radial max_radius {} is below min_radius {}",
                t.radial.max_radius, t.radial.min_radius
            )));
        }
        if let Some(layer) = &t.heightmap {
            let extent = layer.params.extent;
            if !(extent.x > 0.0 && extent.y > 0.0) {
                return Err(Error::Config(format!("heightmap extent must be positive, got {}", extent)));
            }
        }
        Ok(())
    }
}
