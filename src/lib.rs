//! Terrastream - procedural terrain streaming around a moving viewpoint

pub mod core;
pub mod math;
pub mod config;
pub mod terrain;
pub mod streaming;

pub use config::{StreamingConfig, TerrainConfig, WorldConfig};
pub use streaming::{ChunkManager, NullRenderer, TerrainRenderer};
pub use terrain::TerrainSource;
