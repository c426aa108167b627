//! View-dependent terrain chunk streaming

pub mod region;
pub mod quadtree;
pub mod partition;
pub mod chunk;
pub mod pool;
pub mod render;
pub mod rebuilder;
pub mod manager;

pub use region::{Region, RegionKey, RegionSet, region_set};
pub use quadtree::{QuadTree, QuadTreeParams};
pub use partition::{PartitionStrategy, cell_index, desired_regions};
pub use chunk::{BuildStatus, TerrainChunk, TerrainVertex, DEFAULT_STEP_QUOTA};
pub use pool::{ChunkId, ChunkPool, PoolStats, SizeClass};
pub use render::{ChunkMesh, NullRenderer, TerrainRenderer};
pub use rebuilder::{ChunkRebuilder, RebuildStats, RebuildTick};
pub use manager::{
    ChunkEntry, ChunkManager, RegionDiff, StreamingStats, TickReport, diff_regions,
};
