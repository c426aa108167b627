//! Chunk manager - keeps the built terrain in step with the viewpoint
//!
//! Each tick the rebuilder advances first. Only when it is idle does the
//! manager partition the ground around the viewpoint and diff the desired
//! regions against the chunks it holds: unchanged regions keep their chunk,
//! new regions get a freshly queued chunk, and vanished regions are retired.

use std::collections::HashMap;

use crate::config::{StreamingConfig, WorldConfig};
use crate::core::types::{Vec2, Vec3};
use crate::core::{Error, Result};
use crate::terrain::source::TerrainSource;

use super::chunk::TerrainChunk;
use super::partition::desired_regions;
use super::pool::ChunkId;
use super::rebuilder::{ChunkRebuilder, RebuildTick};
use super::region::{Region, RegionKey, RegionSet};
use super::render::TerrainRenderer;

/// A region the manager holds a chunk for
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkEntry {
    pub region: Region,
    pub id: ChunkId,
}

/// Outcome of comparing held regions to desired ones, keys sorted
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionDiff {
    /// In both sets
    pub kept: Vec<RegionKey>,
    /// Desired but not held
    pub added: Vec<RegionKey>,
    /// Held but no longer desired
    pub removed: Vec<RegionKey>,
}

impl RegionDiff {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Split two keyed sets into kept, added and removed keys
pub fn diff_regions<A, B>(current: &HashMap<RegionKey, A>, desired: &HashMap<RegionKey, B>) -> RegionDiff {
    let mut diff = RegionDiff::default();
    for key in current.keys() {
        if desired.contains_key(key) {
            diff.kept.push(*key);
        } else {
            diff.removed.push(*key);
        }
    }
    diff.added = desired.keys().filter(|k| !current.contains_key(k)).copied().collect();

    diff.kept.sort_unstable();
    diff.added.sort_unstable();
    diff.removed.sort_unstable();
    diff
}

/// What one manager tick did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub rebuild: RebuildTick,
    /// Present when the manager was idle and reconciled
    pub diff: Option<RegionDiff>,
}

/// Cumulative streaming counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    pub ticks: u64,
    pub reconciliations: u64,
    /// Chunks currently held for desired regions
    pub chunks: usize,
    pub chunks_added: u64,
    pub chunks_retired: u64,
    pub builds: u64,
    pub build_steps: u64,
    pub swaps: u64,
    /// Chunks ever constructed by the pool
    pub pool_created: usize,
    /// Allocations the pool served by reuse
    pub pool_reused: usize,
    pub pool_free: usize,
}

/// Streams terrain chunks around a moving viewpoint
#[derive(Debug)]
pub struct ChunkManager {
    config: StreamingConfig,
    terrain: TerrainSource,
    rebuilder: ChunkRebuilder,
    chunks: HashMap<RegionKey, ChunkEntry>,
    /// Next reconciliation replaces every chunk
    regenerate: bool,
    ticks: u64,
    reconciliations: u64,
    chunks_added: u64,
    chunks_retired: u64,
}

impl ChunkManager {
    /// Validate the config and build the terrain generators
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        let terrain = TerrainSource::from_config(config.terrain)?;
        Ok(Self::with_source(config.streaming, terrain))
    }

    pub fn with_source(config: StreamingConfig, terrain: TerrainSource) -> Self {
        log::info!(
            "Chunk manager: {:?} partition, min cell {}, resolution {}, quota {}",
            config.strategy,
            config.min_cell_size,
            config.resolution,
            config.step_quota
        );
        Self {
            rebuilder: ChunkRebuilder::new(config.step_quota),
            config,
            terrain,
            chunks: HashMap::new(),
            regenerate: false,
            ticks: 0,
            reconciliations: 0,
            chunks_added: 0,
            chunks_retired: 0,
        }
    }

    /// One tick for a single viewpoint; the ground plane is its (x, z)
    pub fn update<R: TerrainRenderer + ?Sized>(&mut self, viewpoint: Vec3, renderer: &mut R) -> TickReport {
        self.update_many(&[viewpoint], renderer)
    }

    /// One tick refining around several viewpoints; the first orders the build queue
    pub fn update_many<R: TerrainRenderer + ?Sized>(
        &mut self,
        viewpoints: &[Vec3],
        renderer: &mut R,
    ) -> TickReport {
        self.ticks += 1;
        let rebuild = self.rebuilder.update(renderer);
        if self.rebuilder.is_busy() {
            return TickReport { rebuild, diff: None };
        }

        let points: Vec<Vec2> = viewpoints.iter().map(|v| Vec2::new(v.x, v.z)).collect();
        let desired = desired_regions(&self.config, &points);
        let focus = points.first().copied().unwrap_or(Vec2::ZERO);

        match self.reconcile(desired, focus) {
            Ok(diff) => TickReport { rebuild, diff: Some(diff) },
            Err(e) => {
                log::error!("Reconcile failed: {}", e);
                TickReport { rebuild, diff: None }
            }
        }
    }

    /// Bring the held chunks in line with `desired`.
    ///
    /// Kept regions keep their chunk untouched. Added regions get a hidden
    /// chunk queued for building, nearest to `focus` first. Removed regions
    /// are retired and stay visible until the new chunks are all built.
    /// Fails while a rebuild is still in flight.
    pub fn reconcile(&mut self, desired: RegionSet, focus: Vec2) -> Result<RegionDiff> {
        if self.rebuilder.is_busy() {
            return Err(Error::RebuildInProgress {
                pending: self.rebuilder.pending_count(),
                active: self.rebuilder.active().is_some(),
            });
        }

        let diff = if self.regenerate {
            let empty: HashMap<RegionKey, ()> = HashMap::new();
            let mut diff = diff_regions(&empty, &desired);
            diff.removed = self.chunks.keys().copied().collect();
            diff.removed.sort_unstable();
            diff
        } else {
            diff_regions(&self.chunks, &desired)
        };
        self.regenerate = false;

        for key in &diff.removed {
            if let Some(entry) = self.chunks.remove(key) {
                self.rebuilder.retire(entry.id);
            }
        }

        for key in &diff.added {
            let Some(region) = desired.get(key).copied() else { continue };
            let generators = self.terrain.generators_for(region.center);
            let id = self.rebuilder.allocate_chunk(
                region,
                generators,
                self.config.resolution,
                region.distance_to(focus),
            );
            self.chunks.insert(*key, ChunkEntry { region, id });
        }

        self.reconciliations += 1;
        self.chunks_added += diff.added.len() as u64;
        self.chunks_retired += diff.removed.len() as u64;
        if !diff.is_unchanged() {
            log::debug!(
                "Reconciled: {} kept, {} added, {} removed",
                diff.kept.len(),
                diff.added.len(),
                diff.removed.len()
            );
        }
        Ok(diff)
    }

    /// Swap in new terrain generators. The next reconciliation rebuilds
    /// every region with them while the current chunks stay visible.
    pub fn set_terrain(&mut self, terrain: TerrainSource) {
        self.terrain = terrain;
        self.regenerate = true;
        log::info!("Terrain changed; scheduling full regeneration");
    }

    /// Replace the streaming parameters. Takes effect at the next
    /// reconciliation, which rebuilds every region.
    pub fn set_streaming_config(&mut self, config: StreamingConfig) {
        self.rebuilder.set_step_quota(config.step_quota);
        self.config = config;
        self.regenerate = true;
    }

    /// Abandon in-flight work and return every chunk to the pool
    pub fn clear<R: TerrainRenderer + ?Sized>(&mut self, renderer: &mut R) {
        self.rebuilder.discard_all(renderer);
        for (_, entry) in self.chunks.drain() {
            self.rebuilder.release(entry.id, renderer);
        }
        self.regenerate = false;
        log::debug!("Cleared all terrain chunks");
    }

    pub fn is_busy(&self) -> bool {
        self.rebuilder.is_busy()
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainSource {
        &self.terrain
    }

    pub fn rebuilder(&self) -> &ChunkRebuilder {
        &self.rebuilder
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ChunkEntry> {
        self.chunks.values()
    }

    pub fn entry(&self, key: &RegionKey) -> Option<&ChunkEntry> {
        self.chunks.get(key)
    }

    pub fn chunk(&self, key: &RegionKey) -> Option<&TerrainChunk> {
        self.chunks.get(key).and_then(|e| self.rebuilder.chunk(e.id))
    }

    /// Regions whose chunks are currently shown
    pub fn visible_regions(&self) -> Vec<Region> {
        self.chunks
            .values()
            .filter(|e| self.rebuilder.chunk(e.id).is_some_and(|c| c.is_visible()))
            .map(|e| e.region)
            .collect()
    }

    /// Generated terrain height at world (x, z), whether or not a chunk covers it
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let point = Vec2::new(x, z);
        let center = self
            .chunks
            .values()
            .find(|e| e.region.bounds().contains_point(point))
            .map_or(point, |e| e.region.center);
        self.terrain.generators_for(center).height_at(x, z)
    }

    pub fn stats(&self) -> StreamingStats {
        let rebuild = self.rebuilder.stats();
        let pool = self.rebuilder.pool();
        StreamingStats {
            ticks: self.ticks,
            reconciliations: self.reconciliations,
            chunks: self.chunks.len(),
            chunks_added: self.chunks_added,
            chunks_retired: self.chunks_retired,
            builds: rebuild.builds,
            build_steps: rebuild.steps,
            swaps: rebuild.swaps,
            pool_created: pool.stats().created,
            pool_reused: pool.stats().reused,
            pool_free: pool.total_free(),
        }
    }
}
