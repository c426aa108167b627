//! Cooperative chunk rebuilder
//!
//! Builds queued chunks one at a time, a bounded slice of work per tick. The
//! chunks that a reconciliation retires stay visible until every chunk it
//! queued has finished; then, in a single tick, the retired chunks are
//! recycled and the new ones shown. The visible terrain therefore never has
//! holes while a rebuild is in flight.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::terrain::generator::GeneratorSet;

use super::chunk::{BuildStatus, TerrainChunk};
use super::pool::{ChunkId, ChunkPool};
use super::region::Region;
use super::render::TerrainRenderer;

/// Queued build, ordered nearest first
#[derive(Clone, Copy, Debug)]
struct PendingBuild {
    id: ChunkId,
    distance: f32,
}

impl PartialEq for PendingBuild {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingBuild {}

impl Ord for PendingBuild {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the max, so smaller distance compares greater
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for PendingBuild {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What one rebuilder tick did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildTick {
    /// Chunk whose build was started this tick
    pub started: Option<ChunkId>,
    /// Chunk whose build finished (and was uploaded) this tick
    pub finished: Option<ChunkId>,
    /// Retired chunks were recycled and new ones shown this tick
    pub swapped: bool,
}

/// Cumulative rebuilder counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Build resumptions performed
    pub steps: u64,
    /// Chunk builds finished
    pub builds: u64,
    /// Swaps of retired for new chunks
    pub swaps: u64,
    /// Chunks thrown away unbuilt or unshown by `discard_all`
    pub discarded: u64,
}

/// Owns the chunk pool and sequences builds and swaps
#[derive(Debug)]
pub struct ChunkRebuilder {
    pool: ChunkPool,
    step_quota: usize,
    queued: BinaryHeap<PendingBuild>,
    active: Option<ChunkId>,
    /// Retired chunks, still visible until the swap
    old: Vec<ChunkId>,
    /// Chunks started this cycle, hidden until the swap
    new: Vec<ChunkId>,
    stats: RebuildStats,
}

impl ChunkRebuilder {
    pub fn new(step_quota: usize) -> Self {
        Self {
            pool: ChunkPool::new(),
            step_quota: step_quota.max(1),
            queued: BinaryHeap::new(),
            active: None,
            old: Vec::new(),
            new: Vec::new(),
            stats: RebuildStats::default(),
        }
    }

    pub fn step_quota(&self) -> usize {
        self.step_quota
    }

    pub fn set_step_quota(&mut self, step_quota: usize) {
        self.step_quota = step_quota.max(1);
    }

    /// Take a hidden chunk for `region` from the pool and queue its build.
    ///
    /// `distance` orders the queue; nearer chunks build first.
    pub fn allocate_chunk(
        &mut self,
        region: Region,
        generators: Arc<GeneratorSet>,
        resolution: u32,
        distance: f32,
    ) -> ChunkId {
        let (id, _) = self.pool.allocate(region, generators, resolution);
        self.queued.push(PendingBuild { id, distance });
        id
    }

    /// Mark a visible chunk for recycling at the end of the current cycle
    pub fn retire(&mut self, id: ChunkId) {
        self.old.push(id);
    }

    /// True while a build is running or queued
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.queued.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queued.len()
    }

    pub fn active(&self) -> Option<ChunkId> {
        self.active
    }

    pub fn retired_count(&self) -> usize {
        self.old.len()
    }

    /// Advance by one step: resume the active build, or start the next
    /// queued one, or swap retired for new chunks once all are built.
    pub fn update<R: TerrainRenderer + ?Sized>(&mut self, renderer: &mut R) -> RebuildTick {
        let mut tick = RebuildTick::default();

        if let Some(id) = self.active {
            match self.pool.get_mut(id) {
                Some(chunk) => {
                    self.stats.steps += 1;
                    log::trace!("Build step on chunk {} ({})", id, chunk.region().key());
                    if chunk.resume(self.step_quota) == BuildStatus::Done {
                        renderer.upload_chunk(id, &chunk.mesh());
                        self.active = None;
                        self.stats.builds += 1;
                        tick.finished = Some(id);
                    }
                }
                None => {
                    log::warn!("Active chunk {} missing from pool", id);
                    self.active = None;
                }
            }
        } else if let Some(next) = self.queued.pop() {
            match self.pool.get_mut(next.id) {
                Some(chunk) => {
                    chunk.begin_build();
                    log::trace!("Starting build of chunk {} ({})", next.id, chunk.region().key());
                    self.active = Some(next.id);
                    self.new.push(next.id);
                    tick.started = Some(next.id);
                }
                None => log::warn!("Queued chunk {} missing from pool", next.id),
            }
        }

        if !self.is_busy() && !(self.old.is_empty() && self.new.is_empty()) {
            self.swap(renderer);
            tick.swapped = true;
        }
        tick
    }

    fn swap<R: TerrainRenderer + ?Sized>(&mut self, renderer: &mut R) {
        let (retired, shown) = (self.old.len(), self.new.len());
        for id in self.old.drain(..) {
            renderer.set_visible(id, false);
            self.pool.recycle(id);
        }
        for id in self.new.drain(..) {
            if let Some(chunk) = self.pool.get_mut(id) {
                chunk.show();
                renderer.set_visible(id, true);
            }
        }
        self.stats.swaps += 1;
        log::info!(
            "Rebuild cycle complete: {} retired, {} shown; pool {} free of {}",
            retired,
            shown,
            self.pool.total_free(),
            self.pool.capacity()
        );
    }

    /// Drop every queued, in-progress, unshown and retired chunk back into
    /// the pool without building or showing anything.
    pub fn discard_all<R: TerrainRenderer + ?Sized>(&mut self, renderer: &mut R) {
        let queued = self.queued.drain().map(|p| p.id);
        let ids: Vec<ChunkId> = queued
            .chain(self.active.take())
            .chain(self.new.drain(..))
            .chain(self.old.drain(..))
            .collect();

        for id in ids {
            // The active chunk is also in `new`
            if self.pool.is_in_use(id) {
                renderer.release_chunk(id);
                self.pool.recycle(id);
                self.stats.discarded += 1;
            }
        }
    }

    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    /// Recycle a chunk directly, bypassing the swap
    pub fn release<R: TerrainRenderer + ?Sized>(&mut self, id: ChunkId, renderer: &mut R) -> bool {
        if !self.pool.is_in_use(id) {
            return false;
        }
        renderer.release_chunk(id);
        self.pool.recycle(id)
    }

    pub fn chunk(&self, id: ChunkId) -> Option<&TerrainChunk> {
        self.pool.get(id)
    }

    pub fn stats(&self) -> RebuildStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::streaming::render::NullRenderer;
    use crate::streaming::render::recording::RecordingRenderer;
    use crate::terrain::color::Color;

    fn flat() -> Arc<GeneratorSet> {
        Arc::new(GeneratorSet::flat(1.0, Color::WHITE))
    }

    fn region(x: f32) -> Region {
        Region::new(Vec2::new(x, 0.0), 10.0)
    }

    fn run_until_idle(rebuilder: &mut ChunkRebuilder, renderer: &mut RecordingRenderer) -> usize {
        let mut ticks = 0;
        loop {
            ticks += 1;
            let tick = rebuilder.update(renderer);
            if tick.swapped {
                return ticks;
            }
            assert!(ticks < 10_000, "rebuilder never settled");
        }
    }

    #[test]
    fn test_idle_update_does_nothing() {
        let mut rebuilder = ChunkRebuilder::new(100);
        assert!(!rebuilder.is_busy());
        assert_eq!(rebuilder.update(&mut NullRenderer), RebuildTick::default());
    }

    #[test]
    fn test_builds_then_swaps() {
        let mut rebuilder = ChunkRebuilder::new(100);
        let mut renderer = RecordingRenderer::default();

        let a = rebuilder.allocate_chunk(region(0.0), flat(), 2, 0.0);
        let b = rebuilder.allocate_chunk(region(10.0), flat(), 2, 10.0);
        assert!(rebuilder.is_busy());

        let mut order = Vec::new();
        loop {
            let tick = rebuilder.update(&mut renderer);
            if let Some(id) = tick.finished {
                order.push(id);
            }
            // Nothing shown before the swap
            if !tick.swapped {
                assert!(renderer.visible.is_empty());
                assert!(!rebuilder.chunk(a).unwrap().is_visible());
            } else {
                break;
            }
        }

        assert_eq!(order, vec![a, b]);
        assert!(rebuilder.chunk(a).unwrap().is_visible());
        assert!(rebuilder.chunk(b).unwrap().is_visible());
        assert_eq!(renderer.visible.len(), 2);
        assert_eq!(renderer.uploads[&a], 1);
        assert!(!rebuilder.is_busy());
        assert_eq!(rebuilder.stats().builds, 2);
        assert_eq!(rebuilder.stats().swaps, 1);
    }

    #[test]
    fn test_nearest_builds_first() {
        let mut rebuilder = ChunkRebuilder::new(1000);
        let far = rebuilder.allocate_chunk(region(100.0), flat(), 1, 100.0);
        let near = rebuilder.allocate_chunk(region(0.0), flat(), 1, 1.0);
        let mid = rebuilder.allocate_chunk(region(50.0), flat(), 1, 50.0);

        let mut started = Vec::new();
        while rebuilder.is_busy() {
            if let Some(id) = rebuilder.update(&mut NullRenderer).started {
                started.push(id);
            }
        }
        assert_eq!(started, vec![near, mid, far]);
    }

    #[test]
    fn test_retired_stay_visible_until_swap() {
        let mut rebuilder = ChunkRebuilder::new(1000);
        let mut renderer = RecordingRenderer::default();

        let old = rebuilder.allocate_chunk(region(0.0), flat(), 2, 0.0);
        run_until_idle(&mut rebuilder, &mut renderer);
        assert!(renderer.visible.contains(&old));

        rebuilder.retire(old);
        let fresh = rebuilder.allocate_chunk(region(10.0), flat(), 2, 0.0);
        assert_ne!(old, fresh);

        loop {
            let tick = rebuilder.update(&mut renderer);
            if tick.swapped {
                break;
            }
            assert!(renderer.visible.contains(&old));
            assert!(rebuilder.chunk(old).unwrap().is_visible());
        }

        assert!(!renderer.visible.contains(&old));
        assert!(renderer.visible.contains(&fresh));
        assert!(!rebuilder.pool().is_in_use(old));
        assert_eq!(rebuilder.pool().total_free(), 1);
    }

    #[test]
    fn test_retire_only_swaps_next_tick() {
        let mut rebuilder = ChunkRebuilder::new(1000);
        let mut renderer = RecordingRenderer::default();
        let a = rebuilder.allocate_chunk(region(0.0), flat(), 1, 0.0);
        run_until_idle(&mut rebuilder, &mut renderer);

        rebuilder.retire(a);
        let tick = rebuilder.update(&mut renderer);
        assert!(tick.swapped);
        assert!(renderer.visible.is_empty());
        assert!(!rebuilder.pool().is_in_use(a));
    }

    #[test]
    fn test_small_quota_takes_more_ticks() {
        let mut fast = ChunkRebuilder::new(10_000);
        let mut slow = ChunkRebuilder::new(3);
        fast.allocate_chunk(region(0.0), flat(), 4, 0.0);
        slow.allocate_chunk(region(0.0), flat(), 4, 0.0);

        let fast_ticks = run_until_idle(&mut fast, &mut RecordingRenderer::default());
        let slow_ticks = run_until_idle(&mut slow, &mut RecordingRenderer::default());
        // start + heights/faces + finalize
        assert_eq!(fast_ticks, 3);
        assert!(slow_ticks > fast_ticks);
        assert_eq!(slow.stats().builds, 1);
    }

    #[test]
    fn test_discard_all() {
        let mut rebuilder = ChunkRebuilder::new(2);
        let mut renderer = RecordingRenderer::default();

        let shown = rebuilder.allocate_chunk(region(0.0), flat(), 1, 0.0);
        run_until_idle(&mut rebuilder, &mut renderer);

        rebuilder.retire(shown);
        rebuilder.allocate_chunk(region(10.0), flat(), 2, 0.0);
        rebuilder.allocate_chunk(region(20.0), flat(), 2, 1.0);
        rebuilder.update(&mut renderer);
        rebuilder.update(&mut renderer);
        assert!(rebuilder.active().is_some());

        rebuilder.discard_all(&mut renderer);
        assert!(!rebuilder.is_busy());
        assert_eq!(rebuilder.retired_count(), 0);
        assert_eq!(rebuilder.pool().in_use_count(), 0);
        assert_eq!(rebuilder.stats().discarded, 3);
        assert!(renderer.visible.is_empty());
        assert_eq!(renderer.released.len(), 3);

        // Nothing left to swap
        assert!(!rebuilder.update(&mut renderer).swapped);
    }
}
