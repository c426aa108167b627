//! Chunk pool - recycles retired chunks, bucketed by chunk width
//!
//! A chunk's grid depends on its width, so only chunks of the same size class
//! can stand in for each other. Each bucket keeps every chunk it ever created
//! plus a stack of free slots; allocation pops the most recently freed slot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::terrain::generator::GeneratorSet;

use super::chunk::TerrainChunk;
use super::region::Region;

/// Chunk width, compared bit-for-bit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SizeClass(u32);

impl SizeClass {
    pub fn of(width: f32) -> Self {
        Self((width + 0.0).to_bits())
    }

    pub fn width(&self) -> f32 {
        f32::from_bits(self.0)
    }
}

/// Stable handle to a pooled chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId {
    pub size_class: SizeClass,
    pub index: u32,
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.size_class.width(), self.index)
    }
}

#[derive(Default)]
struct Bucket {
    chunks: Vec<TerrainChunk>,
    in_use: Vec<bool>,
    free: Vec<u32>,
}

/// Allocation counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Chunks constructed because no free one of the right width existed
    pub created: usize,
    /// Allocations served from the free list
    pub reused: usize,
    /// Chunks returned to the pool
    pub recycled: usize,
}

/// Size-class keyed pool of terrain chunks
#[derive(Default)]
pub struct ChunkPool {
    buckets: HashMap<SizeClass, Bucket>,
    stats: PoolStats,
}

impl ChunkPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a chunk reset for `region`, reusing a free one of the same
    /// width when possible. Returns the id and whether it was reused.
    pub fn allocate(
        &mut self,
        region: Region,
        generators: Arc<GeneratorSet>,
        resolution: u32,
    ) -> (ChunkId, bool) {
        let size_class = SizeClass::of(region.size);
        let bucket = self.buckets.entry(size_class).or_default();

        if let Some(index) = bucket.free.pop() {
            let slot = index as usize;
            bucket.chunks[slot].reset(region, generators, resolution);
            bucket.in_use[slot] = true;
            self.stats.reused += 1;
            log::debug!("Reused chunk {}#{} for {}", region.size, index, region.key());
            return (ChunkId { size_class, index }, true);
        }

        let index = bucket.chunks.len() as u32;
        bucket.chunks.push(TerrainChunk::new(region, generators, resolution));
        bucket.in_use.push(true);
        self.stats.created += 1;
        log::debug!("Created chunk {}#{} for {}", region.size, index, region.key());
        (ChunkId { size_class, index }, false)
    }

    /// Hide the chunk and return it to its bucket's free list.
    ///
    /// Returns false (and does nothing) for unknown or already free ids.
    pub fn recycle(&mut self, id: ChunkId) -> bool {
        let Some(bucket) = self.buckets.get_mut(&id.size_class) else {
            log::warn!("Recycle of unknown chunk {}", id);
            return false;
        };
        let slot = id.index as usize;
        match bucket.in_use.get(slot) {
            Some(true) => {}
            Some(false) => {
                log::warn!("Chunk {} recycled twice", id);
                return false;
            }
            None => {
                log::warn!("Recycle of unknown chunk {}", id);
                return false;
            }
        }

        bucket.chunks[slot].hide();
        bucket.in_use[slot] = false;
        bucket.free.push(id.index);
        self.stats.recycled += 1;
        true
    }

    pub fn get(&self, id: ChunkId) -> Option<&TerrainChunk> {
        self.buckets.get(&id.size_class)?.chunks.get(id.index as usize)
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut TerrainChunk> {
        self.buckets.get_mut(&id.size_class)?.chunks.get_mut(id.index as usize)
    }

    pub fn is_in_use(&self, id: ChunkId) -> bool {
        self.buckets
            .get(&id.size_class)
            .and_then(|b| b.in_use.get(id.index as usize).copied())
            .unwrap_or(false)
    }

    /// Free chunks of one width
    pub fn free_count(&self, size_class: SizeClass) -> usize {
        self.buckets.get(&size_class).map_or(0, |b| b.free.len())
    }

    /// Free chunks across all widths
    pub fn total_free(&self) -> usize {
        self.buckets.values().map(|b| b.free.len()).sum()
    }

    /// Every chunk ever created
    pub fn capacity(&self) -> usize {
        self.buckets.values().map(|b| b.chunks.len()).sum()
    }

    pub fn in_use_count(&self) -> usize {
        self.capacity() - self.total_free()
    }

    pub fn size_classes(&self) -> impl Iterator<Item = SizeClass> + '_ {
        self.buckets.keys().copied()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl fmt::Debug for ChunkPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkPool")
            .field("capacity", &self.capacity())
            .field("free", &self.total_free())
            .field("stats", &self.stats)
            .finish()
    }
}
