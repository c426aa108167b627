//! Boundary between chunk streaming and whatever draws the chunks

use crate::core::types::{Vec2, Vec3};
use crate::terrain::color::Color;

use super::chunk::TerrainVertex;
use super::pool::ChunkId;

/// Borrowed view of a built chunk's mesh
#[derive(Clone, Copy, Debug)]
pub struct ChunkMesh<'a> {
    /// World placement; positions below are relative to it
    pub origin: Vec3,
    pub local: &'a [Vec2],
    pub heights: &'a [f32],
    pub normals: &'a [Vec3],
    pub colors: &'a [Color],
    pub faces: &'a [[u32; 3]],
    /// Per-face corner colors
    pub face_colors: &'a [[Color; 3]],
}

impl ChunkMesh<'_> {
    pub fn vertex_count(&self) -> usize {
        self.local.len()
    }

    /// Position of vertex `i` relative to `origin`
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.local[i].x, self.heights[i], self.local[i].y)
    }

    /// Vertices packed for a vertex buffer
    pub fn interleaved(&self) -> Vec<TerrainVertex> {
        (0..self.vertex_count())
            .map(|i| TerrainVertex {
                position: self.position(i).to_array(),
                normal: self.normals[i].to_array(),
                color: self.colors[i].to_array(),
            })
            .collect()
    }

    /// Triangle list indices
    pub fn indices(&self) -> &[u32] {
        bytemuck::cast_slice(self.faces)
    }
}

/// Receives chunk meshes and visibility changes from the streamer.
///
/// Chunk ids are stable for the lifetime of the pool; a recycled id is later
/// uploaded again with new contents.
pub trait TerrainRenderer {
    /// A chunk finished building; replace whatever was stored under `id`
    fn upload_chunk(&mut self, id: ChunkId, mesh: &ChunkMesh<'_>);

    fn set_visible(&mut self, id: ChunkId, visible: bool);

    /// The chunk will not be shown again until it is re-uploaded
    fn release_chunk(&mut self, id: ChunkId) {
        self.set_visible(id, false);
    }
}

/// Renderer that discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl TerrainRenderer for NullRenderer {
    fn upload_chunk(&mut self, _id: ChunkId, _mesh: &ChunkMesh<'_>) {}

    fn set_visible(&mut self, _id: ChunkId, _visible: bool) {}
}
