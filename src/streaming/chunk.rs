//! Terrain chunk: a square grid mesh whose heights and colors are generated
//! incrementally, a bounded number of work units per resumption.
//!
//! A build walks three phases. Heights visits each vertex once, asking the
//! generators for height and color. Faces visits each triangle once and copies
//! its corner colors. Finalize computes normals and places the chunk. The
//! first two phases share one quota per resumption, and every build yields at
//! least once after the face walk so finalization lands on its own step.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::core::types::{Vec2, Vec3};
use crate::terrain::color::Color;
use crate::terrain::generator::GeneratorSet;

use super::region::Region;
use super::render::ChunkMesh;

/// Default work units per resumption
pub const DEFAULT_STEP_QUOTA: usize = 2000;

/// Interleaved vertex for upload
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Result of one build resumption
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    /// More work remains
    Pending,
    /// Build finished
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuildPhase {
    Idle,
    Heights,
    Faces,
    Finalize,
    Done,
}

/// Square grid of `(resolution + 1)^2` vertices spanning one region
pub struct TerrainChunk {
    region: Region,
    resolution: u32,
    generators: Arc<GeneratorSet>,

    /// Vertex XZ offsets from the chunk center
    local: Vec<Vec2>,
    heights: Vec<f32>,
    colors: Vec<Color>,
    normals: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    face_colors: Vec<[Color; 3]>,

    origin: Vec3,
    visible: bool,
    height_range: Option<(f32, f32)>,

    phase: BuildPhase,
    cursor: usize,
    builds: u32,
}

impl TerrainChunk {
    /// Allocate buffers for `region` at `resolution` and reset them
    pub fn new(region: Region, generators: Arc<GeneratorSet>, resolution: u32) -> Self {
        let mut chunk = Self {
            region,
            resolution: 0,
            generators: Arc::clone(&generators),
            local: Vec::new(),
            heights: Vec::new(),
            colors: Vec::new(),
            normals: Vec::new(),
            faces: Vec::new(),
            face_colors: Vec::new(),
            origin: Vec3::ZERO,
            visible: false,
            height_range: None,
            phase: BuildPhase::Idle,
            cursor: 0,
            builds: 0,
        };
        chunk.reset(region, generators, resolution);
        chunk
    }

    /// Retarget this chunk at a new region and generators.
    ///
    /// Buffers are reused when the width and resolution are unchanged; every
    /// vertex returns to height 0, black, facing up. The chunk ends hidden with
    /// no build in progress.
    pub fn reset(&mut self, region: Region, generators: Arc<GeneratorSet>, resolution: u32) {
        let resolution = resolution.max(1);
        if resolution != self.resolution || region.size != self.region.size || self.local.is_empty() {
            self.rebuild_grid(region.size, resolution);
        }

        self.region = region;
        self.resolution = resolution;
        self.generators = generators;

        self.heights.fill(0.0);
        self.colors.fill(Color::BLACK);
        self.normals.fill(Vec3::Y);
        self.face_colors.fill([Color::BLACK; 3]);

        self.origin = Vec3::new(region.center.x, 0.0, region.center.y);
        self.visible = false;
        self.height_range = None;
        self.phase = BuildPhase::Idle;
        self.cursor = 0;
    }

    fn rebuild_grid(&mut self, width: f32, resolution: u32) {
        let row = resolution as usize + 1;
        let vertex_count = row * row;
        let face_count = resolution as usize * resolution as usize * 2;

        let segment = width / resolution as f32;
        let half = width * 0.5;

        self.local.clear();
        self.local.reserve(vertex_count);
        for iz in 0..row {
            for ix in 0..row {
                self.local.push(Vec2::new(ix as f32 * segment - half, iz as f32 * segment - half));
            }
        }

        // Wound so the face normal points +Y
        self.faces.clear();
        self.faces.reserve(face_count);
        let r = row as u32;
        for iz in 0..resolution {
            for ix in 0..resolution {
                let a = ix + r * iz;
                let b = ix + r * (iz + 1);
                let c = (ix + 1) + r * (iz + 1);
                let d = (ix + 1) + r * iz;
                self.faces.push([a, b, d]);
                self.faces.push([b, c, d]);
            }
        }

        self.heights.resize(vertex_count, 0.0);
        self.colors.resize(vertex_count, Color::BLACK);
        self.normals.resize(vertex_count, Vec3::Y);
        self.face_colors.resize(face_count, [Color::BLACK; 3]);
    }

    /// Start (or restart) a build from the first vertex
    pub fn begin_build(&mut self) {
        self.phase = BuildPhase::Heights;
        self.cursor = 0;
    }

    /// Advance the build by at most `quota` vertices or faces.
    ///
    /// Resuming a chunk with no build started, or an already finished one,
    /// returns `Done` without doing any work.
    pub fn resume(&mut self, quota: usize) -> BuildStatus {
        let mut budget = quota.max(1);

        loop {
            match self.phase {
                BuildPhase::Idle | BuildPhase::Done => return BuildStatus::Done,
                BuildPhase::Heights => {
                    let end = self.cursor.saturating_add(budget).min(self.local.len());
                    for i in self.cursor..end {
                        let world = self.local[i] + self.region.center;
                        let height = self.generators.height_at(world.x, world.y);
                        self.heights[i] = height;
                        self.colors[i] = self.generators.color_at(world.x, height, world.y);
                    }
                    budget -= end - self.cursor;
                    self.cursor = end;

                    if self.cursor == self.local.len() {
                        self.phase = BuildPhase::Faces;
                        self.cursor = 0;
                    }
                    if budget == 0 {
                        return BuildStatus::Pending;
                    }
                }
                BuildPhase::Faces => {
                    let end = self.cursor.saturating_add(budget).min(self.faces.len());
                    for f in self.cursor..end {
                        let [a, b, c] = self.faces[f];
                        self.face_colors[f] = [
                            self.colors[a as usize],
                            self.colors[b as usize],
                            self.colors[c as usize],
                        ];
                    }
                    self.cursor = end;

                    if self.cursor == self.faces.len() {
                        self.phase = BuildPhase::Finalize;
                        self.cursor = 0;
                    }
                    return BuildStatus::Pending;
                }
                BuildPhase::Finalize => {
                    self.finalize();
                    self.phase = BuildPhase::Done;
                    self.builds += 1;
                    return BuildStatus::Done;
                }
            }
        }
    }

    /// Run the whole build in one call
    pub fn build(&mut self) {
        self.begin_build();
        while self.resume(usize::MAX) == BuildStatus::Pending {}
    }

    fn finalize(&mut self) {
        self.normals.fill(Vec3::ZERO);
        for &[a, b, c] in &self.faces {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let v0 = self.position(a);
            let face_normal = (self.position(b) - v0).cross(self.position(c) - v0);
            self.normals[a] += face_normal;
            self.normals[b] += face_normal;
            self.normals[c] += face_normal;
        }
        for n in &mut self.normals {
            *n = n.try_normalize().unwrap_or(Vec3::Y);
        }

        self.height_range = self
            .heights
            .iter()
            .fold(None, |range, &h| match range {
                None => Some((h, h)),
                Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
            });
        self.origin = Vec3::new(self.region.center.x, 0.0, self.region.center.y);
    }

    /// Vertex position relative to the chunk origin
    pub fn position(&self, index: usize) -> Vec3 {
        let p = self.local[index];
        Vec3::new(p.x, self.heights[index], p.y)
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a build is started but not finished
    pub fn is_building(&self) -> bool {
        matches!(self.phase, BuildPhase::Heights | BuildPhase::Faces | BuildPhase::Finalize)
    }

    pub fn is_built(&self) -> bool {
        self.phase == BuildPhase::Done
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn generators(&self) -> &Arc<GeneratorSet> {
        &self.generators
    }

    /// World placement of the mesh; vertex positions are relative to this
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn vertex_count(&self) -> usize {
        self.local.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn face_colors(&self) -> &[[Color; 3]] {
        &self.face_colors
    }

    /// Lowest and highest vertex height of the last finished build
    pub fn height_range(&self) -> Option<(f32, f32)> {
        self.height_range
    }

    /// Completed builds over this chunk's lifetime, across reuse
    pub fn build_count(&self) -> u32 {
        self.builds
    }

    /// Borrowed view of the mesh for upload
    pub fn mesh(&self) -> ChunkMesh<'_> {
        ChunkMesh {
            origin: self.origin,
            local: &self.local,
            heights: &self.heights,
            normals: &self.normals,
            colors: &self.colors,
            faces: &self.faces,
            face_colors: &self.face_colors,
        }
    }
}

impl std::fmt::Debug for TerrainChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainChunk")
            .field("region", &self.region)
            .field("resolution", &self.resolution)
            .field("visible", &self.visible)
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generator::{HeightGenerator, RadialHeightGenerator, HeightSource};
    use crate::terrain::noise::{NoiseGenerator, NoiseParams};
    use crate::terrain::tints::ColorGenerator;

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    fn flat_chunk(resolution: u32) -> TerrainChunk {
        let region = Region::new(Vec2::new(100.0, -50.0), 10.0);
        TerrainChunk::new(region, Arc::new(GeneratorSet::flat(5.0, RED)), resolution)
    }

    fn drive(chunk: &mut TerrainChunk, quota: usize) -> usize {
        chunk.begin_build();
        let mut resumes = 1;
        while chunk.resume(quota) == BuildStatus::Pending {
            resumes += 1;
        }
        resumes
    }

    #[test]
    fn test_grid_layout() {
        let chunk = flat_chunk(2);
        assert_eq!(chunk.vertex_count(), 9);
        assert_eq!(chunk.face_count(), 8);
        assert_eq!(chunk.position(0), Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(chunk.position(8), Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(chunk.faces()[0], [0, 3, 1]);
        assert_eq!(chunk.faces()[1], [3, 4, 1]);
    }

    #[test]
    fn test_reset_state() {
        let chunk = flat_chunk(4);
        assert!(!chunk.is_visible());
        assert!(!chunk.is_built());
        assert!(chunk.heights().iter().all(|&h| h == 0.0));
        assert!(chunk.colors().iter().all(|&c| c == Color::BLACK));
        assert_eq!(chunk.origin(), Vec3::new(100.0, 0.0, -50.0));
    }

    #[test]
    fn test_flat_build() {
        let mut chunk = flat_chunk(4);
        chunk.build();
        assert!(chunk.is_built());
        assert!(chunk.heights().iter().all(|&h| h == 5.0));
        assert!(chunk.colors().iter().all(|&c| c == RED));
        assert!(chunk.face_colors().iter().all(|fc| *fc == [RED; 3]));
        for n in chunk.normals() {
            assert!((*n - Vec3::Y).length() < 1e-6, "normal {:?}", n);
        }
        assert_eq!(chunk.height_range(), Some((5.0, 5.0)));
        assert_eq!(chunk.build_count(), 1);
    }

    #[test]
    fn test_small_quota_needs_many_resumes() {
        // 9 vertices, 8 faces, quota 3
        let mut chunk = flat_chunk(2);
        let resumes = drive(&mut chunk, 3);
        assert!(resumes >= 3);
        assert!(chunk.is_built());
    }

    #[test]
    fn test_large_quota_still_yields_before_finalize() {
        let mut chunk = flat_chunk(2);
        chunk.begin_build();
        assert_eq!(chunk.resume(1_000_000), BuildStatus::Pending);
        assert!(!chunk.is_built());
        assert_eq!(chunk.resume(1_000_000), BuildStatus::Done);
    }

    #[test]
    fn test_partial_build_leaves_unvisited_vertices_reset() {
        let mut chunk = flat_chunk(2);
        chunk.begin_build();
        assert_eq!(chunk.resume(4), BuildStatus::Pending);

        assert!(chunk.heights()[..4].iter().all(|&h| h == 5.0));
        assert!(chunk.heights()[4..].iter().all(|&h| h == 0.0));
        assert!(chunk.colors()[4..].iter().all(|&c| c == Color::BLACK));
        assert!(chunk.is_building());
    }

    #[test]
    fn test_quota_does_not_change_result() {
        let noise = Arc::new(NoiseGenerator::new(NoiseParams::default()));
        let generators = Arc::new(GeneratorSet::new(
            vec![HeightGenerator::Radial(RadialHeightGenerator::new(
                HeightSource::Noise(noise),
                Vec2::ZERO,
                100_000.0,
                100_001.0,
            ))],
            ColorGenerator::Fixed(RED),
        ));
        let region = Region::new(Vec2::new(750.0, 250.0), 500.0);

        let mut a = TerrainChunk::new(region, Arc::clone(&generators), 8);
        let mut b = TerrainChunk::new(region, generators, 8);
        drive(&mut a, 1);
        drive(&mut b, 10_000);

        assert_eq!(a.heights(), b.heights());
        assert_eq!(a.normals(), b.normals());
    }

    #[test]
    fn test_sloped_normals_lean_downhill() {
        // Raster columns are mirrored, so this rises toward world +x and normals tilt toward -x
        let params = crate::terrain::heightmap::HeightmapParams {
            offset: Vec2::new(-5.0, -5.0),
            extent: Vec2::new(10.0, 10.0),
            height: 10.0,
        };
        let heightmap = crate::terrain::heightmap::Heightmap::from_raw(2, 1, vec![1.0, 0.0], params).unwrap();
        let generators = Arc::new(GeneratorSet::new(
            vec![HeightGenerator::Heightmap(Arc::new(heightmap))],
            ColorGenerator::Fixed(RED),
        ));
        let mut chunk = TerrainChunk::new(Region::new(Vec2::ZERO, 10.0), generators, 4);
        chunk.build();

        let center = chunk.normals()[12];
        assert!(center.y > 0.0);
        assert!(center.x < 0.0);
        assert!(center.z.abs() < 1e-5);
    }

    #[test]
    fn test_reset_reuses_and_clears() {
        let mut chunk = flat_chunk(2);
        chunk.build();
        chunk.show();

        let other = Region::new(Vec2::new(-300.0, 0.0), 10.0);
        chunk.reset(other, Arc::new(GeneratorSet::flat(1.0, Color::WHITE)), 2);
        assert!(!chunk.is_visible());
        assert!(!chunk.is_built());
        assert!(chunk.heights().iter().all(|&h| h == 0.0));
        assert_eq!(chunk.region(), &other);
        assert_eq!(chunk.origin(), Vec3::new(-300.0, 0.0, 0.0));
        assert_eq!(chunk.height_range(), None);
        assert_eq!(chunk.build_count(), 1);
    }

    #[test]
    fn test_reset_with_new_resolution_resizes() {
        let mut chunk = flat_chunk(2);
        let region = *chunk.region();
        let generators = Arc::clone(chunk.generators());
        chunk.reset(region, generators, 4);
        assert_eq!(chunk.vertex_count(), 25);
        assert_eq!(chunk.face_count(), 32);
    }

    #[test]
    fn test_resume_without_begin_is_done() {
        let mut chunk = flat_chunk(2);
        assert_eq!(chunk.resume(10), BuildStatus::Done);
        assert!(!chunk.is_built());
    }

    #[test]
    fn test_interleaved_mesh() {
        let mut chunk = flat_chunk(1);
        chunk.build();
        let mesh = chunk.mesh();
        let vertices = mesh.interleaved();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3].position, [5.0, 5.0, 5.0]);
        assert_eq!(vertices[3].color, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.indices(), &[0, 2, 1, 2, 3, 1]);
        assert_eq!(bytemuck::cast_slice::<TerrainVertex, u8>(&vertices).len(), 4 * 36);
    }
}
