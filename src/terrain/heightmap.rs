//! Raster heightmap with bilinear sampling

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::core::{Error, Result};
use crate::math::scalar::{clamp, lerp, sat};

/// Placement of the raster in world space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapParams {
    /// World XZ position of the raster's first texel
    pub offset: Vec2,
    /// World XZ span covered by the whole raster
    pub extent: Vec2,
    /// Multiplier applied to the [0, 1] samples
    pub height: f32,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            offset: Vec2::new(-250.0, -250.0),
            extent: Vec2::new(500.0, 500.0),
            height: 16.0,
        }
    }
}

/// Scalar raster sampled with bilinear filtering.
///
/// Lookups outside the covered area clamp to the raster edge.
#[derive(Clone, Debug)]
pub struct Heightmap {
    params: HeightmapParams,
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Heightmap {
    /// Build from raw row-major samples in [0, 1]
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>, params: HeightmapParams) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Heightmap("raster must have non-zero dimensions".into()));
        }
        if data.len() != width as usize * height as usize {
            return Err(Error::Heightmap(format!(
                "expected {} samples for {}x{} raster, got {}",
                width as usize * height as usize,
                width,
                height,
                data.len()
            )));
        }
        if params.extent.x <= 0.0 || params.extent.y <= 0.0 {
            return Err(Error::Heightmap(format!("extent must be positive, got {}", params.extent)));
        }
        Ok(Self { params, width, height, data })
    }

    /// Build from an image, reading the red channel
    pub fn from_image(image: &image::DynamicImage, params: HeightmapParams) -> Result<Self> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        Self::from_raw(width, height, data, params)
    }

    /// Load an image file from disk
    pub fn load(path: &Path, params: HeightmapParams) -> Result<Self> {
        let image = image::open(path)?;
        let heightmap = Self::from_image(&image, params)?;
        log::info!(
            "Loaded heightmap {} ({}x{})",
            path.display(),
            heightmap.width,
            heightmap.height
        );
        Ok(heightmap)
    }

    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    /// Sample at world position (x, z), scaled by the configured height.
    ///
    /// Raster columns run against world x: column 0 sits at `offset.x + extent.x`.
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let p = &self.params;
        let xf = 1.0 - sat((x - p.offset.x) / p.extent.x);
        let yf = sat((z - p.offset.y) / p.extent.y);
        let w = (self.width - 1) as f32;
        let h = (self.height - 1) as f32;

        let x1 = (xf * w).floor();
        let y1 = (yf * h).floor();
        let x2 = clamp(x1 + 1.0, 0.0, w);
        let y2 = clamp(y1 + 1.0, 0.0, h);

        let xp = xf * w - x1;
        let yp = yf * h - y1;

        let p11 = self.texel(x1 as u32, y1 as u32);
        let p21 = self.texel(x2 as u32, y1 as u32);
        let p12 = self.texel(x1 as u32, y2 as u32);
        let p22 = self.texel(x2 as u32, y2 as u32);

        let px1 = lerp(xp, p11, p21);
        let px2 = lerp(xp, p12, p22);

        lerp(yp, px1, px2) * p.height
    }
}
