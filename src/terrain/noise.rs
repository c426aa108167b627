//! Octave noise sampler used as the height and biome source

use noise::{NoiseFn, OpenSimplex, Perlin, Value};
use serde::{Deserialize, Serialize};

/// Base noise function summed per octave
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    #[default]
    Simplex,
    Perlin,
    #[serde(alias = "rand")]
    Value,
}

/// Parameters controlling the octave noise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub noise_type: NoiseType,
    pub seed: u32,
    pub scale: f32,          // Horizontal scale (larger = smoother)
    pub height: f32,         // Output multiplier (max height)
    pub octaves: u32,        // Detail levels
    pub persistence: f32,    // Amplitude falloff exponent: each octave scales by 2^-persistence
    pub lacunarity: f32,     // Frequency multiplier per octave
    pub exponentiation: f32, // Applied to the normalized total, sharpens peaks when > 1
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self::terrain()
    }
}

impl NoiseParams {
    /// Mountainous terrain preset
    pub fn terrain() -> Self {
        Self {
            noise_type: NoiseType::Simplex,
            seed: 1,
            scale: 1100.0,
            height: 300.0,
            octaves: 6,
            persistence: 0.707,
            lacunarity: 1.8,
            exponentiation: 4.5,
        }
    }

    /// Low-frequency moisture field in [0, 1] used to blend biome tints
    pub fn biomes() -> Self {
        Self {
            noise_type: NoiseType::Simplex,
            seed: 2,
            scale: 2048.0,
            height: 1.0,
            octaves: 2,
            persistence: 0.5,
            lacunarity: 2.0,
            exponentiation: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
enum BaseNoise {
    Simplex(OpenSimplex),
    Perlin(Perlin),
    Value(Value),
}

impl BaseNoise {
    fn get(&self, x: f64, z: f64) -> f64 {
        match self {
            BaseNoise::Simplex(n) => n.get([x, z]),
            BaseNoise::Perlin(n) => n.get([x, z]),
            BaseNoise::Value(n) => n.get([x, z]),
        }
    }
}

/// Normalized fractal noise: `sample(x, z)` lies in `[0, height]`.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    params: NoiseParams,
    base: BaseNoise,
}

impl NoiseGenerator {
    /// Create a new noise generator with the given parameters
    pub fn new(params: NoiseParams) -> Self {
        let base = match params.noise_type {
            NoiseType::Simplex => BaseNoise::Simplex(OpenSimplex::new(params.seed)),
            NoiseType::Perlin => BaseNoise::Perlin(Perlin::new(params.seed)),
            NoiseType::Value => BaseNoise::Value(Value::new(params.seed)),
        };
        Self { params, base }
    }

    /// Get noise parameters
    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// Sample the noise at world position (x, z)
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let p = &self.params;
        let xs = (x / p.scale) as f64;
        let zs = (z / p.scale) as f64;
        let gain = 2.0_f64.powf(-(p.persistence as f64));

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut normalization = 0.0;
        let mut total = 0.0;
        for _ in 0..p.octaves {
            let v = self.base.get(xs * frequency, zs * frequency) * 0.5 + 0.5;
            total += v * amplitude;
            normalization += amplitude;
            amplitude *= gain;
            frequency *= p.lacunarity as f64;
        }

        if normalization <= 0.0 {
            return 0.0;
        }

        // Base noise can overshoot [-1, 1] slightly; powf of a negative base is NaN
        let total = (total / normalization).clamp(0.0, 1.0);
        (total.powf(p.exponentiation as f64) * p.height as f64) as f32
    }
}
