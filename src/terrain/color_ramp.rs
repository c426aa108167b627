//! Piecewise-linear ramp over a normalized scalar.
//!
//! [`ColorRamp`] maps a scalar (usually normalized terrain height) to a value
//! interpolated between the two surrounding control points. Queries outside
//! the key range clamp to the first or last key.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lerp trait
// ---------------------------------------------------------------------------

/// Trait for types that can be linearly interpolated.
pub trait Lerp: Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for [f32; 3] {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        [
            self[0] + (other[0] - self[0]) * t,
            self[1] + (other[1] - self[1]) * t,
            self[2] + (other[2] - self[2]) * t,
        ]
    }
}

// ---------------------------------------------------------------------------
// ColorRamp
// ---------------------------------------------------------------------------

/// Keyframe-based value ramp.
///
/// Keys are `(t, value)` pairs kept sorted ascending by `t`; `add_point`
/// inserts in order, so callers never have to pre-sort.
#[derive(Clone, Debug)]
pub struct ColorRamp<T: Lerp> {
    keys: Vec<(f32, T)>,
}

impl<T: Lerp> Default for ColorRamp<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T: Lerp> ColorRamp<T> {
    /// Create a new ramp from unsorted keys. Keys are sorted by `t`.
    pub fn new(mut keys: Vec<(f32, T)>) -> Self {
        // Stable sort: equal keys keep insertion order, like add_point
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Create a constant ramp that always returns the same value.
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![(0.0, value)],
        }
    }

    /// Insert a control point, keeping keys ascending.
    /// A key equal to an existing one is placed after it.
    pub fn add_point(&mut self, t: f32, value: T) {
        let idx = self.keys.partition_point(|k| k.0 <= t);
        self.keys.insert(idx, (t, value));
    }

    /// Builder-style [`add_point`](Self::add_point)
    pub fn with_point(mut self, t: f32, value: T) -> Self {
        self.add_point(t, value);
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[(f32, T)] {
        &self.keys
    }

    /// Sample the ramp at `t`. Returns `None` only for an empty ramp.
    pub fn get(&self, t: f32) -> Option<T> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;

        if t <= first.0 || t.is_nan() {
            return Some(first.1.clone());
        }
        if t >= last.0 {
            return Some(last.1.clone());
        }

        // First key strictly above t; 1..len since first.0 < t < last.0
        let upper = self.keys.partition_point(|k| k.0 <= t);
        let (t_a, ref v_a) = self.keys[upper - 1];
        let (t_b, ref v_b) = self.keys[upper];
        let span = t_b - t_a;
        if span < 1e-6 {
            return Some(v_a.clone());
        }
        Some(v_a.lerp(v_b, (t - t_a) / span))
    }
}

// ---------------------------------------------------------------------------
// Serde support
// ---------------------------------------------------------------------------

impl<T: Lerp + Serialize> Serialize for ColorRamp<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.keys.serialize(serializer)
    }
}

impl<'de, T: Lerp + Deserialize<'de>> Deserialize<'de> for ColorRamp<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<(f32, T)>::deserialize(deserializer)?;
        Ok(Self::new(keys))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
