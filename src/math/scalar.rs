//! Scalar helpers shared by the height and color generators

/// Clamp `x` into `[a, b]`
#[inline]
pub fn clamp(x: f32, a: f32, b: f32) -> f32 {
    x.max(a).min(b)
}

/// Clamp `x` into `[0, 1]`
#[inline]
pub fn sat(x: f32) -> f32 {
    clamp(x, 0.0, 1.0)
}

/// Linear interpolation from `a` to `b` by `t`
#[inline]
pub fn lerp(t: f32, a: f32, b: f32) -> f32 {
    t * (b - a) + a
}

/// Hermite smoothstep `t²(3 - 2t)` remapped onto `[a, b]`
#[inline]
pub fn smoothstep(t: f32, a: f32, b: f32) -> f32 {
    let t = t * t * (3.0 - 2.0 * t);
    lerp(t, a, b)
}

/// Quintic smootherstep remapped onto `[a, b]`
#[inline]
pub fn smootherstep(t: f32, a: f32, b: f32) -> f32 {
    let t = t * t * t * (t * (t * 6.0 - 15.0) + 10.0);
    lerp(t, a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sat() {
        assert_eq!(sat(-1.0), 0.0);
        assert_eq!(sat(0.25), 0.25);
        assert_eq!(sat(7.0), 1.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 2.0, 4.0), 2.0);
        assert_eq!(lerp(0.5, 2.0, 4.0), 3.0);
        assert_eq!(lerp(1.0, 2.0, 4.0), 4.0);
    }

    #[test]
    fn test_smoothstep_endpoints_and_midpoint() {
        assert_eq!(smoothstep(0.0, 0.0, 1.0), 0.0);
        assert_eq!(smoothstep(1.0, 0.0, 1.0), 1.0);
        assert_eq!(smoothstep(0.5, 0.0, 1.0), 0.5);
        // eases in: below linear on the first half
        assert!(smoothstep(0.25, 0.0, 1.0) < 0.25);
    }

    #[test]
    fn test_smootherstep_endpoints() {
        assert_eq!(smootherstep(0.0, 0.0, 1.0), 0.0);
        assert_eq!(smootherstep(1.0, 0.0, 1.0), 1.0);
        assert!((smootherstep(0.5, 0.0, 1.0) - 0.5).abs() < 1e-6);
    }
}
