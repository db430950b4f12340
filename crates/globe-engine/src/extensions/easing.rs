// extensions/easing.rs
//
// Pure easing functions for animation interpolation.
// No dependencies on the scene graph, just math.

use glam::Quat;

/// Easing function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant velocity (no easing).
    #[default]
    Linear,
    /// Slow end. Used for light transitions.
    CubicOut,
}

impl Easing {
    /// Apply the easing function to a normalized time value `t` in [0, 1].
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Linear interpolation between two f32 values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Eased interpolation between two f32 values.
#[inline]
pub fn ease(a: f32, b: f32, t: f32, easing: Easing) -> f32 {
    lerp(a, b, easing.apply(t))
}

/// Eased spherical interpolation between two orientations.
#[inline]
pub fn ease_quat(a: Quat, b: Quat, t: f32, easing: Easing) -> Quat {
    a.slerp(b, easing.apply(t)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn endpoints() {
        for easing in [Easing::Linear, Easing::CubicOut] {
            assert!(approx_eq(easing.apply(0.0), 0.0), "{easing:?} at 0");
            assert!(approx_eq(easing.apply(1.0), 1.0), "{easing:?} at 1");
        }
    }

    #[test]
    fn cubic_out_front_loaded() {
        // half the time → 87.5% of the way there
        assert!(approx_eq(Easing::CubicOut.apply(0.5), 0.875));
    }

    #[test]
    fn clamps_input() {
        assert!(approx_eq(Easing::CubicOut.apply(2.0), 1.0));
        assert!(approx_eq(Easing::CubicOut.apply(-1.0), 0.0));
    }

    #[test]
    fn ease_quat_endpoints() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(1.0);
        assert!(ease_quat(a, b, 0.0, Easing::CubicOut).angle_between(a) < 2e-3);
        assert!(ease_quat(a, b, 1.0, Easing::CubicOut).angle_between(b) < 2e-3);
    }

    #[test]
    fn lerp_midpoint() {
        assert!(approx_eq(lerp(0.0, 10.0, 0.5), 5.0));
        assert!(approx_eq(ease(0.0, 10.0, 0.5, Easing::Linear), 5.0));
    }
}
