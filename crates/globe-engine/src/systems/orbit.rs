// systems/orbit.rs
//
// Per-frame angular increments for orbit, spin and ring rotation.
//
// Accumulated angles stay in f64 and are never wrapped; only the final
// quaternion is built in f32. A speed of exactly 0 leaves the angle untouched.

/// Orbit speed units → radians per ms.
pub const ORBIT_SCALE: f64 = 0.001;
/// Rotation speed units → radians per ms.
pub const SPIN_SCALE: f64 = 0.002;
/// Length of one 60 Hz frame in ms.
pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;
/// Ring rotation speed units → radians per ms.
pub const RING_SPIN_SCALE: f64 = 0.001 / REFERENCE_FRAME_MS;

/// Signed direction multiplier for a retrograde angle in degrees.
///
/// Linear map: 0° → +1 (prograde), 90° → 0 (polar, stalls), 180° → −1.
pub fn direction_sign(retrograde_deg: f32) -> f64 {
    1.0 - retrograde_deg as f64 / 90.0
}

pub fn orbit_delta(dt_ms: f64, orbit_speed: f32, retrograde_deg: f32) -> f64 {
    dt_ms * orbit_speed as f64 * ORBIT_SCALE * direction_sign(retrograde_deg)
}

pub fn spin_delta(dt_ms: f64, rotation_speed: f32) -> f64 {
    dt_ms * rotation_speed as f64 * SPIN_SCALE
}

pub fn ring_spin_delta(dt_ms: f64, rotation_speed: f32) -> f64 {
    dt_ms * rotation_speed as f64 * RING_SPIN_SCALE
}

/// Add one frame of orbit to `angle`. Returns false when paused.
pub fn advance_orbit(angle: &mut f64, dt_ms: f64, orbit_speed: f32, retrograde_deg: f32) -> bool {
    if orbit_speed == 0.0 {
        return false;
    }
    *angle += orbit_delta(dt_ms.max(0.0), orbit_speed, retrograde_deg);
    true
}

/// Add one frame of spin to `angle`. Returns false when paused.
pub fn advance_spin(angle: &mut f64, dt_ms: f64, rotation_speed: f32) -> bool {
    if rotation_speed == 0.0 {
        return false;
    }
    *angle += spin_delta(dt_ms.max(0.0), rotation_speed);
    true
}

/// Add one frame of ring rotation to `angle`. Returns false when paused.
pub fn advance_ring_spin(angle: &mut f64, dt_ms: f64, rotation_speed: f32) -> bool {
    if rotation_speed == 0.0 {
        return false;
    }
    *angle += ring_spin_delta(dt_ms.max(0.0), rotation_speed);
    true
}

/// Convert a "radians per 60 Hz frame" rate into spin speed units.
pub fn spin_speed_from_per_frame(radians_per_frame: f64) -> f32 {
    (radians_per_frame / (SPIN_SCALE * REFERENCE_FRAME_MS)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn direction_sign_table() {
        assert!(close(direction_sign(0.0), 1.0));
        assert!(close(direction_sign(45.0), 0.5));
        assert!(close(direction_sign(90.0), 0.0));
        assert!(close(direction_sign(135.0), -0.5));
        assert!(close(direction_sign(180.0), -1.0));
    }

    #[test]
    fn one_second_of_orbit() {
        // orbit_speed 1.0 → 1 rad per 1000 ms
        assert!(close(orbit_delta(1000.0, 1.0, 0.0), 1.0));
        assert!(close(orbit_delta(1000.0, 1.0, 180.0), -1.0));
    }

    #[test]
    fn spin_and_ring_rates() {
        assert!(close(spin_delta(500.0, 1.0), 1.0));
        // one reference frame at speed 1 advances the ring 0.001 rad
        assert!(close(ring_spin_delta(REFERENCE_FRAME_MS, 1.0), 0.001));
    }

    #[test]
    fn zero_speed_pauses() {
        let mut angle = 2.5;
        assert!(!advance_orbit(&mut angle, 1000.0, 0.0, 0.0));
        assert!(!advance_spin(&mut angle, 1000.0, 0.0));
        assert!(!advance_ring_spin(&mut angle, 1000.0, 0.0));
        assert_eq!(angle, 2.5);
    }

    #[test]
    fn polar_orbit_stalls_but_is_not_paused() {
        let mut angle = 1.0;
        assert!(advance_orbit(&mut angle, 1000.0, 3.0, 90.0));
        assert!(close(angle, 1.0));
    }

    #[test]
    fn accumulator_is_not_wrapped() {
        let mut angle = 0.0;
        for _ in 0..100 {
            advance_orbit(&mut angle, 1000.0, 1.0, 0.0);
        }
        assert!(close(angle, 100.0));
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut angle = 0.0;
        advance_spin(&mut angle, -16.0, 1.0);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn per_frame_conversion() {
        let speed = spin_speed_from_per_frame(0.001);
        assert!(close(spin_delta(REFERENCE_FRAME_MS, speed), 0.001));
    }
}
