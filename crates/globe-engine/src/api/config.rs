use serde::{Deserialize, Serialize};

use crate::components::clouds::DEFAULT_ALTITUDE;
use crate::components::planet::PlanetKind;
use crate::components::rings::RingPreset;
use crate::systems::lighting::{DEFAULT_THRESHOLD, DEFAULT_TRANSITION_MS};
use crate::systems::moons::MoonPreset;

/// Configuration for the scene, provided by the host page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobeConfig {
    /// Planet radius in world units (default: 2).
    pub planet_radius: f32,
    pub planet_kind: PlanetKind,
    /// Spin the planet and its clouds in real time (default: off).
    pub real_time_rotation: bool,
    /// Initial camera distance from the planet centre (default: 12).
    pub camera_distance: f32,
    /// Vertical field of view in degrees (default: 25).
    pub fov_deg: f32,
    /// Camera distance at which the sun switches between near and far mode (default: 15).
    pub light_threshold: f32,
    /// Duration of the near/far light transition in ms (default: 750).
    pub light_transition_ms: f64,
    /// Sun offset from its anchor. Only the direction matters for shading.
    pub sun_offset: [f32; 3],
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
    /// Height of the default cloud layer above the surface. `None` starts without clouds.
    pub cloud_altitude: Option<f32>,
    /// One full turn of the GIF capture, in ms (default: 5000).
    pub gif_duration_ms: f64,
    /// Largest frame delta accepted, e.g. after a backgrounded tab (default: 250).
    pub max_frame_delta_ms: f64,
    pub rings_visible: bool,
    pub ring_preset: RingPreset,
    /// Moon set to start with. `None` starts without moons.
    pub moon_preset: Option<MoonPreset>,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            planet_radius: 2.0,
            planet_kind: PlanetKind::Earth,
            real_time_rotation: false,
            camera_distance: 12.0,
            fov_deg: 25.0,
            light_threshold: DEFAULT_THRESHOLD,
            light_transition_ms: DEFAULT_TRANSITION_MS,
            sun_offset: [0.0, 0.0, 100.0],
            sun_intensity: 0.4,
            ambient_intensity: 0.6,
            cloud_altitude: Some(DEFAULT_ALTITUDE),
            gif_duration_ms: 5000.0,
            max_frame_delta_ms: 250.0,
            rings_visible: false,
            ring_preset: RingPreset::Saturn,
            moon_preset: Some(MoonPreset::Earth),
        }
    }
}

impl GlobeConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
