use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::body::{BodyConfig, BodyRole, CelestialBody};
use crate::core::scene::{NodeId, SceneGraph};
use crate::renderer::traits::RenderBackend;
use crate::systems::orbit;

const PLANET_SEGMENTS: u32 = 64;
/// Upper bound for the simulation speed multiplier.
pub const MAX_TIME_SCALE: f32 = 100.0;

/// Planet look-and-feel presets. Rates are radians per 60 Hz frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanetKind {
    #[default]
    Earth,
    Mars,
    Jupiter,
    Venus,
    Mercury,
    Saturn,
    Custom,
}

impl PlanetKind {
    pub const ALL: [PlanetKind; 7] = [
        PlanetKind::Earth,
        PlanetKind::Mars,
        PlanetKind::Jupiter,
        PlanetKind::Venus,
        PlanetKind::Mercury,
        PlanetKind::Saturn,
        PlanetKind::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PlanetKind::Earth => "earth",
            PlanetKind::Mars => "mars",
            PlanetKind::Jupiter => "jupiter",
            PlanetKind::Venus => "venus",
            PlanetKind::Mercury => "mercury",
            PlanetKind::Saturn => "saturn",
            PlanetKind::Custom => "custom",
        }
    }

    /// Obliquity in degrees.
    pub fn axial_tilt_deg(self) -> f32 {
        match self {
            PlanetKind::Earth => 23.44,
            PlanetKind::Mars => 25.19,
            PlanetKind::Jupiter => 3.13,
            PlanetKind::Venus => 177.4,
            PlanetKind::Mercury => 0.034,
            PlanetKind::Saturn => 26.73,
            PlanetKind::Custom => 0.0,
        }
    }

    pub fn spin_per_frame(self) -> f64 {
        match self {
            PlanetKind::Earth | PlanetKind::Custom => 0.001,
            PlanetKind::Mars => 0.00097,
            PlanetKind::Jupiter => 0.0041,
            PlanetKind::Venus => -0.000004,
            PlanetKind::Mercury => 0.000017,
            PlanetKind::Saturn => 0.0038,
        }
    }

    pub fn cloud_spin_per_frame(self) -> f64 {
        match self {
            PlanetKind::Earth | PlanetKind::Custom => 0.0012,
            PlanetKind::Mars => 0.0015,
            PlanetKind::Jupiter => 0.0055,
            PlanetKind::Venus => -0.000008,
            PlanetKind::Mercury => 0.000025,
            PlanetKind::Saturn => 0.0050,
        }
    }

    /// Spin rate in body rotation-speed units.
    pub fn rotation_speed(self) -> f32 {
        orbit::spin_speed_from_per_frame(self.spin_per_frame())
    }

    pub fn cloud_rotation_speed(self) -> f32 {
        orbit::spin_speed_from_per_frame(self.cloud_spin_per_frame())
    }
}

impl fmt::Display for PlanetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlanetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanetKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown planet type '{s}'"))
    }
}

/// The central body: a primary [`CelestialBody`] plus a time-scale knob.
///
/// The planet only spins while real-time rotation is on; it starts off.
#[derive(Debug)]
pub struct Planet {
    body: CelestialBody,
    kind: PlanetKind,
    time_scale: f32,
    real_time_rotation: bool,
}

impl Planet {
    pub fn spawn<B: RenderBackend>(
        graph: &mut SceneGraph,
        backend: &mut B,
        parent: NodeId,
        radius: f32,
        kind: PlanetKind,
    ) -> Self {
        let mut config = BodyConfig::new("planet", kind.name())
            .with_size(radius)
            .with_orbit_speed(0.0)
            .with_rotation_speed(kind.rotation_speed())
            .with_color(crate::api::types::Color::WHITE);
        config.axial_tilt = kind.axial_tilt_deg();
        let body = CelestialBody::spawn(graph, backend, parent, config, BodyRole::Primary, 0, PLANET_SEGMENTS);
        Self { body, kind, time_scale: 1.0, real_time_rotation: false }
    }

    pub fn with_real_time_rotation(mut self, enabled: bool) -> Self {
        self.real_time_rotation = enabled;
        self
    }

    pub fn body(&self) -> &CelestialBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut CelestialBody {
        &mut self.body
    }

    pub fn kind(&self) -> PlanetKind {
        self.kind
    }

    /// Switch presets: resets spin rate and tilt to the new kind's values.
    pub fn set_kind(&mut self, graph: &mut SceneGraph, kind: PlanetKind) {
        self.kind = kind;
        self.body.set_name(kind.name());
        self.body.set_rotation_speed(kind.rotation_speed());
        self.body.set_axial_tilt(graph, kind.axial_tilt_deg());
        log::debug!("planet type set to {kind}");
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.time_scale = scale.clamp(0.0, MAX_TIME_SCALE);
        }
    }

    pub fn real_time_rotation(&self) -> bool {
        self.real_time_rotation
    }

    pub fn set_real_time_rotation(&mut self, enabled: bool) {
        self.real_time_rotation = enabled;
    }

    /// Multiplier for surface and cloud spin: the time scale, or 0 while
    /// real-time rotation is off.
    pub fn spin_scale(&self) -> f32 {
        if self.real_time_rotation {
            self.time_scale
        } else {
            0.0
        }
    }

    pub fn update(&mut self, graph: &mut SceneGraph, dt_ms: f64) {
        self.body.update(graph, dt_ms * self.spin_scale() as f64);
    }
}
