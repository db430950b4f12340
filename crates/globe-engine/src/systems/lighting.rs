//! Sun lighting that switches frame of reference with camera distance.
//!
//! Close to the planet the sun rides with the camera, so whatever face the
//! user looks at is lit. Past the threshold the sun is handed to the world
//! anchor and stays put, so the day/night terminator becomes visible.
//!
//! The switch is edge-triggered on strict crossings of the threshold. On
//! every switch the light anchor is reparented without a visible jump and
//! then eased to its rest orientation for that mode.

use glam::Quat;

use crate::api::types::LightingMode;
use crate::core::scene::{NodeId, SceneGraph};
use crate::extensions::easing::Easing;
use crate::extensions::tween::Tween;

pub const DEFAULT_THRESHOLD: f32 = 15.0;
pub const DEFAULT_TRANSITION_MS: f64 = 750.0;
pub const MAX_SUN_INTENSITY: f32 = 5.0;
pub const MAX_AMBIENT_INTENSITY: f32 = 2.0;

pub struct LightingController {
    /// Parent of the sun; the node that gets reparented.
    anchor: NodeId,
    camera: NodeId,
    world: NodeId,
    mode: LightingMode,
    threshold: f32,
    duration_ms: f64,
    previous_distance: Option<f32>,
    /// Anchor orientation to return to when entering far mode.
    far_rest: Quat,
    transition: Option<Tween>,
    sun_intensity: f32,
    ambient_intensity: f32,
}

impl LightingController {
    /// Starts in near mode with the anchor attached to the camera.
    pub fn new(graph: &mut SceneGraph, anchor: NodeId, camera: NodeId, world: NodeId) -> Self {
        graph.attach(anchor, camera);
        graph.set_rotation(anchor, Quat::IDENTITY);
        Self {
            anchor,
            camera,
            world,
            mode: LightingMode::Near,
            threshold: DEFAULT_THRESHOLD,
            duration_ms: DEFAULT_TRANSITION_MS,
            previous_distance: None,
            far_rest: Quat::IDENTITY,
            transition: None,
            sun_intensity: 0.4,
            ambient_intensity: 0.6,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        if threshold.is_finite() && threshold > 0.0 {
            self.threshold = threshold;
        }
        self
    }

    pub fn with_transition_ms(mut self, duration_ms: f64) -> Self {
        if duration_ms.is_finite() {
            self.duration_ms = duration_ms.max(0.0);
        }
        self
    }

    pub fn mode(&self) -> LightingMode {
        self.mode
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn sun_intensity(&self) -> f32 {
        self.sun_intensity
    }

    pub fn ambient_intensity(&self) -> f32 {
        self.ambient_intensity
    }

    pub fn set_sun_intensity(&mut self, intensity: f32) {
        if intensity.is_finite() {
            self.sun_intensity = intensity.clamp(0.0, MAX_SUN_INTENSITY);
        }
    }

    pub fn set_ambient_intensity(&mut self, intensity: f32) {
        if intensity.is_finite() {
            self.ambient_intensity = intensity.clamp(0.0, MAX_AMBIENT_INTENSITY);
        }
    }

    /// Feed this frame's camera-to-planet distance.
    /// Returns the new mode if a transition started.
    pub fn observe(&mut self, graph: &mut SceneGraph, distance: f32) -> Option<LightingMode> {
        if !distance.is_finite() {
            return None;
        }
        let previous = self.previous_distance.replace(distance)?;
        let t = self.threshold;
        if previous < t && distance > t && self.mode != LightingMode::Far {
            self.enter_far(graph);
            Some(LightingMode::Far)
        } else if previous > t && distance < t && self.mode != LightingMode::Near {
            self.enter_near(graph);
            Some(LightingMode::Near)
        } else {
            None
        }
    }

    /// Step the running transition. Returns true while one is in progress.
    pub fn advance(&mut self, graph: &mut SceneGraph, dt_ms: f64) -> bool {
        let Some(tween) = &mut self.transition else {
            return false;
        };
        let done = tween.advance(dt_ms);
        tween.apply(graph, self.anchor);
        if done {
            self.transition = None;
        }
        !done
    }

    fn enter_far(&mut self, graph: &mut SceneGraph) {
        self.mode = LightingMode::Far;
        graph.reparent_keep_orientation(self.anchor, self.world);
        self.start_transition(graph, self.far_rest);
        log::debug!("lighting: far (sun fixed in world)");
    }

    fn enter_near(&mut self, graph: &mut SceneGraph) {
        self.mode = LightingMode::Near;
        if let Some(local) = graph.local(self.anchor) {
            self.far_rest = local.rotation;
        }
        graph.reparent_keep_orientation(self.anchor, self.camera);
        self.start_transition(graph, Quat::IDENTITY);
        log::debug!("lighting: near (sun follows camera)");
    }

    /// Replaces any transition already in flight.
    fn start_transition(&mut self, graph: &SceneGraph, target: Quat) {
        let from = graph.local(self.anchor).map_or(Quat::IDENTITY, |l| l.rotation);
        self.transition = Some(Tween::orientation(from, target, self.duration_ms, Easing::CubicOut));
    }
}
