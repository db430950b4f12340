// components/body.rs
//
// A celestial body is three scene nodes:
//
//   pivot : rotated about Y by the accumulated orbit angle
//   frame : offset by the orbital distance, tilted, fine-tuned by the user
//   mesh  : spins about its own Y axis, carries the sphere drawable
//
// Clouds and rings hang off the frame so they follow the body without
// inheriting its spin. Hiding a body detaches its pivot; the orbit and spin
// accumulators keep running, so re-showing it lands where it would have been.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::api::types::{Color, DrawableId, TextureId};
use crate::core::scene::{NodeId, SceneGraph};
use crate::renderer::traits::{DrawableDesc, MaterialKind, Primitive, RenderBackend, UniformValue};
use crate::systems::orbit;

/// Smallest size or distance a body accepts.
pub const MIN_EXTENT: f32 = 0.01;
/// Retrograde angle range in degrees.
pub const MAX_RETROGRADE_DEG: f32 = 180.0;
const DEFAULT_SHININESS: f32 = 10.0;
/// Relief strength when a heightmap is bound.
const BUMP_SCALE: f32 = 0.05;

/// User fine-tuning applied on top of the computed placement.
/// Rotation is in degrees (XYZ order).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FineTransform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for FineTransform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl FineTransform {
    pub fn rotation_quat(&self) -> Quat {
        let [x, y, z] = self.rotation.map(f32::to_radians);
        Quat::from_euler(EulerRot::XYZ, x, y, z)
    }
}

/// Creation parameters for a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Radius in world units.
    pub size: f32,
    /// Orbital radius in world units. Ignored for the primary body.
    #[serde(default)]
    pub distance: f32,
    /// Orbit rate, ≥ 0. Direction comes from the retrograde angle.
    #[serde(default)]
    pub orbit_speed: f32,
    /// Spin rate about the body's own axis. Negative spins backwards.
    #[serde(default)]
    pub rotation_speed: f32,
    /// Degrees in [0, 180]; 0 prograde, 90 polar, 180 retrograde.
    #[serde(default)]
    pub retrograde_angle: f32,
    /// Axial tilt in degrees about Z.
    #[serde(default)]
    pub axial_tilt: f32,
    /// Starting orbit angle in radians.
    #[serde(default)]
    pub phase: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default = "default_body_color")]
    pub color: Color,
    /// Texture source (URL or data-URI). Loading it is the host's job.
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub transform: FineTransform,
}

fn default_visible() -> bool {
    true
}

fn default_body_color() -> Color {
    Color(0xcccccc)
}

impl BodyConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: 0.27,
            distance: 8.0,
            orbit_speed: 1.0,
            rotation_speed: 1.0,
            retrograde_angle: 0.0,
            axial_tilt: 0.0,
            phase: 0.0,
            visible: true,
            color: default_body_color(),
            texture: None,
            transform: FineTransform::default(),
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_orbit_speed(mut self, speed: f32) -> Self {
        self.orbit_speed = speed;
        self
    }

    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    pub fn with_retrograde(mut self, degrees: f32) -> Self {
        self.retrograde_angle = degrees;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Clamp every field into its valid range. Non-finite values fall back
    /// to the defaults of [`BodyConfig::new`].
    pub fn sanitized(mut self) -> Self {
        let defaults = BodyConfig::new("", "");
        self.size = finite_or(self.size, defaults.size).max(MIN_EXTENT);
        self.distance = finite_or(self.distance, defaults.distance).max(MIN_EXTENT);
        self.orbit_speed = finite_or(self.orbit_speed, 0.0).max(0.0);
        self.rotation_speed = finite_or(self.rotation_speed, 0.0);
        self.retrograde_angle = finite_or(self.retrograde_angle, 0.0).clamp(0.0, MAX_RETROGRADE_DEG);
        self.axial_tilt = finite_or(self.axial_tilt, 0.0);
        if !self.phase.is_finite() {
            self.phase = 0.0;
        }
        self.transform.position = self.transform.position.map(|v| finite_or(v, 0.0));
        self.transform.rotation = self.transform.rotation.map(|v| finite_or(v, 0.0));
        self.transform.scale = self.transform.scale.map(|v| finite_or(v, 1.0).max(MIN_EXTENT));
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Whether a body sits at its pivot (the planet) or orbits it (a moon).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRole {
    Primary,
    Satellite,
}

/// A sphere with orbit and spin state bound into the scene graph.
#[derive(Debug)]
pub struct CelestialBody {
    config: BodyConfig,
    role: BodyRole,
    /// Distinguishes successive bodies created under the same id.
    serial: u64,
    parent: NodeId,
    pivot: NodeId,
    frame: NodeId,
    mesh: NodeId,
    orbit_angle: f64,
    spin_angle: f64,
    texture: Option<TextureId>,
    bump_map: Option<TextureId>,
    specular_map: Option<TextureId>,
}

impl CelestialBody {
    /// Create the body's nodes and sphere drawable under `parent`.
    ///
    /// If the backend refuses the drawable the body still exists and still
    /// animates; it just has nothing to draw.
    pub fn spawn<B: RenderBackend>(
        graph: &mut SceneGraph,
        backend: &mut B,
        parent: NodeId,
        config: BodyConfig,
        role: BodyRole,
        serial: u64,
        segments: u32,
    ) -> Self {
        let config = config.sanitized();
        let pivot = graph.spawn(format!("{}:pivot", config.id));
        let frame = graph.spawn(format!("{}:frame", config.id));
        let mesh = graph.spawn(format!("{}:mesh", config.id));
        graph.attach(frame, pivot);
        graph.attach(mesh, frame);

        let desc = DrawableDesc {
            label: config.id.clone(),
            primitive: Primitive::Sphere { radius: 1.0, segments },
            material: MaterialKind::Surface { color: config.color, shininess: DEFAULT_SHININESS },
        };
        match backend.create_drawable(&desc) {
            Ok(drawable) => {
                graph.set_drawable(mesh, Some(drawable));
            }
            Err(e) => log::warn!("body '{}' has no mesh: {e}", config.id),
        }

        let mut body = Self {
            orbit_angle: config.phase,
            spin_angle: 0.0,
            config,
            role,
            serial,
            parent,
            pivot,
            frame,
            mesh,
            texture: None,
            bump_map: None,
            specular_map: None,
        };
        body.sync_pivot(graph);
        body.sync_frame(graph);
        body.sync_mesh(graph);
        if body.config.visible {
            graph.attach(pivot, parent);
        }
        body
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    pub fn role(&self) -> BodyRole {
        self.role
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn pivot(&self) -> NodeId {
        self.pivot
    }

    /// Node that follows the body's placement but not its spin.
    pub fn frame(&self) -> NodeId {
        self.frame
    }

    pub fn mesh(&self) -> NodeId {
        self.mesh
    }

    pub fn drawable(&self, graph: &SceneGraph) -> Option<DrawableId> {
        graph.drawable(self.mesh)
    }

    pub fn orbit_angle(&self) -> f64 {
        self.orbit_angle
    }

    pub fn spin_angle(&self) -> f64 {
        self.spin_angle
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn is_visible(&self) -> bool {
        self.config.visible
    }

    /// Attach the pivot to its parent. Idempotent.
    pub fn show(&mut self, graph: &mut SceneGraph) {
        self.config.visible = true;
        graph.attach(self.pivot, self.parent);
    }

    /// Detach the pivot from its parent. Idempotent.
    pub fn hide(&mut self, graph: &mut SceneGraph) {
        self.config.visible = false;
        graph.detach(self.pivot);
    }

    pub fn set_visible(&mut self, graph: &mut SceneGraph, visible: bool) {
        if visible {
            self.show(graph);
        } else {
            self.hide(graph);
        }
    }

    /// Advance orbit and spin by one frame and write the new pose.
    /// Runs whether or not the body is visible.
    pub fn update(&mut self, graph: &mut SceneGraph, dt_ms: f64) {
        if orbit::advance_orbit(&mut self.orbit_angle, dt_ms, self.config.orbit_speed, self.config.retrograde_angle) {
            self.sync_pivot(graph);
        }
        if orbit::advance_spin(&mut self.spin_angle, dt_ms, self.config.rotation_speed) {
            self.sync_mesh(graph);
        }
    }

    // -- Setters. Non-finite input is ignored; everything else is clamped. --

    pub fn set_size(&mut self, graph: &mut SceneGraph, size: f32) {
        if size.is_finite() {
            self.config.size = size.max(MIN_EXTENT);
            self.sync_mesh(graph);
        }
    }

    pub fn set_distance(&mut self, graph: &mut SceneGraph, distance: f32) {
        if distance.is_finite() {
            self.config.distance = distance.max(MIN_EXTENT);
            self.sync_frame(graph);
        }
    }

    pub fn set_orbit_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.config.orbit_speed = speed.max(0.0);
        }
    }

    pub fn set_rotation_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.config.rotation_speed = speed;
        }
    }

    pub fn set_retrograde(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.config.retrograde_angle = degrees.clamp(0.0, MAX_RETROGRADE_DEG);
        }
    }

    pub fn set_axial_tilt(&mut self, graph: &mut SceneGraph, degrees: f32) {
        if degrees.is_finite() {
            self.config.axial_tilt = degrees;
            self.sync_frame(graph);
        }
    }

    pub fn set_position_offset(&mut self, graph: &mut SceneGraph, position: [f32; 3]) {
        if position.iter().all(|v| v.is_finite()) {
            self.config.transform.position = position;
            self.sync_frame(graph);
        }
    }

    /// Fine rotation in degrees, XYZ order.
    pub fn set_rotation_offset(&mut self, graph: &mut SceneGraph, rotation: [f32; 3]) {
        if rotation.iter().all(|v| v.is_finite()) {
            self.config.transform.rotation = rotation;
            self.sync_frame(graph);
        }
    }

    pub fn set_scale_offset(&mut self, graph: &mut SceneGraph, scale: [f32; 3]) {
        if scale.iter().all(|v| v.is_finite()) {
            self.config.transform.scale = scale.map(|v| v.max(MIN_EXTENT));
            self.sync_mesh(graph);
        }
    }

    pub fn reset_transform(&mut self, graph: &mut SceneGraph) {
        self.config.transform = FineTransform::default();
        self.sync_frame(graph);
        self.sync_mesh(graph);
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.config.name = name.into();
    }

    pub fn set_color<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, color: Color) {
        self.config.color = color;
        if let Some(d) = graph.drawable(self.mesh) {
            backend.set_uniform(d, "color", UniformValue::Color(color));
        }
    }

    /// Bind a loaded texture as the colour map.
    pub fn set_texture<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, texture: TextureId) {
        self.texture = Some(texture);
        if let Some(d) = graph.drawable(self.mesh) {
            backend.set_uniform(d, "map", UniformValue::Texture(Some(texture)));
        }
    }

    /// Bind a heightmap for surface relief.
    pub fn set_bump_map<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, texture: TextureId) {
        self.bump_map = Some(texture);
        if let Some(d) = graph.drawable(self.mesh) {
            backend.set_uniform(d, "bumpMap", UniformValue::Texture(Some(texture)));
            backend.set_uniform(d, "bumpScale", UniformValue::Float(BUMP_SCALE));
        }
    }

    /// Bind a specular (shininess) map.
    pub fn set_specular_map<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, texture: TextureId) {
        self.specular_map = Some(texture);
        if let Some(d) = graph.drawable(self.mesh) {
            backend.set_uniform(d, "specularMap", UniformValue::Texture(Some(texture)));
        }
    }

    pub fn bump_map(&self) -> Option<TextureId> {
        self.bump_map
    }

    pub fn specular_map(&self) -> Option<TextureId> {
        self.specular_map
    }

    /// Record the texture source for snapshots.
    pub fn set_texture_source(&mut self, source: Option<String>) {
        self.config.texture = source;
    }

    /// Destroy the nodes and release the drawable.
    pub fn release<B: RenderBackend>(self, graph: &mut SceneGraph, backend: &mut B) {
        for drawable in graph.despawn(self.pivot) {
            backend.destroy_drawable(drawable);
        }
    }

    fn sync_pivot(&self, graph: &mut SceneGraph) {
        graph.set_rotation(self.pivot, Quat::from_rotation_y(self.orbit_angle as f32));
    }

    fn sync_frame(&self, graph: &mut SceneGraph) {
        let orbit_offset = match self.role {
            BodyRole::Primary => Vec3::ZERO,
            BodyRole::Satellite => Vec3::new(self.config.distance, 0.0, 0.0),
        };
        let fine = &self.config.transform;
        let tilt = Quat::from_rotation_z(self.config.axial_tilt.to_radians());
        if let Some(local) = graph.local_mut(self.frame) {
            local.translation = orbit_offset + Vec3::from(fine.position);
            local.rotation = (tilt * fine.rotation_quat()).normalize();
        }
    }

    fn sync_mesh(&self, graph: &mut SceneGraph) {
        let scale = Vec3::splat(self.config.size) * Vec3::from(self.config.transform.scale);
        if let Some(local) = graph.local_mut(self.mesh) {
            local.rotation = Quat::from_rotation_y(self.spin_angle as f32);
            local.scale = scale;
        }
    }
}
