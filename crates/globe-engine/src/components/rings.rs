// components/rings.rs
//
// Planetary ring band. The node lies flat (tilted −90° about X so the mesh's
// XY plane becomes the planet's equatorial plane) and spins about its own
// normal. Geometry changes rebuild the drawable; a failed rebuild keeps the
// previous one.
//
// Radius setters clamp so that 0 < inner < outer always holds.

use std::f32::consts::FRAC_PI_2;

use glam::Quat;
use serde::{Deserialize, Serialize};

use crate::api::types::{Color, DrawableId, TextureId};
use crate::core::scene::{NodeId, SceneGraph};
use crate::renderer::geometry::{RingGeometry, MIN_RING_SEGMENTS};
use crate::renderer::traits::{DrawableDesc, MaterialKind, Primitive, RenderBackend, UniformValue};
use crate::systems::orbit;

pub const MAX_RING_SEGMENTS: u32 = 256;
/// Smallest inner radius accepted by [`RingSystem::set_radii`] and thickness changes.
pub const MIN_INNER_RADIUS: f32 = 0.1;
/// Largest outer radius any setter accepts.
pub const MAX_OUTER_RADIUS: f32 = 12.0;
/// Narrowest band width.
pub const MIN_THICKNESS: f32 = 0.1;
/// Geometry used when nothing else can be built.
const FALLBACK_RADII: (f32, f32) = (1.0, 2.0);
/// Thickness changes smaller than this leave the geometry alone.
const THICKNESS_EPSILON: f32 = 0.01;

/// Named ring configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RingPreset {
    #[default]
    Saturn,
    Uranus,
    Jupiter,
    Custom,
}

impl RingPreset {
    pub const ALL: [RingPreset; 4] = [RingPreset::Saturn, RingPreset::Uranus, RingPreset::Jupiter, RingPreset::Custom];

    /// Preset geometry and look. Colour is not part of a preset.
    pub fn apply_to(self, config: &mut RingConfig) {
        let (inner, outer, segments, opacity, rotation_speed) = match self {
            RingPreset::Saturn => (2.8, 6.2, 128, 0.8, 0.3),
            RingPreset::Uranus => (3.5, 4.5, 64, 0.6, 0.1),
            RingPreset::Jupiter => (2.2, 3.8, 96, 0.4, 0.8),
            RingPreset::Custom => (1.2, 2.0, 128, 0.8, 1.0),
        };
        config.inner_radius = inner;
        config.outer_radius = outer;
        config.segments = segments;
        config.opacity = opacity;
        config.rotation_speed = rotation_speed;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RingConfig {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
    pub opacity: f32,
    pub rotation_speed: f32,
    pub color: Color,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            inner_radius: 2.0,
            outer_radius: 4.0,
            segments: 96,
            opacity: 0.8,
            rotation_speed: 0.5,
            color: Color::WHITE,
        }
    }
}

/// Read-back of the ring state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingInfo {
    pub visible: bool,
    pub preset: RingPreset,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub thickness: f32,
    pub segments: u32,
    pub opacity: f32,
    pub rotation_speed: f32,
    pub color: Color,
    pub has_texture: bool,
    pub has_alpha_texture: bool,
}

#[derive(Debug)]
pub struct RingSystem {
    config: RingConfig,
    preset: RingPreset,
    visible: bool,
    parent: NodeId,
    node: NodeId,
    spin: f64,
    surface: Option<TextureId>,
    alpha: Option<TextureId>,
}

impl RingSystem {
    pub fn new<B: RenderBackend>(
        graph: &mut SceneGraph,
        backend: &mut B,
        parent: NodeId,
        config: RingConfig,
        visible: bool,
    ) -> Self {
        let node = graph.spawn("rings");
        let mut rings = Self {
            config,
            preset: RingPreset::Custom,
            visible: false,
            parent,
            node,
            spin: 0.0,
            surface: None,
            alpha: None,
        };
        rings.sanitize();
        rings.sync_node(graph);
        rings.rebuild(graph, backend);
        rings.set_visible(graph, visible);
        rings
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn preset(&self) -> RingPreset {
        self.preset
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn drawable(&self, graph: &SceneGraph) -> Option<DrawableId> {
        graph.drawable(self.node)
    }

    pub fn spin(&self) -> f64 {
        self.spin
    }

    pub fn thickness(&self) -> f32 {
        self.config.outer_radius - self.config.inner_radius
    }

    pub fn info(&self) -> RingInfo {
        RingInfo {
            visible: self.visible,
            preset: self.preset,
            inner_radius: self.config.inner_radius,
            outer_radius: self.config.outer_radius,
            thickness: self.thickness(),
            segments: self.config.segments,
            opacity: self.config.opacity,
            rotation_speed: self.config.rotation_speed,
            color: self.config.color,
            has_texture: self.surface.is_some(),
            has_alpha_texture: self.alpha.is_some(),
        }
    }

    // -- Visibility --

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, graph: &mut SceneGraph, visible: bool) {
        self.visible = visible;
        if visible {
            graph.attach(self.node, self.parent);
        } else {
            graph.detach(self.node);
        }
    }

    pub fn toggle(&mut self, graph: &mut SceneGraph) -> bool {
        self.set_visible(graph, !self.visible);
        self.visible
    }

    // -- Geometry --

    /// Inner radius, clamped to [0.5, 8]. Pushes the outer edge out if needed.
    pub fn set_inner_radius<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, radius: f32) {
        if !radius.is_finite() {
            return;
        }
        let inner = radius.clamp(0.5, 8.0);
        self.config.inner_radius = inner;
        if self.config.outer_radius <= inner {
            self.config.outer_radius = inner + 0.5;
        }
        self.rebuild(graph, backend);
    }

    /// Outer radius, clamped to [1, 12]. Pulls the inner edge in if needed.
    pub fn set_outer_radius<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, radius: f32) {
        if !radius.is_finite() {
            return;
        }
        let outer = radius.clamp(1.0, MAX_OUTER_RADIUS);
        self.config.outer_radius = outer;
        if outer <= self.config.inner_radius {
            self.config.inner_radius = (outer - 0.5).max(0.5);
        }
        self.rebuild(graph, backend);
    }

    /// Set both radii at once. The inner edge wins a conflict.
    pub fn set_radii<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, inner: f32, outer: f32) {
        if !inner.is_finite() || !outer.is_finite() {
            return;
        }
        let (inner, outer) = clamp_radii(inner, outer);
        self.config.inner_radius = inner;
        self.config.outer_radius = outer;
        self.rebuild(graph, backend);
    }

    /// Resize the band around its current midpoint.
    pub fn set_thickness<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, thickness: f32) {
        if !thickness.is_finite() {
            return;
        }
        let center = (self.config.inner_radius + self.config.outer_radius) / 2.0;
        let half = thickness.clamp(MIN_THICKNESS, MAX_OUTER_RADIUS) / 2.0;
        let (inner, outer) = clamp_radii(center - half, center + half);
        if (inner - self.config.inner_radius).abs() > THICKNESS_EPSILON
            || (outer - self.config.outer_radius).abs() > THICKNESS_EPSILON
        {
            self.config.inner_radius = inner;
            self.config.outer_radius = outer;
            self.rebuild(graph, backend);
        }
    }

    /// Angular segment count, clamped to [8, 256].
    pub fn set_detail<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, segments: u32) {
        self.config.segments = segments.clamp(MIN_RING_SEGMENTS, MAX_RING_SEGMENTS);
        self.rebuild(graph, backend);
    }

    /// Replace geometry and look with a preset. Visibility, colour and textures stay.
    pub fn load_preset<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, preset: RingPreset) {
        preset.apply_to(&mut self.config);
        self.preset = preset;
        self.rebuild(graph, backend);
        log::debug!("ring preset {preset:?} loaded");
    }

    /// Restore a full configuration, e.g. from a snapshot.
    pub fn apply_config<B: RenderBackend>(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut B,
        preset: RingPreset,
        config: RingConfig,
    ) {
        self.config = config;
        self.preset = preset;
        self.sanitize();
        self.rebuild(graph, backend);
    }

    // -- Material --

    pub fn set_opacity<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, opacity: f32) {
        if opacity.is_finite() {
            self.config.opacity = opacity.clamp(0.0, 1.0);
            if let Some(d) = graph.drawable(self.node) {
                backend.set_uniform(d, "opacity", UniformValue::Float(self.config.opacity));
            }
        }
    }

    pub fn set_color<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, color: Color) {
        self.config.color = color;
        if let Some(d) = graph.drawable(self.node) {
            backend.set_uniform(d, "color", UniformValue::Color(color));
        }
    }

    pub fn set_rotation_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.config.rotation_speed = speed;
        }
    }

    pub fn set_surface_texture<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, texture: TextureId) {
        self.surface = Some(texture);
        if let Some(d) = graph.drawable(self.node) {
            self.push_textures(backend, d);
        }
    }

    pub fn set_alpha_texture<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, texture: TextureId) {
        self.alpha = Some(texture);
        if let Some(d) = graph.drawable(self.node) {
            self.push_textures(backend, d);
        }
    }

    /// Spin about the ring normal. Hidden rings keep spinning.
    pub fn update(&mut self, graph: &mut SceneGraph, dt_ms: f64) {
        if orbit::advance_ring_spin(&mut self.spin, dt_ms, self.config.rotation_speed) {
            self.sync_node(graph);
        }
    }

    fn sanitize(&mut self) {
        let c = &mut self.config;
        let defaults = RingConfig::default();
        if !c.inner_radius.is_finite() || !c.outer_radius.is_finite() {
            c.inner_radius = defaults.inner_radius;
            c.outer_radius = defaults.outer_radius;
        }
        (c.inner_radius, c.outer_radius) = clamp_radii(c.inner_radius, c.outer_radius);
        c.segments = c.segments.clamp(MIN_RING_SEGMENTS, MAX_RING_SEGMENTS);
        c.opacity = if c.opacity.is_finite() { c.opacity.clamp(0.0, 1.0) } else { defaults.opacity };
        if !c.rotation_speed.is_finite() {
            c.rotation_speed = defaults.rotation_speed;
        }
    }

    fn sync_node(&self, graph: &mut SceneGraph) {
        let rotation = Quat::from_rotation_x(-FRAC_PI_2) * Quat::from_rotation_z(self.spin as f32);
        graph.set_rotation(self.node, rotation.normalize());
    }

    /// Build new geometry and swap it in. On failure the previous drawable
    /// stays; if there is none, a minimal ring is created instead.
    fn rebuild<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B) {
        let c = self.config;
        let (drawable, inner, outer) = match self.create(backend, c.inner_radius, c.outer_radius, c.segments) {
            Ok(built) => built,
            Err(reason) => {
                log::warn!("ring rebuild failed: {reason}");
                if graph.drawable(self.node).is_some() {
                    return;
                }
                let (inner, outer) = FALLBACK_RADII;
                match self.create(backend, inner, outer, MIN_RING_SEGMENTS) {
                    Ok(built) => built,
                    Err(reason) => {
                        log::error!("ring fallback failed: {reason}");
                        return;
                    }
                }
            }
        };

        if let Some(old) = graph.set_drawable(self.node, Some(drawable)) {
            backend.destroy_drawable(old);
        }
        backend.set_uniform(drawable, "innerRadius", UniformValue::Float(inner));
        backend.set_uniform(drawable, "outerRadius", UniformValue::Float(outer));
        backend.set_uniform(drawable, "opacity", UniformValue::Float(self.config.opacity));
        backend.set_uniform(drawable, "color", UniformValue::Color(self.config.color));
        self.push_textures(backend, drawable);
    }

    fn create<B: RenderBackend>(
        &self,
        backend: &mut B,
        inner: f32,
        outer: f32,
        segments: u32,
    ) -> Result<(DrawableId, f32, f32), String> {
        let geometry = RingGeometry::build(inner, outer, segments).map_err(|e| e.to_string())?;
        let desc = DrawableDesc {
            label: "rings".into(),
            primitive: Primitive::Ring { geometry },
            material: MaterialKind::Ring { color: self.config.color, opacity: self.config.opacity },
        };
        let id = backend.create_drawable(&desc).map_err(|e| e.to_string())?;
        Ok((id, inner, outer))
    }

    fn push_textures<B: RenderBackend>(&self, backend: &mut B, d: DrawableId) {
        backend.set_uniform(d, "surfaceTexture", UniformValue::Texture(self.surface));
        backend.set_uniform(d, "alphaTexture", UniformValue::Texture(self.alpha));
        backend.set_uniform(d, "hasTexture", UniformValue::Bool(self.surface.is_some()));
        backend.set_uniform(d, "hasAlphaTexture", UniformValue::Bool(self.alpha.is_some()));
    }
}

/// Bound both radii and keep the band at least [`MIN_THICKNESS`] wide.
fn clamp_radii(inner: f32, outer: f32) -> (f32, f32) {
    let inner = inner.clamp(MIN_INNER_RADIUS, MAX_OUTER_RADIUS - MIN_THICKNESS);
    let outer = outer.min(MAX_OUTER_RADIUS).max(inner + MIN_THICKNESS);
    (inner, outer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessBackend;

    fn setup(visible: bool) -> (SceneGraph, HeadlessBackend, RingSystem) {
        let mut graph = SceneGraph::new();
        let mut backend = HeadlessBackend::new();
        let planet = graph.spawn("planet");
        graph.attach(planet, graph.root());
        let rings = RingSystem::new(&mut graph, &mut backend, planet, RingConfig::default(), visible);
        (graph, backend, rings)
    }

    fn assert_valid(rings: &RingSystem) {
        let c = rings.config();
        assert!(c.inner_radius > 0.0, "inner {}", c.inner_radius);
        assert!(c.inner_radius < c.outer_radius, "inner {} outer {}", c.inner_radius, c.outer_radius);
    }

    #[test]
    fn starts_hidden_with_a_drawable() {
        let (graph, backend, rings) = setup(false);
        assert!(!graph.is_in_scene(rings.node()));
        assert!(rings.drawable(&graph).is_some());
        assert_eq!(backend.live_drawables(), 1);
    }

    #[test]
    fn toggle_visibility() {
        let (mut graph, _backend, mut rings) = setup(false);
        assert!(rings.toggle(&mut graph));
        assert!(graph.is_in_scene(rings.node()));
        assert!(!rings.toggle(&mut graph));
        assert!(!graph.is_in_scene(rings.node()));
    }

    #[test]
    fn inner_push_outer() {
        let (mut graph, mut backend, mut rings) = setup(true);
        rings.set_inner_radius(&mut graph, &mut backend, 5.0);
        assert_eq!(rings.config().inner_radius, 5.0);
        assert_eq!(rings.config().outer_radius, 5.5);
        rings.set_inner_radius(&mut graph, &mut backend, 100.0);
        assert_eq!(rings.config().inner_radius, 8.0);
        assert_valid(&rings);
    }

    #[test]
    fn outer_pulls_inner() {
        let (mut graph, mut backend, mut rings) = setup(true);
        rings.set_outer_radius(&mut graph, &mut backend, 1.5);
        assert_eq!(rings.config().outer_radius, 1.5);
        assert_eq!(rings.config().inner_radius, 1.0);
        rings.set_outer_radius(&mut graph, &mut backend, -3.0);
        assert_eq!(rings.config().outer_radius, 1.0);
        assert_eq!(rings.config().inner_radius, 0.5);
        assert_valid(&rings);
    }

    #[test]
    fn radius_invariant_under_adversarial_input() {
        let (mut graph, mut backend, mut rings) = setup(true);
        let inputs = [0.0, -10.0, 1e9, 0.3, 12.0, 8.0, 0.5, 1.0, f32::NAN, f32::INFINITY, 3.3];
        for (i, &v) in inputs.iter().enumerate() {
            match i % 4 {
                0 => rings.set_inner_radius(&mut graph, &mut backend, v),
                1 => rings.set_outer_radius(&mut graph, &mut backend, v),
                2 => rings.set_thickness(&mut graph, &mut backend, v),
                _ => rings.set_radii(&mut graph, &mut backend, v, v),
            }
            assert_valid(&rings);
            rings.set_outer_radius(&mut graph, &mut backend, v);
            assert_valid(&rings);
            rings.set_thickness(&mut graph, &mut backend, -v);
            assert_valid(&rings);
        }
        assert_eq!(backend.live_drawables(), 1);
    }

    #[test]
    fn huge_radii_are_bounded() {
        let (mut graph, mut backend, mut rings) = setup(true);
        rings.set_radii(&mut graph, &mut backend, 1e9, 0.0);
        assert_valid(&rings);
        assert!(rings.config().outer_radius <= MAX_OUTER_RADIUS + MIN_THICKNESS);

        rings.set_radii(&mut graph, &mut backend, 3e7, 3e7 + 8.0);
        assert_valid(&rings);
        rings.set_thickness(&mut graph, &mut backend, 0.1);
        assert_valid(&rings);
        assert!(rings.thickness() >= MIN_THICKNESS * 0.99);

        rings.set_thickness(&mut graph, &mut backend, 1e30);
        assert_valid(&rings);
        assert_eq!(rings.config().outer_radius, MAX_OUTER_RADIUS);
    }

    #[test]
    fn restored_config_is_bounded() {
        let (mut graph, mut backend, mut rings) = setup(true);
        let config = RingConfig { inner_radius: 5e8, outer_radius: 5e8, ..RingConfig::default() };
        rings.apply_config(&mut graph, &mut backend, RingPreset::Custom, config);
        assert_valid(&rings);
        assert!(rings.drawable(&graph).is_some());
    }

    #[test]
    fn thickness_keeps_midpoint() {
        let (mut graph, mut backend, mut rings) = setup(true);
        rings.set_thickness(&mut graph, &mut backend, 1.0);
        assert_eq!(rings.config().inner_radius, 2.5);
        assert_eq!(rings.config().outer_radius, 3.5);
        let before = rings.drawable(&graph);
        // below the change threshold: nothing rebuilt
        rings.set_thickness(&mut graph, &mut backend, 1.005);
        assert_eq!(rings.drawable(&graph), before);
    }

    #[test]
    fn detail_clamped() {
        let (mut graph, mut backend, mut rings) = setup(true);
        rings.set_detail(&mut graph, &mut backend, 2);
        assert_eq!(rings.config().segments, MIN_RING_SEGMENTS);
        rings.set_detail(&mut graph, &mut backend, 10_000);
        assert_eq!(rings.config().segments, MAX_RING_SEGMENTS);
    }

    #[test]
    fn opacity_clamped_and_pushed() {
        let (graph, mut backend, mut rings) = setup(true);
        rings.set_opacity(&graph, &mut backend, 4.0);
        let d = rings.drawable(&graph).unwrap();
        assert_eq!(backend.uniform(d, "opacity"), Some(UniformValue::Float(1.0)));
        rings.set_opacity(&graph, &mut backend, -1.0);
        assert_eq!(rings.config().opacity, 0.0);
    }

    #[test]
    fn preset_keeps_visibility_and_textures() {
        let (mut graph, mut backend, mut rings) = setup(true);
        rings.set_surface_texture(&graph, &mut backend, TextureId(9));
        rings.load_preset(&mut graph, &mut backend, RingPreset::Uranus);
        assert!(rings.is_visible());
        assert_eq!(rings.config().inner_radius, 3.5);
        assert_eq!(rings.config().outer_radius, 4.5);
        assert_eq!(rings.config().segments, 64);
        let d = rings.drawable(&graph).unwrap();
        assert_eq!(backend.uniform(d, "surfaceTexture"), Some(UniformValue::Texture(Some(TextureId(9)))));
        assert_eq!(backend.uniform(d, "hasTexture"), Some(UniformValue::Bool(true)));
        assert_eq!(backend.uniform(d, "hasAlphaTexture"), Some(UniformValue::Bool(false)));
    }

    #[test]
    fn failed_rebuild_keeps_old_drawable() {
        let (mut graph, mut backend, mut rings) = setup(true);
        let before = rings.drawable(&graph);
        backend.fail_next_creates(1);
        rings.set_inner_radius(&mut graph, &mut backend, 3.0);
        assert_eq!(rings.drawable(&graph), before);
        assert_eq!(backend.live_drawables(), 1);
    }

    #[test]
    fn fallback_when_nothing_to_keep() {
        let mut graph = SceneGraph::new();
        let mut backend = HeadlessBackend::new();
        let planet = graph.spawn("planet");
        backend.fail_next_creates(1);
        let rings = RingSystem::new(&mut graph, &mut backend, planet, RingConfig::default(), true);
        let d = rings.drawable(&graph).expect("fallback ring");
        assert_eq!(backend.uniform(d, "innerRadius"), Some(UniformValue::Float(1.0)));
        match &backend.drawable(d).unwrap().desc.primitive {
            Primitive::Ring { geometry } => {
                assert_eq!(geometry.inner_radius, 1.0);
                assert_eq!(geometry.segments, MIN_RING_SEGMENTS);
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn hidden_rings_keep_spinning() {
        let (mut graph, _backend, mut rings) = setup(false);
        rings.update(&mut graph, orbit::REFERENCE_FRAME_MS * 10.0);
        // speed 0.5 → 0.0005 rad per reference frame
        assert!((rings.spin() - 0.005).abs() < 1e-9);
    }
}
