// components/clouds.rs
//
// Named cloud shells around the planet. Each layer is a sphere slightly
// larger than the planet, spinning at its own rate, with a uniform block
// the cloud shader reads (sun direction, scattering, rim light, ...).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::api::types::{Color, DrawableId, TextureId};
use crate::core::scene::{NodeId, SceneGraph};
use crate::renderer::traits::{DrawableDesc, MaterialKind, Primitive, RenderBackend, UniformValue};
use crate::systems::orbit;

const CLOUD_SEGMENTS: u32 = 64;
/// Default shell height above the planet surface.
pub const DEFAULT_ALTITUDE: f32 = 0.02;
pub const MAX_ALTITUDE: f32 = 1.0;

/// Shader parameters for one cloud layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudUniforms {
    pub opacity: f32,
    pub density: f32,
    pub scattering: f32,
    pub rim_light: f32,
    pub rim_color: [f32; 3],
    pub altitude_opacity_factor: f32,
    pub edge_fade: f32,
    pub enable_scattering: bool,
    pub enable_rim_light: bool,
    /// Multiplier on the texture drift in the shader.
    pub cloud_speed: f32,
    pub offset: [f32; 2],
}

impl Default for CloudUniforms {
    fn default() -> Self {
        Self {
            opacity: 0.8,
            density: 1.0,
            scattering: 0.3,
            rim_light: 0.5,
            rim_color: [0.4, 0.7, 1.0],
            altitude_opacity_factor: 2.0,
            edge_fade: 0.3,
            enable_scattering: true,
            enable_rim_light: true,
            cloud_speed: 1.0,
            offset: [0.0, 0.0],
        }
    }
}

/// One adjustable cloud parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "param", content = "value", rename_all = "camelCase")]
pub enum CloudParam {
    Opacity(f32),
    Density(f32),
    Scattering(f32),
    RimLight(f32),
    RimColor(Color),
    AltitudeOpacity(f32),
    EdgeFade(f32),
    Speed(f32),
    EnableScattering(bool),
    EnableRimLight(bool),
}

impl CloudUniforms {
    /// Apply one parameter, clamped to its valid range. Non-finite values are ignored.
    pub fn apply(&mut self, param: CloudParam) {
        let set = |slot: &mut f32, v: f32, lo: f32, hi: f32| {
            if v.is_finite() {
                *slot = v.clamp(lo, hi);
            }
        };
        match param {
            CloudParam::Opacity(v) => set(&mut self.opacity, v, 0.0, 1.0),
            CloudParam::Density(v) => set(&mut self.density, v, 0.0, 2.0),
            CloudParam::Scattering(v) => set(&mut self.scattering, v, 0.0, 1.0),
            CloudParam::RimLight(v) => set(&mut self.rim_light, v, 0.0, 2.0),
            CloudParam::RimColor(c) => self.rim_color = c.rgb(),
            CloudParam::AltitudeOpacity(v) => set(&mut self.altitude_opacity_factor, v, 0.0, 5.0),
            CloudParam::EdgeFade(v) => set(&mut self.edge_fade, v, 0.0, 1.0),
            CloudParam::Speed(v) => set(&mut self.cloud_speed, v, 0.0, 10.0),
            CloudParam::EnableScattering(on) => self.enable_scattering = on,
            CloudParam::EnableRimLight(on) => self.enable_rim_light = on,
        }
    }

    /// Copy of `self` with every field pulled into range.
    pub fn sanitized(self) -> Self {
        let mut out = CloudUniforms {
            rim_color: self.rim_color,
            offset: self.offset,
            ..CloudUniforms::default()
        };
        for param in [
            CloudParam::Opacity(self.opacity),
            CloudParam::Density(self.density),
            CloudParam::Scattering(self.scattering),
            CloudParam::RimLight(self.rim_light),
            CloudParam::AltitudeOpacity(self.altitude_opacity_factor),
            CloudParam::EdgeFade(self.edge_fade),
            CloudParam::Speed(self.cloud_speed),
            CloudParam::EnableScattering(self.enable_scattering),
            CloudParam::EnableRimLight(self.enable_rim_light),
        ] {
            out.apply(param);
        }
        out
    }

    fn push<B: RenderBackend>(&self, backend: &mut B, drawable: DrawableId) {
        backend.set_uniform(drawable, "opacity", UniformValue::Float(self.opacity));
        backend.set_uniform(drawable, "density", UniformValue::Float(self.density));
        backend.set_uniform(drawable, "scattering", UniformValue::Float(self.scattering));
        backend.set_uniform(drawable, "rimLight", UniformValue::Float(self.rim_light));
        backend.set_uniform(drawable, "rimColor", UniformValue::Vec3(self.rim_color));
        backend.set_uniform(drawable, "altitudeOpacityFactor", UniformValue::Float(self.altitude_opacity_factor));
        backend.set_uniform(drawable, "edgeFade", UniformValue::Float(self.edge_fade));
        backend.set_uniform(drawable, "enableScattering", UniformValue::Bool(self.enable_scattering));
        backend.set_uniform(drawable, "enableRimLight", UniformValue::Bool(self.enable_rim_light));
        backend.set_uniform(drawable, "cloudSpeed", UniformValue::Float(self.cloud_speed));
        backend.set_uniform(drawable, "offset", UniformValue::Vec2(self.offset));
    }
}

/// Read-back summary of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudLayerInfo {
    pub name: String,
    pub altitude: f32,
    pub rotation_speed: f32,
    pub uniforms: CloudUniforms,
    pub textured: bool,
    #[serde(default)]
    pub has_density_map: bool,
}

#[derive(Debug)]
struct CloudLayer {
    name: String,
    altitude: f32,
    rotation_speed: f32,
    node: NodeId,
    spin: f64,
    uniforms: CloudUniforms,
    texture: Option<TextureId>,
    density_map: Option<TextureId>,
}

/// All cloud layers of the planet, in creation order.
#[derive(Debug)]
pub struct CloudLayers {
    /// Planet frame node; layers follow its placement and tilt.
    parent: NodeId,
    base_radius: f32,
    layers: Vec<CloudLayer>,
    /// Seconds since creation, fed to the shader.
    time_s: f64,
    sun_direction: Vec3,
    sun_intensity: f32,
}

impl CloudLayers {
    pub fn new(parent: NodeId, base_radius: f32) -> Self {
        Self {
            parent,
            base_radius,
            layers: Vec::new(),
            time_s: 0.0,
            sun_direction: Vec3::X,
            sun_intensity: 1.0,
        }
    }

    /// Add a layer. An existing layer with the same name is replaced.
    pub fn add<B: RenderBackend>(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut B,
        name: &str,
        altitude: f32,
        rotation_speed: f32,
    ) {
        if self.remove(graph, backend, name) {
            log::debug!("replacing cloud layer '{name}'");
        }
        let node = graph.spawn(format!("clouds:{name}"));
        let desc = DrawableDesc {
            label: format!("clouds:{name}"),
            primitive: Primitive::Sphere { radius: 1.0, segments: CLOUD_SEGMENTS },
            material: MaterialKind::Cloud,
        };
        match backend.create_drawable(&desc) {
            Ok(drawable) => {
                graph.set_drawable(node, Some(drawable));
            }
            Err(e) => log::warn!("cloud layer '{name}' has no mesh: {e}"),
        }
        graph.attach(node, self.parent);

        let layer = CloudLayer {
            name: name.to_string(),
            altitude: sanitize_altitude(altitude).unwrap_or(DEFAULT_ALTITUDE),
            rotation_speed: if rotation_speed.is_finite() { rotation_speed } else { 0.0 },
            node,
            spin: 0.0,
            uniforms: CloudUniforms::default(),
            texture: None,
            density_map: None,
        };
        self.sync(graph, &layer);
        if let Some(d) = graph.drawable(node) {
            layer.uniforms.push(backend, d);
            backend.set_uniform(d, "time", UniformValue::Float(self.time_s as f32));
            backend.set_uniform(d, "sunDirection", UniformValue::Vec3(self.sun_direction.to_array()));
            backend.set_uniform(d, "sunIntensity", UniformValue::Float(self.sun_intensity));
        }
        self.layers.push(layer);
    }

    pub fn remove<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, name: &str) -> bool {
        let Some(index) = self.layers.iter().position(|l| l.name == name) else {
            return false;
        };
        let layer = self.layers.remove(index);
        for drawable in graph.despawn(layer.node) {
            backend.destroy_drawable(drawable);
        }
        true
    }

    pub fn clear<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B) {
        for layer in self.layers.drain(..) {
            for drawable in graph.despawn(layer.node) {
                backend.destroy_drawable(drawable);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.find(name).map(|l| l.node)
    }

    fn find(&self, name: &str) -> Option<&CloudLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut CloudLayer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    pub fn info(&self) -> Vec<CloudLayerInfo> {
        self.layers
            .iter()
            .map(|l| CloudLayerInfo {
                name: l.name.clone(),
                altitude: l.altitude,
                rotation_speed: l.rotation_speed,
                uniforms: l.uniforms,
                textured: l.texture.is_some(),
                has_density_map: l.density_map.is_some(),
            })
            .collect()
    }

    /// Adjust one shader parameter. `None` targets every layer.
    pub fn configure<B: RenderBackend>(
        &mut self,
        graph: &SceneGraph,
        backend: &mut B,
        name: Option<&str>,
        param: CloudParam,
    ) -> bool {
        let mut touched = false;
        for layer in self.layers.iter_mut().filter(|l| name.map_or(true, |n| l.name == n)) {
            layer.uniforms.apply(param);
            if let Some(d) = graph.drawable(layer.node) {
                layer.uniforms.push(backend, d);
            }
            touched = true;
        }
        touched
    }

    /// Replace a layer's whole uniform block, e.g. from a snapshot.
    /// Values are clamped the same way single-parameter changes are.
    pub fn set_uniforms<B: RenderBackend>(
        &mut self,
        graph: &SceneGraph,
        backend: &mut B,
        name: &str,
        uniforms: CloudUniforms,
    ) -> bool {
        let Some(layer) = self.find_mut(name) else {
            return false;
        };
        layer.uniforms = uniforms.sanitized();
        if let Some(d) = graph.drawable(layer.node) {
            layer.uniforms.push(backend, d);
        }
        true
    }

    pub fn set_altitude(&mut self, graph: &mut SceneGraph, name: &str, altitude: f32) -> bool {
        let Some(altitude) = sanitize_altitude(altitude) else {
            return false;
        };
        let base = self.base_radius;
        match self.find_mut(name) {
            Some(layer) => {
                layer.altitude = altitude;
                graph.set_scale(layer.node, Vec3::splat(base + altitude));
                true
            }
            None => false,
        }
    }

    pub fn set_rotation_speed(&mut self, name: &str, speed: f32) -> bool {
        if !speed.is_finite() {
            return false;
        }
        match self.find_mut(name) {
            Some(layer) => {
                layer.rotation_speed = speed;
                true
            }
            None => false,
        }
    }

    /// Follow a change in planet radius.
    pub fn set_base_radius(&mut self, graph: &mut SceneGraph, radius: f32) {
        self.base_radius = radius;
        for layer in &self.layers {
            graph.set_scale(layer.node, Vec3::splat(radius + layer.altitude));
        }
    }

    pub fn set_texture<B: RenderBackend>(
        &mut self,
        graph: &SceneGraph,
        backend: &mut B,
        name: &str,
        texture: TextureId,
    ) -> bool {
        let Some(layer) = self.find_mut(name) else {
            return false;
        };
        layer.texture = Some(texture);
        if let Some(d) = graph.drawable(layer.node) {
            backend.set_uniform(d, "map", UniformValue::Texture(Some(texture)));
        }
        true
    }

    /// Bind a density map; its red channel overrides the colour map's alpha.
    pub fn set_density_map<B: RenderBackend>(
        &mut self,
        graph: &SceneGraph,
        backend: &mut B,
        name: &str,
        texture: TextureId,
    ) -> bool {
        let Some(layer) = self.find_mut(name) else {
            return false;
        };
        layer.density_map = Some(texture);
        if let Some(d) = graph.drawable(layer.node) {
            backend.set_uniform(d, "cloudDensityMap", UniformValue::Texture(Some(texture)));
        }
        true
    }

    /// Push the sun's direction and intensity to every layer.
    pub fn set_sun<B: RenderBackend>(&mut self, graph: &SceneGraph, backend: &mut B, direction: Vec3, intensity: f32) {
        self.sun_direction = direction;
        self.sun_intensity = intensity;
        for layer in &self.layers {
            if let Some(d) = graph.drawable(layer.node) {
                backend.set_uniform(d, "sunDirection", UniformValue::Vec3(direction.to_array()));
                backend.set_uniform(d, "sunIntensity", UniformValue::Float(intensity));
            }
        }
    }

    pub fn sun_direction(&self) -> Vec3 {
        self.sun_direction
    }

    /// Spin every layer and advance the shader clock.
    pub fn update<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, dt_ms: f64, time_scale: f32) {
        self.time_s += dt_ms.max(0.0) / 1000.0;
        let scaled = dt_ms * time_scale as f64;
        for layer in &mut self.layers {
            if orbit::advance_spin(&mut layer.spin, scaled, layer.rotation_speed) {
                graph.set_rotation(layer.node, Quat::from_rotation_y(layer.spin as f32));
            }
            if let Some(d) = graph.drawable(layer.node) {
                backend.set_uniform(d, "time", UniformValue::Float(self.time_s as f32));
            }
        }
    }

    fn sync(&self, graph: &mut SceneGraph, layer: &CloudLayer) {
        if let Some(local) = graph.local_mut(layer.node) {
            local.scale = Vec3::splat(self.base_radius + layer.altitude);
            local.rotation = Quat::from_rotation_y(layer.spin as f32);
        }
    }
}

fn sanitize_altitude(altitude: f32) -> Option<f32> {
    altitude.is_finite().then(|| altitude.clamp(0.0, MAX_ALTITUDE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessBackend;

    fn setup() -> (SceneGraph, HeadlessBackend, CloudLayers) {
        let mut graph = SceneGraph::new();
        let planet = graph.spawn("planet");
        graph.attach(planet, graph.root());
        (graph, HeadlessBackend::new(), CloudLayers::new(planet, 2.0))
    }

    #[test]
    fn add_pushes_default_uniforms() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "low", 0.02, 1.0);
        let node = clouds.node("low").unwrap();
        let d = graph.drawable(node).unwrap();
        assert_eq!(backend.uniform(d, "opacity"), Some(UniformValue::Float(0.8)));
        assert_eq!(backend.uniform(d, "edgeFade"), Some(UniformValue::Float(0.3)));
        assert!((graph.local(node).unwrap().scale - Vec3::splat(2.02)).length() < 1e-5);
    }

    #[test]
    fn same_name_replaces() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "low", 0.02, 1.0);
        clouds.add(&mut graph, &mut backend, "low", 0.05, 1.0);
        assert_eq!(clouds.len(), 1);
        assert_eq!(backend.live_drawables(), 1);
        assert_eq!(clouds.info()[0].altitude, 0.05);
    }

    #[test]
    fn parameters_are_clamped() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "low", 0.02, 1.0);
        clouds.configure(&graph, &mut backend, Some("low"), CloudParam::Opacity(3.0));
        clouds.configure(&graph, &mut backend, None, CloudParam::Density(-1.0));
        clouds.configure(&graph, &mut backend, None, CloudParam::AltitudeOpacity(9.0));
        clouds.configure(&graph, &mut backend, None, CloudParam::RimLight(f32::NAN));
        let u = clouds.info()[0].uniforms;
        assert_eq!(u.opacity, 1.0);
        assert_eq!(u.density, 0.0);
        assert_eq!(u.altitude_opacity_factor, 5.0);
        assert_eq!(u.rim_light, 0.5);
        assert!(!clouds.configure(&graph, &mut backend, Some("missing"), CloudParam::Opacity(0.1)));
    }

    #[test]
    fn update_spins_and_ticks_time() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "low", 0.02, 1.0);
        clouds.update(&mut graph, &mut backend, 500.0, 1.0);
        let node = clouds.node("low").unwrap();
        let rot = graph.local(node).unwrap().rotation;
        assert!(rot.angle_between(Quat::from_rotation_y(1.0)) < 2e-3);
        let d = graph.drawable(node).unwrap();
        assert_eq!(backend.uniform(d, "time"), Some(UniformValue::Float(0.5)));
    }

    #[test]
    fn sun_reaches_every_layer() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "low", 0.02, 1.0);
        clouds.add(&mut graph, &mut backend, "high", 0.08, 0.5);
        clouds.set_sun(&graph, &mut backend, Vec3::Z, 0.4);
        for name in ["low", "high"] {
            let d = graph.drawable(clouds.node(name).unwrap()).unwrap();
            assert_eq!(backend.uniform(d, "sunDirection"), Some(UniformValue::Vec3([0.0, 0.0, 1.0])));
        }
    }

    #[test]
    fn remove_and_clear_release_drawables() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "a", 0.02, 1.0);
        clouds.add(&mut graph, &mut backend, "b", 0.02, 1.0);
        assert!(clouds.remove(&mut graph, &mut backend, "a"));
        assert!(!clouds.remove(&mut graph, &mut backend, "a"));
        clouds.clear(&mut graph, &mut backend);
        assert!(clouds.is_empty());
        assert_eq!(backend.live_drawables(), 0);
    }

    #[test]
    fn density_map_binds_per_layer() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "low", 0.02, 1.0);
        clouds.add(&mut graph, &mut backend, "high", 0.08, 1.0);
        let texture = crate::api::types::TextureId(7);
        assert!(clouds.set_density_map(&graph, &mut backend, "high", texture));
        assert!(!clouds.set_density_map(&graph, &mut backend, "missing", texture));

        let d = graph.drawable(clouds.node("high").unwrap()).unwrap();
        assert_eq!(backend.uniform(d, "cloudDensityMap"), Some(UniformValue::Texture(Some(texture))));
        let info = clouds.info();
        assert!(!info[0].has_density_map);
        assert!(info[1].has_density_map);
        assert!(!info[1].textured);
    }

    #[test]
    fn restored_uniforms_are_clamped() {
        let (mut graph, mut backend, mut clouds) = setup();
        clouds.add(&mut graph, &mut backend, "low", 0.02, 1.0);
        let wild = CloudUniforms { opacity: 4.0, density: f32::NAN, ..CloudUniforms::default() };
        assert!(clouds.set_uniforms(&graph, &mut backend, "low", wild));
        let u = clouds.info()[0].uniforms;
        assert_eq!(u.opacity, 1.0);
        assert_eq!(u.density, CloudUniforms::default().density);
        assert!(!clouds.set_uniforms(&graph, &mut backend, "missing", wild));
    }
}
