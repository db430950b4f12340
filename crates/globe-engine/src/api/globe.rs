//! The animation host: owns the scene and drives it one frame at a time.
//!
//! Scene layout:
//!
//! ```text
//! root
//! ├── camera ── light anchor (near mode) ── sun
//! └── world pivot
//!     ├── light anchor (far mode) ── sun
//!     ├── planet pivot ── frame ── mesh
//!     │                     ├── cloud layers
//!     │                     └── rings
//!     └── moon anchor ── moon pivots ...
//! ```
//!
//! Every frame runs in a fixed order: queued commands, finished texture
//! loads, planet, clouds, moons, rings, lighting, GIF turntable, sun push
//! into cloud shading, render, GIF capture.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::config::GlobeConfig;
use super::types::{Background, GlobeEvent, LightingMode};
use crate::assets::snapshot::{
    LightingSnapshot, PlanetSnapshot, RingSnapshot, SceneSnapshot, SNAPSHOT_VERSION,
};
use crate::assets::texture::{TextureLoaded, TextureLoader, TextureTarget};
use crate::components::body::{BodyConfig, CelestialBody, MIN_EXTENT};
use crate::components::clouds::{CloudLayerInfo, CloudLayers};
use crate::components::planet::{Planet, PlanetKind};
use crate::components::rings::{RingConfig, RingInfo, RingPreset, RingSystem};
use crate::core::scene::{NodeId, SceneGraph};
use crate::core::time::FrameClock;
use crate::extensions::easing::Easing;
use crate::extensions::tween::{Tween, TweenState};
use crate::input::queue::{CommandQueue, SceneCommand};
use crate::renderer::traits::{FrameView, RenderBackend};
use crate::systems::lighting::LightingController;
use crate::systems::moons::{scatter_phase, MoonRegistry, MoonSystemInfo};

/// Name of the cloud layer created at startup.
pub const DEFAULT_CLOUD_LAYER: &str = "default";
/// Directional light intensity per unit of the sun slider.
const LIGHT_PER_SUN_UNIT: f32 = 0.5;
/// Keeps the camera off the poles so the orbit stays well defined.
const MAX_ELEVATION: f32 = FRAC_PI_2 - 0.01;
const GIF_DONE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetInfo {
    pub kind: PlanetKind,
    pub name: String,
    pub radius: f32,
    pub rotation_speed: f32,
    pub axial_tilt: f32,
    pub time_scale: f32,
    pub real_time_rotation: bool,
    pub textured: bool,
    pub has_bump_map: bool,
    pub has_specular_map: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingInfo {
    pub mode: LightingMode,
    pub threshold: f32,
    pub transitioning: bool,
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
    pub sun_direction: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    pub distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
}

/// Everything the UI reads back to populate its controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobeInfo {
    pub planet: PlanetInfo,
    pub moons: MoonSystemInfo,
    pub clouds: Vec<CloudLayerInfo>,
    pub rings: RingInfo,
    pub ring_presets: Vec<RingPreset>,
    pub lighting: LightingInfo,
    pub camera: CameraInfo,
    pub background: Background,
    pub gif_capturing: bool,
}

/// One turntable recording in progress.
struct GifCapture<F> {
    node: NodeId,
    base: Quat,
    tweens: TweenState,
    frames: Vec<F>,
}

pub struct Globe<B: RenderBackend> {
    config: GlobeConfig,
    graph: SceneGraph,
    backend: B,
    camera: NodeId,
    world: NodeId,
    sun: NodeId,
    camera_orbit: CameraInfo,
    planet: Planet,
    clouds: CloudLayers,
    moons: MoonRegistry,
    rings: RingSystem,
    lighting: LightingController,
    textures: TextureLoader,
    commands: CommandQueue,
    clock: FrameClock,
    background: Background,
    custom_moon_counter: u32,
    gif: Option<GifCapture<B::Frame>>,
    gif_frames: Vec<B::Frame>,
    events: Vec<GlobeEvent>,
    sun_direction: Vec3,
}

impl<B: RenderBackend> Globe<B> {
    pub fn new(mut backend: B, config: GlobeConfig) -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.root();

        let camera = graph.spawn("camera");
        graph.attach(camera, root);
        let world = graph.spawn("world");
        graph.attach(world, root);

        let anchor = graph.spawn("light");
        let sun = graph.spawn("sun");
        graph.set_translation(sun, Vec3::from(config.sun_offset));
        graph.attach(sun, anchor);
        let mut lighting = LightingController::new(&mut graph, anchor, camera, world)
            .with_threshold(config.light_threshold)
            .with_transition_ms(config.light_transition_ms);
        lighting.set_sun_intensity(config.sun_intensity);
        lighting.set_ambient_intensity(config.ambient_intensity);

        let kind = config.planet_kind;
        let planet = Planet::spawn(&mut graph, &mut backend, world, config.planet_radius, kind)
            .with_real_time_rotation(config.real_time_rotation);
        let frame = planet.body().frame();
        let mut clouds = CloudLayers::new(frame, planet.body().config().size);
        if let Some(altitude) = config.cloud_altitude {
            clouds.add(&mut graph, &mut backend, DEFAULT_CLOUD_LAYER, altitude, kind.cloud_rotation_speed());
        }

        let moon_anchor = graph.spawn("moons");
        graph.attach(moon_anchor, world);
        let mut moons = MoonRegistry::new(moon_anchor);
        if let Some(preset) = config.moon_preset {
            moons.load_preset(&mut graph, &mut backend, preset);
        }

        let mut rings = RingSystem::new(&mut graph, &mut backend, frame, RingConfig::default(), config.rings_visible);
        rings.load_preset(&mut graph, &mut backend, config.ring_preset);

        let mut globe = Self {
            clock: FrameClock::new(config.max_frame_delta_ms),
            camera_orbit: CameraInfo { distance: config.camera_distance, azimuth: 0.0, elevation: 0.0 },
            config,
            graph,
            backend,
            camera,
            world,
            sun,
            planet,
            clouds,
            moons,
            rings,
            lighting,
            textures: TextureLoader::new(),
            commands: CommandQueue::new(),
            background: Background::default(),
            custom_moon_counter: 1,
            gif: None,
            gif_frames: Vec::new(),
            events: Vec::new(),
            sun_direction: Vec3::Z,
        };
        globe.set_camera_orbit(globe.config.camera_distance, 0.0, 0.0);
        globe.push_sun();
        log::info!("globe ready ({} moons)", globe.moons.len());
        globe
    }

    // -- Frame loop --

    /// Run one frame at host time `now_ms` (e.g. the rAF timestamp).
    pub fn tick(&mut self, now_ms: f64) {
        let dt = self.clock.delta(now_ms);
        self.advance(dt);
    }

    /// Forget the last host timestamp so the next [`tick`](Self::tick) has
    /// Δt = 0. Call when the frame loop (re)starts.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    /// Run one frame with an explicit delta in ms.
    pub fn advance(&mut self, dt_ms: f64) {
        let dt = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

        for command in self.commands.drain() {
            self.apply_command(command);
        }
        for loaded in self.textures.drain() {
            self.apply_texture(loaded);
        }

        self.planet.update(&mut self.graph, dt);
        self.clouds.update(&mut self.graph, &mut self.backend, dt, self.planet.spin_scale());
        self.moons.update(&mut self.graph, dt);
        self.rings.update(&mut self.graph, dt);

        if let Some(distance) = self.camera_to_planet() {
            if let Some(mode) = self.lighting.observe(&mut self.graph, distance) {
                log::info!("lighting mode {mode:?} at distance {distance:.2}");
                self.events.push(GlobeEvent::LightingModeChanged { mode });
            }
        }
        self.lighting.advance(&mut self.graph, dt);

        let gif_done = match &mut self.gif {
            Some(gif) => {
                gif.tweens.tick(dt, &mut self.graph);
                gif.tweens.drain_completed().any(|id| id == GIF_DONE)
            }
            None => false,
        };

        self.push_sun();
        self.render();

        if let Some(gif) = &mut self.gif {
            if let Some(frame) = self.backend.capture_frame() {
                gif.frames.push(frame);
            }
        }
        if gif_done {
            self.finish_gif();
        }
    }

    /// Queue a command for the start of the next frame.
    pub fn push_command(&mut self, command: SceneCommand) {
        self.commands.push(command);
    }

    /// Queue encoded image bytes for a texture slot. Decoding happens off the frame.
    pub fn load_texture(&mut self, target: TextureTarget, bytes: Vec<u8>) {
        self.textures.load(target, bytes);
    }

    /// Queue a texture for a moon, pinned to the moon currently holding `id`.
    /// Returns false if there is no such moon.
    pub fn load_moon_texture(&mut self, id: &str, bytes: Vec<u8>) -> bool {
        let Some(serial) = self.moons.get(id).map(CelestialBody::serial) else {
            return false;
        };
        self.textures.load(TextureTarget::Moon { id: id.to_string(), serial }, bytes);
        true
    }

    // -- Commands --

    /// Apply one command now. Returns false if it referred to something
    /// that does not exist (unknown moon or cloud layer).
    pub fn apply_command(&mut self, command: SceneCommand) -> bool {
        let graph = &mut self.graph;
        let backend = &mut self.backend;
        match command {
            SceneCommand::SetPlanetKind { kind } => {
                self.planet.set_kind(graph, kind);
                for layer in self.clouds.info() {
                    self.clouds.set_rotation_speed(&layer.name, kind.cloud_rotation_speed());
                }
            }
            SceneCommand::SetPlanetSize { size } => {
                self.planet.body_mut().set_size(graph, size);
                self.clouds.set_base_radius(graph, self.planet.body().config().size);
            }
            SceneCommand::SetPlanetRotationSpeed { speed } => self.planet.body_mut().set_rotation_speed(speed),
            SceneCommand::SetPlanetColor { color } => self.planet.body_mut().set_color(graph, backend, color),
            SceneCommand::SetTimeScale { scale } => self.planet.set_time_scale(scale),
            SceneCommand::SetRealTimeRotation { enabled } => self.planet.set_real_time_rotation(enabled),

            SceneCommand::AddMoon { config } => {
                let id = config.id.clone();
                self.moons.add(graph, backend, config);
                self.events.push(GlobeEvent::MoonAdded { id });
            }
            SceneCommand::AddCustomMoon => {
                let n = self.custom_moon_counter;
                self.custom_moon_counter += 1;
                let id = format!("moon{n}");
                let config = BodyConfig::new(id.clone(), format!("Moon {n}")).with_phase(scatter_phase(&id));
                self.moons.add(graph, backend, config);
                self.events.push(GlobeEvent::MoonAdded { id });
            }
            SceneCommand::RemoveMoon { id } => {
                if !self.moons.remove(graph, backend, &id) {
                    return false;
                }
                self.events.push(GlobeEvent::MoonRemoved { id });
            }
            SceneCommand::ShowMoon { id } => return self.moons.show(graph, &id),
            SceneCommand::HideMoon { id } => return self.moons.hide(graph, &id),
            SceneCommand::ShowAllMoons => self.moons.show_all(graph),
            SceneCommand::HideAllMoons => self.moons.hide_all(graph),
            SceneCommand::LoadMoonPreset { preset } => self.moons.load_preset(graph, backend, preset),
            SceneCommand::SetMoonName { id, name } => return self.with_moon(&id, |m, _, _| m.set_name(name)),
            SceneCommand::SetMoonSize { id, size } => return self.with_moon(&id, |m, g, _| m.set_size(g, size)),
            SceneCommand::SetMoonDistance { id, distance } => {
                return self.with_moon(&id, |m, g, _| m.set_distance(g, distance));
            }
            SceneCommand::SetMoonOrbitSpeed { id, speed } => {
                return self.with_moon(&id, |m, _, _| m.set_orbit_speed(speed));
            }
            SceneCommand::SetMoonRotationSpeed { id, speed } => {
                return self.with_moon(&id, |m, _, _| m.set_rotation_speed(speed));
            }
            SceneCommand::SetMoonRetrograde { id, degrees } => {
                return self.with_moon(&id, |m, _, _| m.set_retrograde(degrees));
            }
            SceneCommand::SetMoonColor { id, color } => {
                return self.with_moon(&id, |m, g, b| m.set_color(g, b, color));
            }
            SceneCommand::SetMoonPosition { id, position } => {
                return self.with_moon(&id, |m, g, _| m.set_position_offset(g, position));
            }
            SceneCommand::SetMoonRotation { id, rotation } => {
                return self.with_moon(&id, |m, g, _| m.set_rotation_offset(g, rotation));
            }
            SceneCommand::SetMoonScale { id, scale } => {
                return self.with_moon(&id, |m, g, _| m.set_scale_offset(g, scale));
            }
            SceneCommand::ResetMoonTransform { id } => return self.with_moon(&id, |m, g, _| m.reset_transform(g)),

            SceneCommand::SetRingsVisible { visible } => self.rings.set_visible(graph, visible),
            SceneCommand::ToggleRings => {
                self.rings.toggle(graph);
            }
            SceneCommand::LoadRingPreset { preset } => self.rings.load_preset(graph, backend, preset),
            SceneCommand::SetRingInnerRadius { radius } => self.rings.set_inner_radius(graph, backend, radius),
            SceneCommand::SetRingOuterRadius { radius } => self.rings.set_outer_radius(graph, backend, radius),
            SceneCommand::SetRingRadii { inner, outer } => self.rings.set_radii(graph, backend, inner, outer),
            SceneCommand::SetRingThickness { thickness } => self.rings.set_thickness(graph, backend, thickness),
            SceneCommand::SetRingDetail { segments } => self.rings.set_detail(graph, backend, segments),
            SceneCommand::SetRingOpacity { opacity } => self.rings.set_opacity(graph, backend, opacity),
            SceneCommand::SetRingColor { color } => self.rings.set_color(graph, backend, color),
            SceneCommand::SetRingRotationSpeed { speed } => self.rings.set_rotation_speed(speed),

            SceneCommand::AddCloudLayer { name, altitude, rotation_speed } => {
                self.clouds.add(graph, backend, &name, altitude, rotation_speed);
                let direction = self.sun_direction;
                let intensity = self.lighting.sun_intensity() * LIGHT_PER_SUN_UNIT;
                self.clouds.set_sun(graph, backend, direction, intensity);
            }
            SceneCommand::RemoveCloudLayer { name } => return self.clouds.remove(graph, backend, &name),
            SceneCommand::ConfigureClouds { layer, param } => {
                return self.clouds.configure(graph, backend, layer.as_deref(), param);
            }
            SceneCommand::SetCloudAltitude { name, altitude } => return self.clouds.set_altitude(graph, &name, altitude),
            SceneCommand::SetCloudRotationSpeed { name, speed } => return self.clouds.set_rotation_speed(&name, speed),

            SceneCommand::SetSunIntensity { intensity } => self.lighting.set_sun_intensity(intensity),
            SceneCommand::SetAmbientIntensity { intensity } => self.lighting.set_ambient_intensity(intensity),
            SceneCommand::SetBackground { background } => self.background = background,
            SceneCommand::SetCameraOrbit { distance, azimuth, elevation } => {
                self.set_camera_orbit(distance, azimuth, elevation);
            }
            SceneCommand::StartGifCapture => return self.start_gif_capture(),
        }
        true
    }

    fn with_moon(&mut self, id: &str, f: impl FnOnce(&mut CelestialBody, &mut SceneGraph, &mut B)) -> bool {
        match self.moons.get_mut(id) {
            Some(moon) => {
                f(moon, &mut self.graph, &mut self.backend);
                true
            }
            None => false,
        }
    }

    fn apply_texture(&mut self, loaded: TextureLoaded) {
        let TextureLoaded { target, image } = loaded;
        let texture = match self.backend.upload_texture(&image) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("texture for {} dropped: {e}", target.label());
                return;
            }
        };
        let graph = &mut self.graph;
        let backend = &mut self.backend;
        let applied = match &target {
            TextureTarget::PlanetSurface => {
                self.planet.body_mut().set_texture(graph, backend, texture);
                true
            }
            TextureTarget::PlanetBump => {
                self.planet.body_mut().set_bump_map(graph, backend, texture);
                true
            }
            TextureTarget::PlanetSpecular => {
                self.planet.body_mut().set_specular_map(graph, backend, texture);
                true
            }
            TextureTarget::CloudLayer(name) => self.clouds.set_texture(graph, backend, name, texture),
            TextureTarget::CloudDensity(name) => self.clouds.set_density_map(graph, backend, name, texture),
            TextureTarget::Moon { id, serial } => match self.moons.get_mut(id) {
                Some(moon) if moon.serial() == *serial => {
                    moon.set_texture(graph, backend, texture);
                    true
                }
                _ => false,
            },
            TextureTarget::RingSurface => {
                self.rings.set_surface_texture(graph, backend, texture);
                true
            }
            TextureTarget::RingAlpha => {
                self.rings.set_alpha_texture(graph, backend, texture);
                true
            }
        };
        if applied {
            self.events.push(GlobeEvent::TextureApplied { target: target.label() });
        } else {
            log::debug!("texture for {} arrived after its target went away", target.label());
        }
    }

    // -- Camera, lighting, rendering --

    /// Place the camera on a sphere around the planet, looking at its centre.
    /// Angles in radians; elevation is kept off the poles.
    pub fn set_camera_orbit(&mut self, distance: f32, azimuth: f32, elevation: f32) {
        if !(distance.is_finite() && azimuth.is_finite() && elevation.is_finite()) {
            return;
        }
        let distance = distance.max(MIN_EXTENT);
        let elevation = elevation.clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.camera_orbit = CameraInfo { distance, azimuth, elevation };
        let rotation = (Quat::from_rotation_y(azimuth) * Quat::from_rotation_x(-elevation)).normalize();
        self.graph.set_rotation(self.camera, rotation);
        self.graph.set_translation(self.camera, rotation * Vec3::new(0.0, 0.0, distance));
    }

    fn camera_to_planet(&self) -> Option<f32> {
        let camera = self.graph.world_position(self.camera)?;
        let planet = self.graph.world_position(self.planet.body().mesh())?;
        Some(camera.distance(planet))
    }

    /// Recompute the sun direction and hand it to the cloud shader.
    fn push_sun(&mut self) {
        if let Some(position) = self.graph.world_position(self.sun) {
            let direction = position.normalize_or_zero();
            if direction != Vec3::ZERO {
                self.sun_direction = direction;
            }
        }
        let intensity = self.lighting.sun_intensity() * LIGHT_PER_SUN_UNIT;
        self.clouds.set_sun(&self.graph, &mut self.backend, self.sun_direction, intensity);
    }

    fn render(&mut self) {
        let items = self.graph.draw_list();
        let Some(camera_world) = self.graph.world_matrix(self.camera) else {
            return;
        };
        let view = FrameView {
            camera_world,
            fov_deg: self.config.fov_deg,
            items: &items,
            sun_direction: self.sun_direction,
            sun_intensity: self.lighting.sun_intensity() * LIGHT_PER_SUN_UNIT,
            ambient_intensity: self.lighting.ambient_intensity(),
            background: &self.background,
        };
        self.backend.render(&view);
    }

    // -- Export --

    /// Render the current state and return the backend's captured frame.
    pub fn screenshot(&mut self) -> Option<B::Frame> {
        self.push_sun();
        self.render();
        self.backend.capture_frame()
    }

    /// Start a turntable recording: one full turn over the configured
    /// duration, capturing a frame every tick. The planet pivot turns in
    /// near mode; in far mode the world pivot turns, carrying the far-mode
    /// light with it, so the lit side stays fixed on the planet. Returns
    /// false if a capture is already running.
    pub fn start_gif_capture(&mut self) -> bool {
        if self.gif.is_some() {
            return false;
        }
        let node = match self.lighting.mode() {
            LightingMode::Near => self.planet.body().pivot(),
            LightingMode::Far => self.world,
        };
        let base = self.graph.local(node).map_or(Quat::IDENTITY, |l| l.rotation);
        let mut tweens = TweenState::new();
        tweens.add(
            node,
            Tween::yaw(base, 0.0, TAU, self.config.gif_duration_ms, Easing::Linear).with_on_complete(GIF_DONE),
        );
        self.gif = Some(GifCapture { node, base, tweens, frames: Vec::new() });
        self.gif_frames.clear();
        log::info!("gif capture started ({} ms)", self.config.gif_duration_ms);
        true
    }

    pub fn is_capturing_gif(&self) -> bool {
        self.gif.is_some()
    }

    /// Frames of the last finished capture. Empty while one is running.
    pub fn take_gif_frames(&mut self) -> Vec<B::Frame> {
        std::mem::take(&mut self.gif_frames)
    }

    fn finish_gif(&mut self) {
        let Some(gif) = self.gif.take() else {
            return;
        };
        self.graph.set_rotation(gif.node, gif.base);
        let frames = gif.frames.len();
        self.gif_frames = gif.frames;
        self.events.push(GlobeEvent::GifCaptureFinished { frames });
        log::info!("gif capture finished ({frames} frames)");
    }

    // -- Persistence --

    pub fn snapshot(&self, timestamp: f64) -> SceneSnapshot {
        let body = self.planet.body().config();
        SceneSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp,
            planet: PlanetSnapshot {
                kind: self.planet.kind(),
                radius: body.size,
                rotation_speed: body.rotation_speed,
                axial_tilt: body.axial_tilt,
                time_scale: self.planet.time_scale(),
                real_time_rotation: self.planet.real_time_rotation(),
                color: body.color,
                texture: body.texture.clone(),
                transform: body.transform,
            },
            moons: self.moons.configs(),
            custom_moon_counter: self.custom_moon_counter,
            clouds: self.clouds.info(),
            rings: RingSnapshot {
                visible: self.rings.is_visible(),
                preset: self.rings.preset(),
                config: *self.rings.config(),
            },
            lighting: LightingSnapshot {
                sun_intensity: self.lighting.sun_intensity(),
                ambient_intensity: self.lighting.ambient_intensity(),
            },
            background: self.background.clone(),
        }
    }

    /// Replace the scene configuration with `snapshot`.
    pub fn apply_snapshot(&mut self, snapshot: SceneSnapshot) {
        let graph = &mut self.graph;
        let backend = &mut self.backend;

        let p = snapshot.planet;
        self.planet.set_kind(graph, p.kind);
        self.planet.set_time_scale(p.time_scale);
        self.planet.set_real_time_rotation(p.real_time_rotation);
        let body = self.planet.body_mut();
        body.set_size(graph, p.radius);
        body.set_rotation_speed(p.rotation_speed);
        body.set_axial_tilt(graph, p.axial_tilt);
        body.set_color(graph, backend, p.color);
        body.set_texture_source(p.texture);
        body.set_position_offset(graph, p.transform.position);
        body.set_rotation_offset(graph, p.transform.rotation);
        body.set_scale_offset(graph, p.transform.scale);
        self.clouds.set_base_radius(graph, body.config().size);

        self.moons.clear(graph, backend);
        for config in snapshot.moons {
            self.moons.add(graph, backend, config);
        }
        self.custom_moon_counter = snapshot.custom_moon_counter.max(1);

        self.clouds.clear(graph, backend);
        for layer in snapshot.clouds {
            self.clouds.add(graph, backend, &layer.name, layer.altitude, layer.rotation_speed);
            self.clouds.set_uniforms(graph, backend, &layer.name, layer.uniforms);
        }

        self.rings.apply_config(graph, backend, snapshot.rings.preset, snapshot.rings.config);
        self.rings.set_visible(graph, snapshot.rings.visible);

        self.lighting.set_sun_intensity(snapshot.lighting.sun_intensity);
        self.lighting.set_ambient_intensity(snapshot.lighting.ambient_intensity);
        self.background = snapshot.background;
        self.push_sun();
        log::info!("scene restored ({} moons)", self.moons.len());
    }

    // -- Read-backs --

    pub fn planet_info(&self) -> PlanetInfo {
        let body = self.planet.body();
        let c = body.config();
        PlanetInfo {
            kind: self.planet.kind(),
            name: c.name.clone(),
            radius: c.size,
            rotation_speed: c.rotation_speed,
            axial_tilt: c.axial_tilt,
            time_scale: self.planet.time_scale(),
            real_time_rotation: self.planet.real_time_rotation(),
            textured: body.texture().is_some(),
            has_bump_map: body.bump_map().is_some(),
            has_specular_map: body.specular_map().is_some(),
        }
    }

    pub fn moon_system_info(&self) -> MoonSystemInfo {
        self.moons.info()
    }

    pub fn cloud_system_info(&self) -> Vec<CloudLayerInfo> {
        self.clouds.info()
    }

    pub fn ring_info(&self) -> RingInfo {
        self.rings.info()
    }

    pub fn lighting_info(&self) -> LightingInfo {
        LightingInfo {
            mode: self.lighting.mode(),
            threshold: self.lighting.threshold(),
            transitioning: self.lighting.is_transitioning(),
            sun_intensity: self.lighting.sun_intensity(),
            ambient_intensity: self.lighting.ambient_intensity(),
            sun_direction: self.sun_direction.to_array(),
        }
    }

    pub fn info(&self) -> GlobeInfo {
        GlobeInfo {
            planet: self.planet_info(),
            moons: self.moon_system_info(),
            clouds: self.cloud_system_info(),
            rings: self.ring_info(),
            ring_presets: RingPreset::ALL.to_vec(),
            lighting: self.lighting_info(),
            camera: self.camera_orbit,
            background: self.background.clone(),
            gif_capturing: self.is_capturing_gif(),
        }
    }

    /// Notifications since the last call.
    pub fn drain_events(&mut self) -> Vec<GlobeEvent> {
        std::mem::take(&mut self.events)
    }

    // -- Accessors --

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn planet(&self) -> &Planet {
        &self.planet
    }

    pub fn moons(&self) -> &MoonRegistry {
        &self.moons
    }

    pub fn rings(&self) -> &RingSystem {
        &self.rings
    }

    pub fn clouds(&self) -> &CloudLayers {
        &self.clouds
    }

    pub fn lighting(&self) -> &LightingController {
        &self.lighting
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn sun_direction(&self) -> Vec3 {
        self.sun_direction
    }

    pub fn pending_textures(&self) -> usize {
        self.textures.in_flight()
    }

    /// Wait for in-flight texture decodes and apply them. Headless hosts only.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn flush_textures(&mut self, timeout: std::time::Duration) {
        for loaded in self.textures.drain_wait(timeout) {
            self.apply_texture(loaded);
        }
    }
}
