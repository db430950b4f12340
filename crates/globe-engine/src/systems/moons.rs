// systems/moons.rs
//
// Moon registry: id-keyed collection of satellite bodies sharing one anchor.
//
// Insertion order is kept for UI listings and snapshots. Removing a moon
// releases its nodes and drawable; adding an id that already exists replaces
// the old moon outright.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::types::Color;
use crate::components::body::{BodyConfig, BodyRole, CelestialBody};
use crate::core::scene::{NodeId, SceneGraph};
use crate::renderer::traits::RenderBackend;

const MOON_SEGMENTS: u32 = 32;

/// Built-in moon sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoonPreset {
    Earth,
    Jupiter,
    Saturn,
    Custom,
}

impl MoonPreset {
    pub fn moons(self) -> Vec<BodyConfig> {
        // (id, name, size, distance, orbit speed, rotation speed, retrograde, colour)
        let table: &[(&str, &str, f32, f32, f32, f32, f32, u32)] = match self {
            MoonPreset::Earth => &[("luna", "Luna", 0.27, 8.0, 1.0, 1.0, 0.0, 0xcccccc)],
            MoonPreset::Jupiter => &[
                ("io", "Io", 0.29, 6.0, 2.5, 1.0, 0.0, 0xffff99),
                ("europa", "Europa", 0.25, 8.0, 1.8, 1.0, 0.0, 0xaaccff),
                ("ganymede", "Ganymede", 0.41, 12.0, 1.2, 1.0, 0.0, 0x888888),
                ("callisto", "Callisto", 0.38, 18.0, 0.8, 1.0, 0.0, 0x444444),
            ],
            MoonPreset::Saturn => &[
                ("mimas", "Mimas", 0.12, 5.0, 3.0, 1.0, 0.0, 0xcccccc),
                ("titan", "Titan", 0.40, 25.0, 0.6, 1.0, 0.0, 0xffaa66),
                ("iapetus", "Iapetus", 0.11, 35.0, 0.3, 1.0, 180.0, 0x666666),
            ],
            MoonPreset::Custom => &[
                ("custom1", "Moon Alpha", 0.3, 7.0, 1.5, 1.5, 0.0, 0xffcccc),
                ("custom2", "Moon Beta", 0.2, 12.0, 1.0, 0.0, 90.0, 0xccffcc),
                ("custom3", "Moon Gamma", 0.15, 20.0, 0.0, 2.0, 180.0, 0xccccff),
            ],
        };
        table
            .iter()
            .map(|&(id, name, size, distance, orbit, spin, retro, color)| {
                BodyConfig::new(id, name)
                    .with_size(size)
                    .with_distance(distance)
                    .with_orbit_speed(orbit)
                    .with_rotation_speed(spin)
                    .with_retrograde(retro)
                    .with_color(Color(color))
                    .with_phase(scatter_phase(id))
            })
            .collect()
    }
}

/// Deterministic starting angle in [0, 2π) so preset moons don't line up.
pub fn scatter_phase(id: &str) -> f64 {
    let mut n: u32 = 0x9e37_79b9;
    for byte in id.bytes() {
        n = n.wrapping_mul(2654435761) ^ byte as u32;
        n ^= n >> 16;
        n = n.wrapping_mul(2246822519);
        n ^= n >> 13;
    }
    (n as f64 / u32::MAX as f64) * std::f64::consts::TAU
}

/// Per-moon summary for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonInfo {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub size: f32,
    pub distance: f32,
    pub orbit_speed: f32,
    pub rotation_speed: f32,
    pub retrograde_angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonSystemInfo {
    pub total: usize,
    pub visible: usize,
    pub moons: Vec<MoonInfo>,
}

#[derive(Debug)]
pub struct MoonRegistry {
    /// Shared parent of every moon pivot.
    anchor: NodeId,
    moons: HashMap<String, CelestialBody>,
    order: Vec<String>,
    next_serial: u64,
}

impl MoonRegistry {
    pub fn new(anchor: NodeId) -> Self {
        Self {
            anchor,
            moons: HashMap::new(),
            order: Vec::new(),
            next_serial: 1,
        }
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    /// Create a moon. Replaces any moon with the same id.
    pub fn add<B: RenderBackend>(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut B,
        config: BodyConfig,
    ) -> &mut CelestialBody {
        let id = config.id.clone();
        if self.remove(graph, backend, &id) {
            log::debug!("moon '{id}' replaced");
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        let body = CelestialBody::spawn(graph, backend, self.anchor, config, BodyRole::Satellite, serial, MOON_SEGMENTS);
        self.order.push(id.clone());
        self.moons.entry(id).or_insert(body)
    }

    /// Destroy a moon. Returns false if the id is unknown.
    pub fn remove<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, id: &str) -> bool {
        match self.moons.remove(id) {
            Some(body) => {
                body.release(graph, backend);
                self.order.retain(|o| o != id);
                true
            }
            None => false,
        }
    }

    pub fn clear<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B) {
        for id in std::mem::take(&mut self.order) {
            if let Some(body) = self.moons.remove(&id) {
                body.release(graph, backend);
            }
        }
    }

    /// Replace the whole set with a preset.
    pub fn load_preset<B: RenderBackend>(&mut self, graph: &mut SceneGraph, backend: &mut B, preset: MoonPreset) {
        self.clear(graph, backend);
        for config in preset.moons() {
            self.add(graph, backend, config);
        }
        log::info!("moon preset {preset:?} loaded ({} moons)", self.len());
    }

    pub fn get(&self, id: &str) -> Option<&CelestialBody> {
        self.moons.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CelestialBody> {
        self.moons.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.moons.contains_key(id)
    }

    pub fn show(&mut self, graph: &mut SceneGraph, id: &str) -> bool {
        match self.moons.get_mut(id) {
            Some(body) => {
                body.show(graph);
                true
            }
            None => false,
        }
    }

    pub fn hide(&mut self, graph: &mut SceneGraph, id: &str) -> bool {
        match self.moons.get_mut(id) {
            Some(body) => {
                body.hide(graph);
                true
            }
            None => false,
        }
    }

    pub fn show_all(&mut self, graph: &mut SceneGraph) {
        for body in self.moons.values_mut() {
            body.show(graph);
        }
    }

    pub fn hide_all(&mut self, graph: &mut SceneGraph) {
        for body in self.moons.values_mut() {
            body.hide(graph);
        }
    }

    /// Advance every moon, visible or not.
    pub fn update(&mut self, graph: &mut SceneGraph, dt_ms: f64) {
        for id in &self.order {
            if let Some(body) = self.moons.get_mut(id) {
                body.update(graph, dt_ms);
            }
        }
    }

    /// Moons in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CelestialBody> + '_ {
        self.order.iter().filter_map(|id| self.moons.get(id))
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn configs(&self) -> Vec<BodyConfig> {
        self.iter().map(|b| b.config().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.moons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moons.is_empty()
    }

    pub fn visible_count(&self) -> usize {
        self.moons.values().filter(|b| b.is_visible()).count()
    }

    pub fn info(&self) -> MoonSystemInfo {
        MoonSystemInfo {
            total: self.len(),
            visible: self.visible_count(),
            moons: self
                .iter()
                .map(|b| {
                    let c = b.config();
                    MoonInfo {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        visible: c.visible,
                        size: c.size,
                        distance: c.distance,
                        orbit_speed: c.orbit_speed,
                        rotation_speed: c.rotation_speed,
                        retrograde_angle: c.retrograde_angle,
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessBackend;

    fn setup() -> (SceneGraph, HeadlessBackend, MoonRegistry) {
        let mut graph = SceneGraph::new();
        let anchor = graph.spawn("moons");
        graph.attach(anchor, graph.root());
        (graph, HeadlessBackend::new(), MoonRegistry::new(anchor))
    }

    #[test]
    fn add_and_remove() {
        let (mut graph, mut backend, mut moons) = setup();
        moons.add(&mut graph, &mut backend, BodyConfig::new("m1", "One"));
        assert!(moons.contains("m1"));
        assert_eq!(backend.live_drawables(), 1);
        assert!(moons.remove(&mut graph, &mut backend, "m1"));
        assert!(!moons.remove(&mut graph, &mut backend, "m1"));
        assert!(moons.is_empty());
        assert_eq!(backend.live_drawables(), 0);
        assert!(graph.children(moons.anchor()).is_empty());
    }

    #[test]
    fn remove_then_add_same_id_is_fresh() {
        let (mut graph, mut backend, mut moons) = setup();
        let config = BodyConfig::new("m1", "One").with_orbit_speed(1.0);
        moons.add(&mut graph, &mut backend, config.clone());
        moons.update(&mut graph, 1000.0);
        let old_serial = moons.get("m1").unwrap().serial();

        moons.remove(&mut graph, &mut backend, "m1");
        moons.add(&mut graph, &mut backend, config);
        let fresh = moons.get("m1").unwrap();
        assert_ne!(fresh.serial(), old_serial);
        assert_eq!(fresh.orbit_angle(), 0.0);
        assert_eq!(moons.len(), 1);
        assert_eq!(moons.ids(), &["m1".to_string()]);
    }

    #[test]
    fn duplicate_add_replaces() {
        let (mut graph, mut backend, mut moons) = setup();
        moons.add(&mut graph, &mut backend, BodyConfig::new("m1", "One").with_size(0.2));
        moons.add(&mut graph, &mut backend, BodyConfig::new("m1", "One").with_size(0.5));
        assert_eq!(moons.len(), 1);
        assert_eq!(moons.ids().len(), 1);
        assert_eq!(moons.get("m1").unwrap().config().size, 0.5);
        assert_eq!(backend.live_drawables(), 1);
    }

    #[test]
    fn show_hide_unknown_id() {
        let (mut graph, _backend, mut moons) = setup();
        assert!(!moons.show(&mut graph, "ghost"));
        assert!(!moons.hide(&mut graph, "ghost"));
    }

    #[test]
    fn hide_all_then_show_all() {
        let (mut graph, mut backend, mut moons) = setup();
        moons.load_preset(&mut graph, &mut backend, MoonPreset::Jupiter);
        moons.hide_all(&mut graph);
        assert_eq!(moons.visible_count(), 0);
        assert!(graph.children(moons.anchor()).is_empty());
        moons.show_all(&mut graph);
        assert_eq!(moons.visible_count(), 4);
        assert_eq!(graph.children(moons.anchor()).len(), 4);
    }

    #[test]
    fn preset_replaces_not_merges() {
        let (mut graph, mut backend, mut moons) = setup();
        moons.add(&mut graph, &mut backend, BodyConfig::new("mine", "Mine"));
        moons.load_preset(&mut graph, &mut backend, MoonPreset::Saturn);
        assert!(!moons.contains("mine"));
        assert_eq!(moons.ids(), &["mimas", "titan", "iapetus"].map(String::from));
        moons.load_preset(&mut graph, &mut backend, MoonPreset::Earth);
        assert_eq!(moons.len(), 1);
        assert!(moons.contains("luna"));
        assert_eq!(backend.live_drawables(), 1);
    }

    #[test]
    fn iapetus_orbits_backwards() {
        let (mut graph, mut backend, mut moons) = setup();
        moons.load_preset(&mut graph, &mut backend, MoonPreset::Saturn);
        let start = moons.get("iapetus").unwrap().orbit_angle();
        moons.update(&mut graph, 1000.0);
        let end = moons.get("iapetus").unwrap().orbit_angle();
        assert!((end - start + 0.3).abs() < 1e-6);
    }

    #[test]
    fn hidden_moons_keep_orbiting() {
        let (mut graph, mut backend, mut moons) = setup();
        moons.add(&mut graph, &mut backend, BodyConfig::new("m1", "One").with_orbit_speed(2.0));
        moons.hide(&mut graph, "m1");
        moons.update(&mut graph, 500.0);
        moons.show(&mut graph, "m1");
        assert!((moons.get("m1").unwrap().orbit_angle() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scatter_phase_is_stable_and_bounded() {
        for id in ["io", "europa", "luna", ""] {
            let p = scatter_phase(id);
            assert_eq!(p, scatter_phase(id));
            assert!((0.0..=std::f64::consts::TAU).contains(&p));
        }
        assert_ne!(scatter_phase("io"), scatter_phase("europa"));
    }

    #[test]
    fn info_lists_in_order() {
        let (mut graph, mut backend, mut moons) = setup();
        moons.load_preset(&mut graph, &mut backend, MoonPreset::Custom);
        moons.hide(&mut graph, "custom2");
        let info = moons.info();
        assert_eq!(info.total, 3);
        assert_eq!(info.visible, 2);
        assert_eq!(info.moons[1].name, "Moon Beta");
        assert!(!info.moons[1].visible);
    }
}
