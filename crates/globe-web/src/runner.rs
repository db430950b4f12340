use globe_engine::{
    AnimationLoop, BridgeBackend, FrameScheduler, Globe, GlobeConfig, SceneCommand, SceneSnapshot,
    SnapshotStore, TextureId, TextureTarget,
};

/// Wires a [`Globe`] to a frame scheduler and a snapshot store.
///
/// The web crate keeps one of these in a `thread_local!` and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct WebRunner<S: FrameScheduler, T: SnapshotStore> {
    globe: Globe<BridgeBackend>,
    frame_loop: AnimationLoop<S>,
    store: T,
}

impl<S: FrameScheduler, T: SnapshotStore> WebRunner<S, T> {
    pub fn new(config: GlobeConfig, scheduler: S, store: T) -> Self {
        Self {
            globe: Globe::new(BridgeBackend::new(), config),
            frame_loop: AnimationLoop::new(scheduler),
            store,
        }
    }

    pub fn globe(&self) -> &Globe<BridgeBackend> {
        &self.globe
    }

    pub fn globe_mut(&mut self) -> &mut Globe<BridgeBackend> {
        &mut self.globe
    }

    pub fn frame_loop(&self) -> &AnimationLoop<S> {
        &self.frame_loop
    }

    // ---- Loop ----

    /// Start the loop. The first frame after a (re)start has Δt = 0.
    pub fn start(&mut self) -> bool {
        if !self.frame_loop.start() {
            return false;
        }
        self.globe.reset_clock();
        true
    }

    pub fn stop(&mut self) -> bool {
        self.frame_loop.stop()
    }

    /// Called from the scheduler's callback with the display timestamp.
    pub fn on_animation_frame(&mut self, now_ms: f64) {
        if self.frame_loop.on_frame() {
            self.globe.tick(now_ms);
        }
    }

    /// Host-driven tick, for pages that run their own rAF loop.
    pub fn tick(&mut self, now_ms: f64) {
        self.globe.tick(now_ms);
    }

    // ---- Input ----

    /// Queue a JSON-encoded [`SceneCommand`]. Returns false if it does not parse.
    pub fn push_command_json(&mut self, json: &str) -> bool {
        match SceneCommand::from_json(json) {
            Ok(command) => {
                self.globe.push_command(command);
                true
            }
            Err(e) => {
                log::warn!("ignoring command {json}: {e}");
                false
            }
        }
    }

    /// Queue image bytes for a named slot: `planet`, `planetBump`,
    /// `planetSpecular`, `rings`, `ringsAlpha`, `clouds:<layer>` or
    /// `cloudDensity:<layer>`.
    pub fn load_texture(&mut self, slot: &str, bytes: Vec<u8>) -> bool {
        match parse_slot(slot) {
            Some(target) => {
                self.globe.load_texture(target, bytes);
                true
            }
            None => {
                log::warn!("unknown texture slot {slot:?}");
                false
            }
        }
    }

    pub fn load_moon_texture(&mut self, id: &str, bytes: Vec<u8>) -> bool {
        self.globe.load_moon_texture(id, bytes)
    }

    // ---- Read-backs ----

    pub fn info_json(&self) -> String {
        to_json(&self.globe.info())
    }

    pub fn events_json(&mut self) -> String {
        to_json(&self.globe.drain_events())
    }

    pub fn bridge_commands_json(&mut self) -> String {
        self.globe.backend_mut().drain_commands_json()
    }

    pub fn frame_buffer_ptr(&self) -> *const f32 {
        self.globe.backend().frame_buffer_ptr()
    }

    pub fn frame_buffer_len(&self) -> u32 {
        self.globe.backend().frame_buffer_len() as u32
    }

    pub fn texture_pixels(&self, id: u32) -> Option<&[u8]> {
        self.globe.backend().texture_pixels(TextureId(id))
    }

    pub fn release_texture_pixels(&mut self, id: u32) -> bool {
        self.globe.backend_mut().release_texture_pixels(TextureId(id))
    }

    // ---- Export ----

    pub fn screenshot(&mut self) -> Option<u32> {
        self.globe.screenshot()
    }

    pub fn start_gif_capture(&mut self) -> bool {
        self.globe.start_gif_capture()
    }

    pub fn take_gif_frames(&mut self) -> Vec<u32> {
        self.globe.take_gif_frames()
    }

    // ---- Persistence ----

    /// Apply the stored scene, if there is one. A stored scene from another
    /// schema version restores the defaults.
    pub fn restore(&mut self) -> bool {
        match self.store.load() {
            Ok(Some(json)) => {
                self.globe.apply_snapshot(SceneSnapshot::load_or_default(Some(&json)));
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("could not read saved scene: {e}");
                false
            }
        }
    }

    pub fn save(&self, timestamp: f64) -> bool {
        match self.store.save_snapshot(&self.globe.snapshot(timestamp)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("could not save scene: {e}");
                false
            }
        }
    }
}

fn parse_slot(slot: &str) -> Option<TextureTarget> {
    match slot {
        "planet" => Some(TextureTarget::PlanetSurface),
        "planetBump" => Some(TextureTarget::PlanetBump),
        "planetSpecular" => Some(TextureTarget::PlanetSpecular),
        "rings" => Some(TextureTarget::RingSurface),
        "ringsAlpha" => Some(TextureTarget::RingAlpha),
        _ => {
            let (prefix, name) = slot.split_once(':')?;
            if name.is_empty() {
                return None;
            }
            match prefix {
                "clouds" => Some(TextureTarget::CloudLayer(name.to_string())),
                "cloudDensity" => Some(TextureTarget::CloudDensity(name.to_string())),
                _ => None,
            }
        }
    }
}

fn to_json<V: serde::Serialize>(value: &V) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("serialization failed: {e}");
        "null".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use globe_engine::{ManualScheduler, MemoryStore, SNAPSHOT_VERSION};

    fn runner() -> WebRunner<ManualScheduler, MemoryStore> {
        WebRunner::new(GlobeConfig::default(), ManualScheduler::new(), MemoryStore::new())
    }

    #[test]
    fn frames_tick_only_while_running() {
        let mut r = runner();
        r.on_animation_frame(16.0);
        assert_eq!(r.globe().backend().frame_counter(), 0);

        assert!(r.start());
        assert!(!r.start());
        r.on_animation_frame(32.0);
        assert_eq!(r.globe().backend().frame_counter(), 1);

        assert!(r.stop());
        r.on_animation_frame(48.0);
        assert_eq!(r.globe().backend().frame_counter(), 1);
        assert!(!r.frame_loop().has_pending_frame());
    }

    #[test]
    fn restart_does_not_jump() {
        let mut r = runner();
        r.push_command_json(r#"{ "type": "addMoon", "config": { "id": "m1", "size": 0.3, "distance": 8, "orbitSpeed": 1 } }"#);
        r.start();
        r.on_animation_frame(1000.0);
        r.on_animation_frame(1100.0);
        r.stop();
        r.start();
        // a minute later: the first frame after the restart has no delta
        r.on_animation_frame(61_100.0);
        let angle = r.globe().moons().get("m1").unwrap().orbit_angle();
        assert!((angle - 0.1).abs() < 1e-9);
    }

    #[test]
    fn bad_command_json_is_rejected() {
        let mut r = runner();
        assert!(!r.push_command_json("{ not json"));
        assert!(r.push_command_json(r#"{ "type": "toggleRings" }"#));
        r.tick(0.0);
        assert!(r.globe().rings().is_visible());
    }

    #[test]
    fn texture_slots() {
        assert_eq!(parse_slot("planet"), Some(TextureTarget::PlanetSurface));
        assert_eq!(parse_slot("clouds:high"), Some(TextureTarget::CloudLayer("high".into())));
        assert_eq!(parse_slot("cloudDensity:high"), Some(TextureTarget::CloudDensity("high".into())));
        assert_eq!(parse_slot("planetBump"), Some(TextureTarget::PlanetBump));
        assert_eq!(parse_slot("planetSpecular"), Some(TextureTarget::PlanetSpecular));
        assert_eq!(parse_slot("clouds:"), None);
        assert_eq!(parse_slot("sky:high"), None);
        assert_eq!(parse_slot("sky"), None);
    }

    #[test]
    fn save_then_restore() {
        let mut r = runner();
        assert!(!r.restore());
        r.push_command_json(r#"{ "type": "setRingsVisible", "visible": true }"#);
        r.tick(0.0);
        assert!(r.save(1.0));

        let saved = r.store.load().unwrap().unwrap();
        assert!(saved.contains(SNAPSHOT_VERSION));

        let mut fresh = WebRunner::new(GlobeConfig::default(), ManualScheduler::new(), MemoryStore::with_json(saved));
        assert!(!fresh.globe().rings().is_visible());
        assert!(fresh.restore());
        assert!(fresh.globe().rings().is_visible());
    }

    #[test]
    fn info_is_json() {
        let r = runner();
        let info: serde_json::Value = serde_json::from_str(&r.info_json()).unwrap();
        assert_eq!(info["planet"]["radius"], 2.0);
    }
}
