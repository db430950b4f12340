use serde::{Deserialize, Serialize};

use crate::api::types::{Background, Color};
use crate::components::body::BodyConfig;
use crate::components::clouds::CloudParam;
use crate::components::planet::PlanetKind;
use crate::components::rings::RingPreset;
use crate::systems::moons::MoonPreset;

/// Everything the UI can ask of the scene.
/// Commands are queued from event handlers and applied at the start of the next frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SceneCommand {
    // -- Planet --
    SetPlanetKind { kind: PlanetKind },
    SetPlanetSize { size: f32 },
    SetPlanetRotationSpeed { speed: f32 },
    SetPlanetColor { color: Color },
    SetTimeScale { scale: f32 },
    SetRealTimeRotation { enabled: bool },

    // -- Moons --
    AddMoon { config: BodyConfig },
    /// Add a moon with an auto-generated id and default parameters.
    AddCustomMoon,
    RemoveMoon { id: String },
    ShowMoon { id: String },
    HideMoon { id: String },
    ShowAllMoons,
    HideAllMoons,
    LoadMoonPreset { preset: MoonPreset },
    SetMoonName { id: String, name: String },
    SetMoonSize { id: String, size: f32 },
    SetMoonDistance { id: String, distance: f32 },
    SetMoonOrbitSpeed { id: String, speed: f32 },
    SetMoonRotationSpeed { id: String, speed: f32 },
    SetMoonRetrograde { id: String, degrees: f32 },
    SetMoonColor { id: String, color: Color },
    SetMoonPosition { id: String, position: [f32; 3] },
    /// Degrees, XYZ order.
    SetMoonRotation { id: String, rotation: [f32; 3] },
    SetMoonScale { id: String, scale: [f32; 3] },
    ResetMoonTransform { id: String },

    // -- Rings --
    SetRingsVisible { visible: bool },
    ToggleRings,
    LoadRingPreset { preset: RingPreset },
    SetRingInnerRadius { radius: f32 },
    SetRingOuterRadius { radius: f32 },
    SetRingRadii { inner: f32, outer: f32 },
    SetRingThickness { thickness: f32 },
    SetRingDetail { segments: u32 },
    SetRingOpacity { opacity: f32 },
    SetRingColor { color: Color },
    SetRingRotationSpeed { speed: f32 },

    // -- Clouds --
    AddCloudLayer { name: String, altitude: f32, rotation_speed: f32 },
    RemoveCloudLayer { name: String },
    /// `layer: None` adjusts every layer.
    ConfigureClouds { layer: Option<String>, param: CloudParam },
    SetCloudAltitude { name: String, altitude: f32 },
    SetCloudRotationSpeed { name: String, speed: f32 },

    // -- Lighting, view, export --
    SetSunIntensity { intensity: f32 },
    SetAmbientIntensity { intensity: f32 },
    SetBackground { background: Background },
    /// Azimuth and elevation in radians.
    SetCameraOrbit { distance: f32, azimuth: f32, elevation: f32 },
    StartGifCapture,
}

impl SceneCommand {
    /// Parse a single command sent by the host.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A queue of scene commands.
/// The host writes commands into the queue; the frame loop drains it once per tick.
#[derive(Debug)]
pub struct CommandQueue {
    commands: Vec<SceneCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, command: SceneCommand) {
        self.commands.push(command);
    }

    /// Drain all pending commands. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
