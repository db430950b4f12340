//! Persisted scene configuration.
//!
//! A snapshot is flat JSON keyed by a schema version. Anything that fails to
//! parse, or carries a different version, is replaced by the default
//! snapshot as a whole; partially-read state is never handed out.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::types::{Background, Color};
use crate::components::body::{BodyConfig, FineTransform};
use crate::components::clouds::CloudLayerInfo;
use crate::components::planet::PlanetKind;
use crate::components::rings::{RingConfig, RingPreset};

pub const SNAPSHOT_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is not {expected}", expected = SNAPSHOT_VERSION)]
    VersionMismatch { found: String },
    #[error("snapshot storage failed: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanetSnapshot {
    pub kind: PlanetKind,
    pub radius: f32,
    pub rotation_speed: f32,
    pub axial_tilt: f32,
    pub time_scale: f32,
    pub real_time_rotation: bool,
    pub color: Color,
    pub texture: Option<String>,
    pub transform: FineTransform,
}

impl Default for PlanetSnapshot {
    fn default() -> Self {
        let kind = PlanetKind::default();
        Self {
            kind,
            radius: 2.0,
            rotation_speed: kind.rotation_speed(),
            axial_tilt: kind.axial_tilt_deg(),
            time_scale: 1.0,
            real_time_rotation: false,
            color: Color::WHITE,
            texture: None,
            transform: FineTransform::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RingSnapshot {
    pub visible: bool,
    pub preset: RingPreset,
    pub config: RingConfig,
}

impl Default for RingSnapshot {
    fn default() -> Self {
        let mut config = RingConfig::default();
        RingPreset::Saturn.apply_to(&mut config);
        Self { visible: false, preset: RingPreset::Saturn, config }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LightingSnapshot {
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
}

impl Default for LightingSnapshot {
    fn default() -> Self {
        Self { sun_intensity: 0.4, ambient_intensity: 0.6 }
    }
}

/// Everything needed to rebuild the scene as the user left it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneSnapshot {
    pub version: String,
    /// Milliseconds since the Unix epoch, as supplied by the host.
    pub timestamp: f64,
    pub planet: PlanetSnapshot,
    pub moons: Vec<BodyConfig>,
    /// Next number handed to an auto-named custom moon.
    pub custom_moon_counter: u32,
    pub clouds: Vec<CloudLayerInfo>,
    pub rings: RingSnapshot,
    pub lighting: LightingSnapshot,
    pub background: Background,
}

impl Default for SceneSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp: 0.0,
            planet: PlanetSnapshot::default(),
            moons: Vec::new(),
            custom_moon_counter: 1,
            clouds: Vec::new(),
            rings: RingSnapshot::default(),
            lighting: LightingSnapshot::default(),
            background: Background::default(),
        }
    }
}

impl SceneSnapshot {
    /// Parse and version-check a stored snapshot.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: SceneSnapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch { found: snapshot.version });
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse `json` if there is any, falling back to defaults on any error.
    pub fn load_or_default(json: Option<&str>) -> Self {
        let Some(json) = json else {
            return Self::default();
        };
        match Self::from_json(json) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("ignoring saved scene: {e}");
                Self::default()
            }
        }
    }
}

/// Where snapshots live between sessions.
pub trait SnapshotStore {
    /// Raw stored JSON, if any.
    fn load(&self) -> Result<Option<String>, SnapshotError>;
    fn save(&self, json: &str) -> Result<(), SnapshotError>;

    /// Stored snapshot or defaults. Never fails.
    fn load_snapshot(&self) -> SceneSnapshot {
        match self.load() {
            Ok(json) => SceneSnapshot::load_or_default(json.as_deref()),
            Err(e) => {
                log::warn!("could not read saved scene: {e}");
                SceneSnapshot::default()
            }
        }
    }

    fn save_snapshot(&self, snapshot: &SceneSnapshot) -> Result<(), SnapshotError> {
        self.save(&snapshot.to_json()?)
    }
}

/// In-process store for headless hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(json: impl Into<String>) -> Self {
        Self { slot: RefCell::new(Some(json.into())) }
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, SnapshotError> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, json: &str) -> Result<(), SnapshotError> {
        *self.slot.borrow_mut() = Some(json.to_string());
        Ok(())
    }
}
