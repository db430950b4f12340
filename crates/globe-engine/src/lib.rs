pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod bridge;
pub mod input;
pub mod assets;
pub mod extensions;

// Re-export key types at crate root for convenience
pub use api::globe::{Globe, GlobeInfo, PlanetInfo, LightingInfo, CameraInfo, DEFAULT_CLOUD_LAYER};
pub use api::config::GlobeConfig;
pub use api::types::{DrawableId, TextureId, Color, Background, LightingMode, GlobeEvent};
pub use core::scene::{SceneGraph, NodeId, LocalTransform, DrawItem};
pub use core::time::FrameClock;
pub use core::frame_loop::{AnimationLoop, FrameScheduler, ManualScheduler};
pub use components::body::{BodyConfig, BodyRole, CelestialBody, FineTransform};
pub use components::planet::{Planet, PlanetKind};
pub use components::clouds::{CloudLayers, CloudLayerInfo, CloudParam, CloudUniforms};
pub use components::rings::{RingSystem, RingConfig, RingPreset, RingInfo};
pub use systems::moons::{MoonRegistry, MoonPreset, MoonInfo, MoonSystemInfo};
pub use systems::lighting::LightingController;
pub use renderer::geometry::{RingGeometry, RingVertex, GeometryError};
pub use renderer::headless::HeadlessBackend;
pub use renderer::traits::{RenderBackend, FrameView, DrawableDesc, Primitive, MaterialKind, UniformValue, BackendError};
pub use input::queue::{SceneCommand, CommandQueue};
pub use assets::snapshot::{SceneSnapshot, SnapshotStore, SnapshotError, MemoryStore, SNAPSHOT_VERSION};
pub use assets::texture::{TextureLoader, TextureTarget, TextureError, DecodedImage};
pub use bridge::protocol::{BridgeBackend, BridgeCommand};

// Extensions: animation helpers
pub use extensions::{Easing, lerp, ease, ease_quat, TweenState, Tween, TweenId, TweenTarget};
