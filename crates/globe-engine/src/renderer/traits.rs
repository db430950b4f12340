//! Render backend contract.
//!
//! The scene core never draws anything itself. It creates drawables, binds
//! them to scene nodes, pushes material uniforms, and once per frame hands
//! the backend a resolved [`FrameView`]. The browser build forwards all of
//! this over the JS bridge; tests use the headless backend.

use glam::{Mat4, Vec3};
use serde::Serialize;
use thiserror::Error;

use super::geometry::RingGeometry;
use crate::api::types::{Background, Color, DrawableId, TextureId};
use crate::assets::texture::DecodedImage;
use crate::core::scene::DrawItem;

/// Shape of a drawable's mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Primitive {
    Sphere { radius: f32, segments: u32 },
    Ring { geometry: RingGeometry },
}

/// Which shader family a drawable uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MaterialKind {
    /// Lit surface with optional colour map.
    Surface { color: Color, shininess: f32 },
    /// Translucent cloud shell with sun-aware scattering.
    Cloud,
    /// Double-sided radial-UV ring band.
    Ring { color: Color, opacity: f32 },
}

/// Everything a backend needs to create a drawable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawableDesc {
    /// Human-readable tag for logs and debugging tools.
    pub label: String,
    pub primitive: Primitive,
    pub material: MaterialKind,
}

/// A value for a named material uniform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Color(Color),
    Bool(bool),
    /// `None` unbinds the slot.
    Texture(Option<TextureId>),
}

/// Per-frame state resolved by the scene core.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView<'a> {
    /// Camera local-to-world matrix (the view matrix is its inverse).
    pub camera_world: Mat4,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    /// Every drawable reachable from the scene root, with its world matrix.
    pub items: &'a [DrawItem],
    /// Unit vector from the scene origin towards the sun.
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
    pub background: &'a Background,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("backend rejected drawable '{label}': {reason}")]
    DrawableRejected { label: String, reason: String },
    #[error("texture upload failed ({width}x{height}): {reason}")]
    TextureRejected { width: u32, height: u32, reason: String },
}

/// Contract for anything that can display the scene.
///
/// Implementations own all GPU (or bridge) resources; the scene core only
/// holds the ids they hand out. Destroying an unknown id is a no-op.
pub trait RenderBackend {
    /// What a single captured frame looks like (pixels, a frame number, ...).
    type Frame;

    /// Allocate a drawable. On error nothing is allocated.
    fn create_drawable(&mut self, desc: &DrawableDesc) -> Result<DrawableId, BackendError>;

    /// Release a drawable and everything it owns.
    fn destroy_drawable(&mut self, id: DrawableId);

    /// Set one named uniform on a drawable's material.
    fn set_uniform(&mut self, id: DrawableId, name: &'static str, value: UniformValue);

    /// Upload decoded RGBA pixels and return a handle for `UniformValue::Texture`.
    fn upload_texture(&mut self, image: &DecodedImage) -> Result<TextureId, BackendError>;

    /// Draw one frame.
    fn render(&mut self, frame: &FrameView<'_>);

    /// Grab the most recently rendered frame, if the backend supports it.
    fn capture_frame(&mut self) -> Option<Self::Frame>;
}
