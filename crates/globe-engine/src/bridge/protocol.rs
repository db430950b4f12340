/// Wire protocol between the scene core and the JS renderer.
/// Must stay in sync with TypeScript `protocol.ts`.
///
/// Resource changes (create/destroy drawables, uniforms, textures) are
/// queued as JSON commands and fetched once per frame. Per-frame state is a
/// flat f32 buffer the JS side reads through a pointer into wasm memory.
///
/// Frame buffer layout (all values f32):
/// ```text
/// [Header: 8 floats]
/// [Camera: 17 floats]   camera world matrix (column-major) + fov in degrees
/// [Items: count × 17 floats]   drawable id + world matrix (column-major)
/// ```

use std::collections::HashMap;

use serde::Serialize;

use crate::api::types::{Background, DrawableId, TextureId};
use crate::assets::texture::DecodedImage;
use crate::renderer::traits::{BackendError, DrawableDesc, FrameView, RenderBackend, UniformValue};

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 8;

/// Header field indices.
pub const HEADER_PROTOCOL_VERSION: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_ITEM_COUNT: usize = 2;
pub const HEADER_SUN_X: usize = 3;
pub const HEADER_SUN_Y: usize = 4;
pub const HEADER_SUN_Z: usize = 5;
pub const HEADER_SUN_INTENSITY: usize = 6;
pub const HEADER_AMBIENT_INTENSITY: usize = 7;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats in the camera section: 4×4 matrix + fov.
pub const CAMERA_FLOATS: usize = 17;

/// Floats per draw item: id + 4×4 matrix (wire format, never changes).
pub const ITEM_FLOATS: usize = 17;

/// Offset (in floats) where item data begins.
pub const ITEM_DATA_OFFSET: usize = HEADER_FLOATS + CAMERA_FLOATS;

/// Resource commands for the JS renderer, in the order they were issued.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BridgeCommand {
    CreateDrawable { id: DrawableId, desc: DrawableDesc },
    DestroyDrawable { id: DrawableId },
    SetUniform { id: DrawableId, name: &'static str, value: UniformValue },
    /// Pixels are fetched separately with [`BridgeBackend::texture_pixels`].
    UploadTexture { id: TextureId, width: u32, height: u32 },
    SetBackground { background: Background },
    CaptureFrame { frame: u32 },
}

/// Render backend that forwards everything to JS.
#[derive(Debug)]
pub struct BridgeBackend {
    commands: Vec<BridgeCommand>,
    buffer: Vec<f32>,
    textures: HashMap<TextureId, DecodedImage>,
    next_drawable: u32,
    next_texture: u32,
    frame: u32,
    last_background: Option<Background>,
    max_texture_size: u32,
}

impl Default for BridgeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeBackend {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(64),
            buffer: vec![0.0; ITEM_DATA_OFFSET],
            textures: HashMap::new(),
            next_drawable: 1,
            next_texture: 1,
            frame: 0,
            last_background: None,
            max_texture_size: 8192,
        }
    }

    /// Largest texture edge the JS side accepts (WebGL MAX_TEXTURE_SIZE).
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size.max(1);
        self
    }

    /// Serialize and clear pending resource commands.
    pub fn drain_commands_json(&mut self) -> String {
        let commands = std::mem::take(&mut self.commands);
        serde_json::to_string(&commands).unwrap_or_else(|e| {
            log::error!("bridge commands dropped: {e}");
            "[]".to_string()
        })
    }

    pub fn pending_commands(&self) -> &[BridgeCommand] {
        &self.commands
    }

    pub fn frame_buffer(&self) -> &[f32] {
        &self.buffer
    }

    pub fn frame_buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    pub fn frame_buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// RGBA pixels of an uploaded texture. JS copies them once, then calls
    /// [`release_texture_pixels`](Self::release_texture_pixels).
    pub fn texture_pixels(&self, id: TextureId) -> Option<&[u8]> {
        self.textures.get(&id).map(|t| t.rgba.as_slice())
    }

    pub fn release_texture_pixels(&mut self, id: TextureId) -> bool {
        self.textures.remove(&id).is_some()
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame
    }

    fn write_frame(&mut self, view: &FrameView<'_>) {
        let total = ITEM_DATA_OFFSET + view.items.len() * ITEM_FLOATS;
        self.buffer.clear();
        self.buffer.resize(total, 0.0);

        let header = &mut self.buffer[..HEADER_FLOATS];
        header[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        header[HEADER_FRAME_COUNTER] = self.frame as f32;
        header[HEADER_ITEM_COUNT] = view.items.len() as f32;
        header[HEADER_SUN_X] = view.sun_direction.x;
        header[HEADER_SUN_Y] = view.sun_direction.y;
        header[HEADER_SUN_Z] = view.sun_direction.z;
        header[HEADER_SUN_INTENSITY] = view.sun_intensity;
        header[HEADER_AMBIENT_INTENSITY] = view.ambient_intensity;

        let camera = &mut self.buffer[HEADER_FLOATS..ITEM_DATA_OFFSET];
        camera[..16].copy_from_slice(&view.camera_world.to_cols_array());
        camera[16] = view.fov_deg;

        for (i, item) in view.items.iter().enumerate() {
            let base = ITEM_DATA_OFFSET + i * ITEM_FLOATS;
            self.buffer[base] = item.drawable.0 as f32;
            self.buffer[base + 1..base + ITEM_FLOATS].copy_from_slice(&item.world.to_cols_array());
        }
    }
}

impl RenderBackend for BridgeBackend {
    /// Frame number; the JS side reads the canvas for that frame.
    type Frame = u32;

    fn create_drawable(&mut self, desc: &DrawableDesc) -> Result<DrawableId, BackendError> {
        let id = DrawableId(self.next_drawable);
        self.next_drawable += 1;
        self.commands.push(BridgeCommand::CreateDrawable { id, desc: desc.clone() });
        Ok(id)
    }

    fn destroy_drawable(&mut self, id: DrawableId) {
        self.commands.push(BridgeCommand::DestroyDrawable { id });
    }

    fn set_uniform(&mut self, id: DrawableId, name: &'static str, value: UniformValue) {
        self.commands.push(BridgeCommand::SetUniform { id, name, value });
    }

    fn upload_texture(&mut self, image: &DecodedImage) -> Result<TextureId, BackendError> {
        let (width, height) = (image.width, image.height);
        if width == 0 || height == 0 || width > self.max_texture_size || height > self.max_texture_size {
            return Err(BackendError::TextureRejected {
                width,
                height,
                reason: format!("size must be within 1..={}", self.max_texture_size),
            });
        }
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, image.clone());
        self.commands.push(BridgeCommand::UploadTexture { id, width, height });
        Ok(id)
    }

    fn render(&mut self, view: &FrameView<'_>) {
        self.frame = self.frame.wrapping_add(1);
        if self.last_background.as_ref() != Some(view.background) {
            self.last_background = Some(view.background.clone());
            self.commands.push(BridgeCommand::SetBackground { background: view.background.clone() });
        }
        self.write_frame(view);
    }

    fn capture_frame(&mut self) -> Option<u32> {
        if self.frame == 0 {
            return None;
        }
        self.commands.push(BridgeCommand::CaptureFrame { frame: self.frame });
        Some(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::DrawItem;
    use crate::renderer::traits::{MaterialKind, Primitive};
    use glam::{Mat4, Vec3};

    fn sphere() -> DrawableDesc {
        DrawableDesc {
            label: "luna".into(),
            primitive: Primitive::Sphere { radius: 1.0, segments: 32 },
            material: MaterialKind::Cloud,
        }
    }

    #[test]
    fn layout_offsets() {
        assert_eq!(ITEM_DATA_OFFSET, 25);
        assert_eq!(HEADER_AMBIENT_INTENSITY, HEADER_FLOATS - 1);
    }

    #[test]
    fn frame_buffer_contents() {
        let mut backend = BridgeBackend::new();
        let id = backend.create_drawable(&sphere()).unwrap();
        let items = [DrawItem { drawable: id, world: Mat4::from_translation(Vec3::new(8.0, 0.0, 0.0)) }];
        let background = Background::Black;
        backend.render(&FrameView {
            camera_world: Mat4::IDENTITY,
            fov_deg: 25.0,
            items: &items,
            sun_direction: Vec3::Z,
            sun_intensity: 0.4,
            ambient_intensity: 0.6,
            background: &background,
        });

        let buf = backend.frame_buffer();
        assert_eq!(buf.len(), ITEM_DATA_OFFSET + ITEM_FLOATS);
        assert_eq!(buf[HEADER_PROTOCOL_VERSION], PROTOCOL_VERSION);
        assert_eq!(buf[HEADER_FRAME_COUNTER], 1.0);
        assert_eq!(buf[HEADER_ITEM_COUNT], 1.0);
        assert_eq!(buf[HEADER_SUN_Z], 1.0);
        assert_eq!(buf[HEADER_FLOATS + 16], 25.0);
        assert_eq!(buf[ITEM_DATA_OFFSET], id.0 as f32);
        // translation lives in the last column
        assert_eq!(buf[ITEM_DATA_OFFSET + 1 + 12], 8.0);
    }

    #[test]
    fn commands_drain_as_json() {
        let mut backend = BridgeBackend::new();
        let id = backend.create_drawable(&sphere()).unwrap();
        backend.set_uniform(id, "opacity", UniformValue::Float(0.5));
        backend.destroy_drawable(id);
        let json = backend.drain_commands_json();
        assert!(json.starts_with("[{\"op\":\"createDrawable\""));
        assert!(json.contains("\"op\":\"setUniform\""));
        assert!(json.contains("\"op\":\"destroyDrawable\""));
        assert!(backend.pending_commands().is_empty());
        assert_eq!(backend.drain_commands_json(), "[]");
    }

    #[test]
    fn background_sent_only_on_change() {
        let mut backend = BridgeBackend::new();
        let background = Background::Starfield;
        let view = FrameView {
            camera_world: Mat4::IDENTITY,
            fov_deg: 25.0,
            items: &[],
            sun_direction: Vec3::Z,
            sun_intensity: 0.4,
            ambient_intensity: 0.6,
            background: &background,
        };
        backend.render(&view);
        backend.render(&view);
        let sets = backend
            .pending_commands()
            .iter()
            .filter(|c| matches!(c, BridgeCommand::SetBackground { .. }))
            .count();
        assert_eq!(sets, 1);
    }

    #[test]
    fn texture_pixels_kept_until_released() {
        let mut backend = BridgeBackend::new().with_max_texture_size(64);
        let image = DecodedImage { width: 2, height: 1, rgba: vec![255; 8] };
        let id = backend.upload_texture(&image).unwrap();
        assert_eq!(backend.texture_pixels(id).map(<[u8]>::len), Some(8));
        assert!(backend.release_texture_pixels(id));
        assert!(backend.texture_pixels(id).is_none());

        let huge = DecodedImage { width: 128, height: 1, rgba: vec![0; 512] };
        assert!(backend.upload_texture(&huge).is_err());
    }

    #[test]
    fn capture_needs_a_rendered_frame() {
        let mut backend = BridgeBackend::new();
        assert_eq!(backend.capture_frame(), None);
    }
}
