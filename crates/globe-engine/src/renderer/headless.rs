use std::collections::HashMap;

use glam::Vec3;

use super::traits::{BackendError, DrawableDesc, FrameView, RenderBackend, UniformValue};
use crate::api::types::{DrawableId, TextureId};
use crate::assets::texture::DecodedImage;
use crate::core::scene::DrawItem;

/// A drawable as the headless backend remembers it.
#[derive(Debug, Clone)]
pub struct HeadlessDrawable {
    pub desc: DrawableDesc,
    pub uniforms: HashMap<&'static str, UniformValue>,
}

/// In-memory backend: records what it was asked to do, draws nothing.
///
/// Used by tests and by hosts that only need the simulated scene state.
/// Can be told to reject the next N drawable creations.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,
    next_texture: u32,
    drawables: HashMap<DrawableId, HeadlessDrawable>,
    textures: HashMap<TextureId, (u32, u32)>,
    fail_creates: usize,
    frames_rendered: u64,
    last_items: Vec<DrawItem>,
    last_sun: Option<Vec3>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` calls to `create_drawable`.
    pub fn fail_next_creates(&mut self, count: usize) {
        self.fail_creates = count;
    }

    pub fn drawable(&self, id: DrawableId) -> Option<&HeadlessDrawable> {
        self.drawables.get(&id)
    }

    pub fn uniform(&self, id: DrawableId, name: &str) -> Option<UniformValue> {
        self.drawables.get(&id).and_then(|d| d.uniforms.get(name).copied())
    }

    /// Number of drawables currently alive.
    pub fn live_drawables(&self) -> usize {
        self.drawables.len()
    }

    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&id).copied()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Draw list of the last rendered frame.
    pub fn last_items(&self) -> &[DrawItem] {
        &self.last_items
    }

    /// Sun direction of the last rendered frame.
    pub fn last_sun_direction(&self) -> Option<Vec3> {
        self.last_sun
    }
}

impl RenderBackend for HeadlessBackend {
    /// Frame number of the captured frame.
    type Frame = u64;

    fn create_drawable(&mut self, desc: &DrawableDesc) -> Result<DrawableId, BackendError> {
        if self.fail_creates > 0 {
            self.fail_creates -= 1;
            return Err(BackendError::DrawableRejected {
                label: desc.label.clone(),
                reason: "injected failure".into(),
            });
        }
        self.next_id += 1;
        let id = DrawableId(self.next_id);
        self.drawables.insert(id, HeadlessDrawable { desc: desc.clone(), uniforms: HashMap::new() });
        Ok(id)
    }

    fn destroy_drawable(&mut self, id: DrawableId) {
        self.drawables.remove(&id);
    }

    fn set_uniform(&mut self, id: DrawableId, name: &'static str, value: UniformValue) {
        if let Some(d) = self.drawables.get_mut(&id) {
            d.uniforms.insert(name, value);
        }
    }

    fn upload_texture(&mut self, image: &DecodedImage) -> Result<TextureId, BackendError> {
        if image.width == 0 || image.height == 0 {
            return Err(BackendError::TextureRejected {
                width: image.width,
                height: image.height,
                reason: "empty image".into(),
            });
        }
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.textures.insert(id, (image.width, image.height));
        Ok(id)
    }

    fn render(&mut self, frame: &FrameView<'_>) {
        self.frames_rendered += 1;
        self.last_items.clear();
        self.last_items.extend_from_slice(frame.items);
        self.last_sun = Some(frame.sun_direction);
    }

    fn capture_frame(&mut self) -> Option<u64> {
        (self.frames_rendered > 0).then_some(self.frames_rendered)
    }
}
