//! Browser implementations of the runner's collaborators.

use globe_engine::{FrameScheduler, SnapshotError, SnapshotStore};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Storage;

/// `localStorage` key the scene is saved under.
pub const STORAGE_KEY: &str = "globe-scene";

/// `requestAnimationFrame` with one long-lived callback.
pub struct RafScheduler {
    callback: Closure<dyn FnMut(f64)>,
}

impl RafScheduler {
    pub fn new(on_frame: fn(f64)) -> Self {
        Self {
            callback: Closure::new(on_frame),
        }
    }
}

impl FrameScheduler for RafScheduler {
    type Handle = i32;

    fn request_frame(&mut self) -> Option<i32> {
        let window = web_sys::window()?;
        window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
            .map_err(|e| log::warn!("requestAnimationFrame failed: {e:?}"))
            .ok()
    }

    fn cancel_frame(&mut self, handle: i32) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(e) = window.cancel_animation_frame(handle) {
            log::warn!("cancelAnimationFrame failed: {e:?}");
        }
    }
}

/// Snapshot store backed by `window.localStorage`.
pub struct LocalStorageStore {
    key: String,
}

impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage(&self) -> Result<Storage, SnapshotError> {
        let window = web_sys::window().ok_or_else(|| SnapshotError::Storage("no window".into()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| SnapshotError::Storage("localStorage unavailable".into()))
    }
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new(STORAGE_KEY)
    }
}

impl SnapshotStore for LocalStorageStore {
    fn load(&self) -> Result<Option<String>, SnapshotError> {
        self.storage()?.get_item(&self.key).map_err(js_error)
    }

    fn save(&self, json: &str) -> Result<(), SnapshotError> {
        self.storage()?.set_item(&self.key, json).map_err(js_error)
    }
}

fn js_error(e: JsValue) -> SnapshotError {
    SnapshotError::Storage(format!("{e:?}"))
}
