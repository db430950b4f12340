//! `#[wasm_bindgen]` exports for the globe scene.
//!
//! The page calls `globe_init` once, then either `globe_start` to let the
//! scene drive itself from `requestAnimationFrame`, or `globe_tick` from its
//! own loop. After each frame it reads the frame buffer through
//! `get_frame_buffer_ptr`/`get_frame_buffer_len` and applies the resource
//! commands returned by `globe_bridge_commands`.

pub mod browser;
pub mod runner;

use std::cell::RefCell;

use globe_engine::GlobeConfig;
use wasm_bindgen::prelude::*;

pub use browser::{LocalStorageStore, RafScheduler, STORAGE_KEY};
pub use runner::WebRunner;

pub type BrowserRunner = WebRunner<RafScheduler, LocalStorageStore>;

thread_local! {
    static RUNNER: RefCell<Option<BrowserRunner>> = const { RefCell::new(None) };
}

/// Run `f` against the runner. Calls made before `globe_init` are ignored.
fn with_runner<R>(f: impl FnOnce(&mut BrowserRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                log::warn!("globe not initialized; call globe_init() first");
                None
            }
        }
    })
}

fn animation_frame(now_ms: f64) {
    with_runner(|r| r.on_animation_frame(now_ms));
}

/// Build the scene from a JSON `GlobeConfig` (empty string for defaults)
/// and restore the saved scene, if any.
#[wasm_bindgen]
pub fn globe_init(config_json: &str) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let config = if config_json.trim().is_empty() {
        GlobeConfig::default()
    } else {
        GlobeConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("bad config, using defaults: {e}");
            GlobeConfig::default()
        })
    };

    let mut runner = WebRunner::new(config, RafScheduler::new(animation_frame), LocalStorageStore::default());
    runner.restore();

    RUNNER.with(|cell| {
        if let Some(mut old) = cell.borrow_mut().replace(runner) {
            old.stop();
        }
    });
    log::info!("globe: initialized");
}

// ---- Loop ----

#[wasm_bindgen]
pub fn globe_start() -> bool {
    with_runner(|r| r.start()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn globe_stop() -> bool {
    with_runner(|r| r.stop()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn globe_tick(now_ms: f64) {
    with_runner(|r| r.tick(now_ms));
}

// ---- Input ----

#[wasm_bindgen]
pub fn globe_command(json: &str) -> bool {
    with_runner(|r| r.push_command_json(json)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn globe_load_texture(slot: &str, bytes: Vec<u8>) -> bool {
    with_runner(|r| r.load_texture(slot, bytes)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn globe_load_moon_texture(id: &str, bytes: Vec<u8>) -> bool {
    with_runner(|r| r.load_moon_texture(id, bytes)).unwrap_or(false)
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_frame_buffer_ptr() -> *const f32 {
    with_runner(|r| r.frame_buffer_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_frame_buffer_len() -> u32 {
    with_runner(|r| r.frame_buffer_len()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn globe_bridge_commands() -> String {
    with_runner(|r| r.bridge_commands_json()).unwrap_or_else(|| "[]".into())
}

/// Copy of an uploaded texture's RGBA pixels. The core keeps its copy until
/// `globe_release_texture` is called.
#[wasm_bindgen]
pub fn globe_texture_pixels(id: u32) -> Option<js_sys::Uint8Array> {
    with_runner(|r| r.texture_pixels(id).map(js_sys::Uint8Array::from)).flatten()
}

#[wasm_bindgen]
pub fn globe_release_texture(id: u32) -> bool {
    with_runner(|r| r.release_texture_pixels(id)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn globe_info() -> String {
    with_runner(|r| r.info_json()).unwrap_or_else(|| "null".into())
}

#[wasm_bindgen]
pub fn globe_events() -> String {
    with_runner(|r| r.events_json()).unwrap_or_else(|| "[]".into())
}

// ---- Export ----

/// Frame number the page should read back from the canvas.
#[wasm_bindgen]
pub fn globe_screenshot() -> Option<u32> {
    with_runner(|r| r.screenshot()).flatten()
}

#[wasm_bindgen]
pub fn globe_start_gif() -> bool {
    with_runner(|r| r.start_gif_capture()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn globe_gif_frames() -> Vec<u32> {
    with_runner(|r| r.take_gif_frames()).unwrap_or_default()
}

// ---- Persistence ----

#[wasm_bindgen]
pub fn globe_save() -> bool {
    with_runner(|r| r.save(js_sys::Date::now())).unwrap_or(false)
}

#[wasm_bindgen]
pub fn globe_restore() -> bool {
    with_runner(|r| r.restore()).unwrap_or(false)
}
