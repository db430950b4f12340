//! Texture decoding off the frame path.
//!
//! Callers hand over encoded bytes together with the slot the texture is
//! meant for. Native builds decode on a worker thread. wasm32 has no
//! threads, so decoding happens inside [`TextureLoader::load`], which runs
//! in the UI event that supplied the bytes rather than in the frame. Either
//! way results go through one channel that the frame drains without
//! decoding anything, and are applied only if the target still exists.
//! Failures are logged and dropped, leaving the target's previous material
//! untouched.

#[cfg(not(target_arch = "wasm32"))]
use std::thread::JoinHandle;
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

/// Raw RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Where a loaded texture should end up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    PlanetSurface,
    /// Heightmap for the planet's surface relief.
    PlanetBump,
    PlanetSpecular,
    /// Cloud layer by name.
    CloudLayer(String),
    /// Density map of a cloud layer, by name.
    CloudDensity(String),
    /// A moon, pinned to the instance that requested it so a texture for a
    /// removed-then-re-added id is not applied to the newcomer.
    Moon { id: String, serial: u64 },
    RingSurface,
    RingAlpha,
}

impl TextureTarget {
    pub fn label(&self) -> String {
        match self {
            TextureTarget::PlanetSurface => "planet".into(),
            TextureTarget::PlanetBump => "planet:bump".into(),
            TextureTarget::PlanetSpecular => "planet:specular".into(),
            TextureTarget::CloudLayer(name) => format!("clouds:{name}"),
            TextureTarget::CloudDensity(name) => format!("clouds:{name}:density"),
            TextureTarget::Moon { id, .. } => format!("moon:{id}"),
            TextureTarget::RingSurface => "rings".into(),
            TextureTarget::RingAlpha => "rings:alpha".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("no image data")]
    Empty,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode PNG or JPEG bytes into RGBA8.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, TextureError> {
    if bytes.is_empty() {
        return Err(TextureError::Empty);
    }
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage { width, height, rgba: rgba.into_raw() })
}

/// A successfully decoded texture awaiting application.
#[derive(Debug, Clone)]
pub struct TextureLoaded {
    pub target: TextureTarget,
    pub image: DecodedImage,
}

struct DecodeTask {
    target: TextureTarget,
    bytes: Vec<u8>,
}

type DecodeResult = (TextureTarget, Result<DecodedImage, TextureError>);

/// Fire-and-forget texture decoder.
pub struct TextureLoader {
    task_sender: Option<Sender<DecodeTask>>,
    result_sender: Sender<DecodeResult>,
    result_receiver: Receiver<DecodeResult>,
    #[cfg(not(target_arch = "wasm32"))]
    worker: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureLoader {
    pub fn new() -> Self {
        let mut loader = Self::inline();
        loader.start_worker();
        loader
    }

    /// A loader without a worker: [`load`](Self::load) decodes before it returns.
    pub fn inline() -> Self {
        let (result_sender, result_receiver) = crossbeam_channel::unbounded();
        Self {
            task_sender: None,
            result_sender,
            result_receiver,
            #[cfg(not(target_arch = "wasm32"))]
            worker: None,
            in_flight: 0,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_worker(&mut self) {
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<DecodeTask>();
        let results = self.result_sender.clone();
        let spawned = std::thread::Builder::new()
            .name("texture-decode".into())
            .spawn(move || {
                while let Ok(task) = task_rx.recv() {
                    let decoded = decode(&task.bytes);
                    if results.send((task.target, decoded)).is_err() {
                        break;
                    }
                }
            });
        match spawned {
            Ok(handle) => {
                self.task_sender = Some(task_tx);
                self.worker = Some(handle);
            }
            Err(e) => log::warn!("texture worker unavailable, decoding inline: {e}"),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn start_worker(&mut self) {}

    /// Queue encoded bytes for `target`. With a worker this returns at once;
    /// without one the bytes are decoded here, never in [`drain`](Self::drain).
    pub fn load(&mut self, target: TextureTarget, bytes: Vec<u8>) {
        self.in_flight += 1;
        let task = DecodeTask { target, bytes };
        let task = match &self.task_sender {
            Some(sender) => match sender.send(task) {
                Ok(()) => return,
                Err(crossbeam_channel::SendError(task)) => task,
            },
            None => task,
        };
        let decoded = decode(&task.bytes);
        let _ = self.result_sender.send((task.target, decoded));
    }

    /// Finished decodes waiting to be drained.
    pub fn ready(&self) -> usize {
        self.result_receiver.len()
    }

    /// Collect every finished decode. Failures are logged and skipped.
    pub fn drain(&mut self) -> Vec<TextureLoaded> {
        let mut loaded = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            self.accept(result, &mut loaded);
        }
        loaded
    }

    /// Like [`drain`](Self::drain), but waits up to `timeout` for in-flight
    /// decodes to finish. For headless hosts and tests.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn drain_wait(&mut self, timeout: Duration) -> Vec<TextureLoaded> {
        let mut loaded = self.drain();
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.result_receiver.recv_timeout(remaining) {
                Ok(result) => self.accept(result, &mut loaded),
                Err(_) => break,
            }
        }
        loaded
    }

    fn accept(&mut self, (target, result): DecodeResult, loaded: &mut Vec<TextureLoaded>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(image) => loaded.push(TextureLoaded { target, image }),
            Err(e) => log::warn!("texture for {} dropped: {e}", target.label()),
        }
    }

    /// Requests queued but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        // Closing the task channel ends the worker loop.
        self.task_sender = None;
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(handle) = self.worker.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn decode_png() {
        let image = decode(&png_bytes(3, 2)).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.rgba.len(), 3 * 2 * 4);
        assert_eq!(&image.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode(&[]), Err(TextureError::Empty)));
        assert!(matches!(decode(b"not an image"), Err(TextureError::Decode(_))));
    }

    #[test]
    fn loader_delivers_results() {
        let mut loader = TextureLoader::new();
        loader.load(TextureTarget::PlanetSurface, png_bytes(4, 4));
        loader.load(TextureTarget::CloudLayer("high".into()), png_bytes(2, 2));
        assert_eq!(loader.in_flight(), 2);

        let loaded = loader.drain_wait(Duration::from_secs(5));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loader.in_flight(), 0);
        assert!(loaded.iter().any(|l| l.target == TextureTarget::PlanetSurface && l.image.width == 4));
    }

    #[test]
    fn loader_drops_failures() {
        let mut loader = TextureLoader::new();
        loader.load(TextureTarget::RingAlpha, b"garbage".to_vec());
        loader.load(TextureTarget::RingSurface, png_bytes(1, 1));
        let loaded = loader.drain_wait(Duration::from_secs(5));
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].target, TextureTarget::RingSurface);
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn inline_loader_decodes_before_the_frame() {
        let mut loader = TextureLoader::inline();
        loader.load(TextureTarget::PlanetSurface, png_bytes(2, 2));
        loader.load(TextureTarget::RingAlpha, b"garbage".to_vec());
        // both results are already in the channel; draining only receives
        assert_eq!(loader.ready(), 2);
        assert_eq!(loader.in_flight(), 2);

        let loaded = loader.drain();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].target, TextureTarget::PlanetSurface);
        assert_eq!(loader.in_flight(), 0);
        assert_eq!(loader.ready(), 0);
    }

    #[test]
    fn target_labels() {
        assert_eq!(TextureTarget::Moon { id: "io".into(), serial: 3 }.label(), "moon:io");
        assert_eq!(TextureTarget::CloudLayer("low".into()).label(), "clouds:low");
        assert_eq!(TextureTarget::CloudDensity("low".into()).label(), "clouds:low:density");
        assert_eq!(TextureTarget::PlanetBump.label(), "planet:bump");
    }
}
