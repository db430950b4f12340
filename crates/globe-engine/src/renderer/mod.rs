pub mod geometry;
pub mod headless;
pub mod traits;

// Re-export key types for convenient access
pub use traits::{
    RenderBackend, FrameView, DrawableDesc, Primitive, MaterialKind,
    UniformValue, BackendError,
};
