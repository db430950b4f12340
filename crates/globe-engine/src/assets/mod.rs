pub mod snapshot;
pub mod texture;
