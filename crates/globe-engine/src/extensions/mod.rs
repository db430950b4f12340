// extensions/mod.rs
//
// Animation helpers layered on the scene graph.
// Nothing here knows about planets or moons; the lighting controller and the
// GIF turntable drive node transforms through these.

pub mod easing;
pub mod tween;

pub use easing::{Easing, lerp, ease, ease_quat};
pub use tween::{TweenState, Tween, TweenId, TweenTarget};
