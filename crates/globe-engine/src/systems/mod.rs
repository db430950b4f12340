pub mod lighting;
pub mod moons;
pub mod orbit;
