pub mod config;
pub mod globe;
pub mod types;
