pub mod config;
pub mod constants;
pub mod geo;
pub mod overlay;
pub mod viewport;
