pub mod config;
pub mod map;
pub mod poi;
pub mod state;

pub use map::pipeline::{MapLayers, MapPipeline};
