pub mod cluster;
pub mod coordinates;
pub mod feature;
pub mod heatmap;
pub mod pipeline;
pub mod popup;
pub mod projector;
pub mod stats;
pub mod viewport;
