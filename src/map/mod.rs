pub mod color;
mod geometry;
mod projection;
mod renderer;
pub mod source;
mod spatial;

pub use color::LinearColorMapper;
pub use projection::Viewport;
pub use renderer::{ChoroplethRenderer, MapLayers};
pub use source::{GeoJsonSource, Region};
