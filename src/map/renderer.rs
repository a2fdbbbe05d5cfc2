use crate::braille::BrailleCanvas;
use crate::map::color::LinearColorMapper;
use crate::map::geometry::{draw_line, Ring};
use crate::map::projection::Viewport;
use crate::map::source::GeoJsonSource;
use ratatui::style::Color;

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_fill: bool,
    pub show_outlines: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_fill: true,
            show_outlines: true,
        }
    }
}

/// Rendered layers for one frame, in character cells
pub struct MapLayers {
    pub width: usize,
    pub height: usize,
    /// Fill color per cell, row-major; `None` is open water
    pub fills: Vec<Option<Color>>,
    pub outlines: BrailleCanvas,
}

impl MapLayers {
    pub fn fill(&self, cx: usize, cy: usize) -> Option<Color> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        self.fills[cy * self.width + cx]
    }
}

/// Choropleth renderer: per-cell fill from the color mapper, Braille outlines on top
pub struct ChoroplethRenderer {
    pub mapper: LinearColorMapper,
    pub settings: DisplaySettings,
}

impl ChoroplethRenderer {
    pub fn new(mapper: LinearColorMapper) -> Self {
        Self {
            mapper,
            settings: DisplaySettings::default(),
        }
    }

    /// Render the source into a `width` x `height` character grid
    pub fn render(&self, source: &GeoJsonSource, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let mut fills = vec![None; width * height];
        if self.settings.show_fill {
            for cy in 0..height {
                for cx in 0..width {
                    // Sample the middle of the 2x4 braille cell
                    let (lon, lat) = viewport.unproject_f(cx as f64 * 2.0 + 1.0, cy as f64 * 4.0 + 2.0);
                    if let Some(region) = source.region_at(lon, lat) {
                        fills[cy * width + cx] = Some(self.mapper.map(region.anomaly));
                    }
                }
            }
        }

        let mut outlines = BrailleCanvas::new(width, height);
        if self.settings.show_outlines {
            for ring in source.regions().iter().flat_map(|r| r.rings()) {
                draw_ring(&mut outlines, ring, viewport);
            }
        }

        MapLayers {
            width,
            height,
            fills,
            outlines,
        }
    }

    pub fn toggle_fill(&mut self) {
        self.settings.show_fill = !self.settings.show_fill;
    }

    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }
}

/// Draw a ring with viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &Ring, viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in ring {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Long jumps are antimeridian crossings, not real edges
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}
