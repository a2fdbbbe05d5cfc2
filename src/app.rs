use crate::index::YearIndex;
use crate::map::{ChoroplethRenderer, GeoJsonSource, LinearColorMapper, Viewport};
use crate::ui;
use crate::widget::Slider;
use anyhow::Result;
use ratatui::layout::Rect;
use std::cell::RefCell;
use std::rc::Rc;

/// Map title for a given year
pub fn title_for(year: i32) -> String {
    format!("Avg. Monthly Temperature Anomaly for Year {}", year)
}

/// The mutable part of the map: its data source and title.
/// Written only by `UpdateHandler`, read by rendering.
pub struct MapView {
    pub source: GeoJsonSource,
    pub title: String,
}

/// Year change handler. Swaps in the precomputed payload for the new year
/// and retitles the map; never filters or serializes.
pub struct UpdateHandler {
    index: Rc<YearIndex>,
    view: Rc<RefCell<MapView>>,
}

impl UpdateHandler {
    pub fn new(index: Rc<YearIndex>, view: Rc<RefCell<MapView>>) -> Self {
        Self { index, view }
    }

    /// The title changes only together with a successful payload swap. If the
    /// payload fails to decode, the view stays on its previous year while the
    /// slider already shows `new`.
    pub fn handle(&self, old: i32, new: i32) {
        let payload = match self.index.lookup(new) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("ignoring year change {} -> {}: {}", old, new, e);
                return;
            }
        };

        let mut view = self.view.borrow_mut();
        if let Err(e) = view.source.set_geojson(payload) {
            log::error!("failed to decode snapshot for {}: {:#}", new, e);
            return;
        }
        view.title = title_for(new);
        log::debug!("year {} -> {}", old, new);
    }
}

/// What the hover tooltip shows
#[derive(Clone, Debug, PartialEq)]
pub struct Hover {
    pub country: String,
    pub anomaly: Option<f64>,
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub renderer: ChoroplethRenderer,
    pub view: Rc<RefCell<MapView>>,
    pub slider: Slider,
    pub should_quit: bool,
    /// Full terminal area, for layout hit-testing
    pub screen: Rect,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for the hover tooltip
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    /// Attach the view to a built index, starting at `initial_year` (clamped into range)
    pub fn new(width: u16, height: u16, index: Rc<YearIndex>, initial_year: i32) -> Result<Self> {
        let range = index.range();
        let year = range.clamp(initial_year);

        let source = GeoJsonSource::new(index.lookup(year)?)?;
        let view = Rc::new(RefCell::new(MapView {
            source,
            title: title_for(year),
        }));

        let mut slider = Slider::new("Year", range.start(), range.end(), 1, year);
        let handler = UpdateHandler::new(index, Rc::clone(&view));
        slider.on_change(move |old, new| handler.handle(old, new));

        let screen = Rect::new(0, 0, width, height);
        let (pw, ph) = map_pixels(screen);

        Ok(Self {
            viewport: Viewport::world(pw, ph),
            renderer: ChoroplethRenderer::new(LinearColorMapper::anomaly()),
            view,
            slider,
            should_quit: false,
            screen,
            last_mouse: None,
            mouse_pos: None,
        })
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::new(0, 0, width, height);
        let (pw, ph) = map_pixels(self.screen);
        self.viewport.width = pw;
        self.viewport.height = ph;
    }

    pub fn year(&self) -> i32 {
        self.slider.value()
    }

    /// Move the year slider by `n` steps
    pub fn step_year(&mut self, n: i32) {
        self.slider.step_by(n);
    }

    pub fn first_year(&mut self) {
        let start = self.slider.start();
        self.slider.set_value(start);
    }

    pub fn last_year(&mut self) {
        let end = self.slider.end();
        self.slider.set_value(end);
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Left button press: jump the slider if on its track, otherwise start a drag
    pub fn press(&mut self, col: u16, row: u16) {
        let track = ui::layout(self.screen).slider_track;
        if contains(track, col, row) {
            self.slider.set_from_track(col - track.x, track.width);
        } else {
            self.last_mouse = Some((col, row));
        }
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
            self.last_mouse = Some((x, y));
        }
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Terminal cell to braille pixel coordinates inside the map, if on the map
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = ui::layout(self.screen).map_inner;
        if !contains(inner, col, row) {
            return None;
        }
        let px = (col - inner.x) as i32 * 2;
        let py = (row - inner.y) as i32 * 4;
        Some((px, py))
    }

    /// Country under the mouse cursor
    pub fn hover(&self) -> Option<Hover> {
        let (col, row) = self.mouse_pos?;
        let (px, py) = self.map_pixel(col, row)?;
        // Centre of the 2x4 braille cell
        let (lon, lat) = self.viewport.unproject_f(px as f64 + 1.0, py as f64 + 2.0);

        let view = self.view.borrow();
        let hover = view.source.region_at(lon, lat).map(|region| Hover {
            country: region.name.clone(),
            anomaly: region.anomaly,
        });
        hover
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Braille pixel size of the map area for a screen
fn map_pixels(screen: Rect) -> (usize, usize) {
    let inner = ui::layout(screen).map_inner;
    (inner.width as usize * 2, inner.height as usize * 4)
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::square;
    use crate::data::{AnomalyRecord, JoinedDataset};
    use crate::index::YearRange;
    use std::sync::Arc;

    fn index() -> Rc<YearIndex> {
        let countries = vec![square("USA", -100.0, 30.0, 10.0), square("FRA", 0.0, 45.0, 5.0)];
        let anomalies = vec![AnomalyRecord {
            country: "USA".into(),
            year: 2000,
            monthly_anomaly: Some(1.5),
        }];
        let (dataset, _) = JoinedDataset::join(countries, &anomalies);
        Rc::new(YearIndex::build(&dataset, YearRange::default()).unwrap())
    }

    #[test]
    fn test_handler_swaps_payload_and_title() {
        let index = index();
        let source = GeoJsonSource::new(index.lookup(1900).unwrap()).unwrap();
        let view = Rc::new(RefCell::new(MapView {
            source,
            title: title_for(1900),
        }));
        let handler = UpdateHandler::new(Rc::clone(&index), Rc::clone(&view));

        handler.handle(1900, 2000);

        let view = view.borrow();
        let expected = index.lookup(2000).unwrap();
        assert!(Arc::ptr_eq(view.source.geojson(), &expected));
        assert_eq!(view.source.geojson().as_ref(), expected.as_ref());
        assert!(view.title.contains("2000"));
        assert_eq!(view.source.regions()[0].anomaly, Some(1.5));
    }

    #[test]
    fn test_handler_keeps_title_with_payload_on_decode_failure() {
        let good = index();
        let range = YearRange::new(2000, 2001).unwrap();
        let payloads = vec![good.lookup(2000).unwrap(), Arc::from("{\"type\":")];
        let index = Rc::new(YearIndex::from_payloads(range, payloads));

        let source = GeoJsonSource::new(index.lookup(2000).unwrap()).unwrap();
        let view = Rc::new(RefCell::new(MapView {
            source,
            title: title_for(2000),
        }));
        let handler = UpdateHandler::new(Rc::clone(&index), Rc::clone(&view));

        handler.handle(2000, 2001);

        let view = view.borrow();
        assert_eq!(view.title, title_for(2000));
        assert!(Arc::ptr_eq(view.source.geojson(), &index.lookup(2000).unwrap()));
    }

    #[test]
    fn test_handler_ignores_out_of_range() {
        let index = index();
        let source = GeoJsonSource::new(index.lookup(1950).unwrap()).unwrap();
        let view = Rc::new(RefCell::new(MapView {
            source,
            title: title_for(1950),
        }));
        let handler = UpdateHandler::new(Rc::clone(&index), Rc::clone(&view));

        handler.handle(1950, 2050);

        assert_eq!(view.borrow().title, title_for(1950));
    }

    #[test]
    fn test_slider_drives_view() {
        let mut app = App::new(120, 40, index(), 1999).unwrap();
        assert_eq!(app.year(), 1999);

        app.step_year(1);
        assert_eq!(app.year(), 2000);
        assert!(app.view.borrow().title.ends_with("2000"));

        app.last_year();
        assert!(app.view.borrow().title.ends_with("2013"));
        app.step_year(5);
        assert_eq!(app.year(), 2013);
    }

    #[test]
    fn test_initial_year_clamped() {
        let app = App::new(120, 40, index(), 2100).unwrap();
        assert_eq!(app.year(), 2013);
        assert_eq!(app.view.borrow().title, title_for(2013));
    }

    #[test]
    fn test_click_on_slider_track() {
        let mut app = App::new(120, 40, index(), 2000).unwrap();
        let track = ui::layout(app.screen).slider_track;

        app.press(track.x, track.y);
        assert_eq!(app.year(), 1900);
        assert!(app.last_mouse.is_none());

        app.press(track.x + track.width - 1, track.y);
        assert_eq!(app.year(), 2013);
    }

    #[test]
    fn test_hover_outside_map_is_none() {
        let mut app = App::new(120, 40, index(), 2000).unwrap();
        app.set_mouse_pos(0, 39);
        assert!(app.hover().is_none());
    }
}
