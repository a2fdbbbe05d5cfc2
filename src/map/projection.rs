use std::f64::consts::PI;

/// Web Mercator is undefined at the poles; clip latitudes here
const MAX_LAT: f64 = 85.051_129;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 50.0;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (1 = full longitude span across the width)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// World view, nudged north since little data sits below 60°S
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon = wrap_lon(self.center_lon + dx as f64 * scale);
        self.center_lat = (self.center_lat - dy as f64 * scale * 0.5).clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor, keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    fn center_xy(&self) -> (f64, f64) {
        (mercator_x(self.center_lon), mercator_y(self.center_lat))
    }

    /// Unproject pixel coordinates to (lon, lat), longitude wrapped into [-180, 180)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f(px as f64, py as f64)
    }

    /// Sub-pixel unprojection, used for sampling cell centers
    pub fn unproject_f(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.scale();
        let (center_x, center_y) = self.center_xy();

        let x = (px - self.width as f64 / 2.0) / scale + center_x;
        let y = (py - self.height as f64 / 2.0) / scale + center_y;

        let lon = wrap_lon(x * 360.0 - 180.0);
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let (center_x, center_y) = self.center_xy();

        let px = ((mercator_x(lon) - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((mercator_y(lat) - center_y) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

/// Normalized Web Mercator x in [0, 1]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Normalized Web Mercator y, 0 at the north clip and 1 at the south clip
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Wrap longitude into [-180, 180)
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(10.0, 30.0, 2.0, 400, 200);
        let (px, py) = vp.project(12.0, 31.0);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 12.0).abs() < 1.0);
        assert!((lat - 31.0).abs() < 1.0);
    }

    #[test]
    fn test_poles_stay_finite() {
        let vp = Viewport::world(200, 100);
        let (_, py) = vp.project(0.0, -90.0);
        assert!(py > 0 && py < 1000);
    }

    #[test]
    fn test_pan_wraps() {
        let mut vp = Viewport::new(179.0, 0.0, 1.0, 360, 100);
        vp.pan(5, 0);
        assert!(vp.center_lon < 0.0);
    }

    #[test]
    fn test_wrap_lon() {
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-180.0), -180.0);
        assert_eq!(wrap_lon(540.0), -180.0);
    }
}
