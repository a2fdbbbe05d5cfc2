use crate::map::geometry::{point_in_polygon, Ring};
use crate::map::spatial::FeatureGrid;
use anyhow::{bail, Result};
use geojson::{GeoJson, Value};
use std::sync::Arc;
use std::time::Instant;

/// Grid cell size in degrees for hit-testing
const GRID_CELL_DEG: f64 = 10.0;

/// One drawable country decoded from the current payload
#[derive(Clone, Debug)]
pub struct Region {
    pub name: String,
    pub anomaly: Option<f64>,
    /// Polygons, each as exterior ring followed by holes
    pub polygons: Vec<Vec<Ring>>,
    /// (min_lon, min_lat, max_lon, max_lat)
    pub bbox: (f64, f64, f64, f64),
}

impl Region {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let (min_lon, min_lat, max_lon, max_lat) = self.bbox;
        if lon < min_lon || lon > max_lon || lat < min_lat || lat > max_lat {
            return false;
        }
        self.polygons.iter().any(|rings| point_in_polygon(rings, lon, lat))
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flatten()
    }
}

/// Live data source behind the map: a serialized FeatureCollection plus
/// the regions decoded from it. Assigning a new payload replaces both.
pub struct GeoJsonSource {
    geojson: Arc<str>,
    regions: Vec<Region>,
    grid: FeatureGrid,
}

impl GeoJsonSource {
    pub fn new(geojson: Arc<str>) -> Result<Self> {
        let regions = decode(&geojson)?;
        let grid = build_grid(&regions);
        Ok(Self {
            geojson,
            regions,
            grid,
        })
    }

    /// Swap in a new payload. The source is left untouched if it fails to decode.
    pub fn set_geojson(&mut self, geojson: Arc<str>) -> Result<()> {
        let started = Instant::now();
        let regions = decode(&geojson)?;
        self.grid = build_grid(&regions);
        self.regions = regions;
        self.geojson = geojson;
        log::debug!(
            "decoded {} regions ({} bytes) in {:.1?}",
            self.regions.len(),
            self.geojson.len(),
            started.elapsed()
        );
        Ok(())
    }

    pub fn geojson(&self) -> &Arc<str> {
        &self.geojson
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Region containing the point; the first in payload order wins on overlap
    pub fn region_at(&self, lon: f64, lat: f64) -> Option<&Region> {
        self.grid
            .query_point(lon, lat)
            .iter()
            .filter_map(|&idx| self.regions.get(idx))
            .find(|region| region.contains(lon, lat))
    }
}

fn build_grid(regions: &[Region]) -> FeatureGrid {
    FeatureGrid::build(regions.iter().map(|r| r.bbox), GRID_CELL_DEG)
}

/// Parse a FeatureCollection payload into regions
fn decode(payload: &str) -> Result<Vec<Region>> {
    // simd-json parses in place, so it needs its own mutable copy
    let mut bytes = payload.as_bytes().to_vec();
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)?;

    let GeoJson::FeatureCollection(fc) = geojson else {
        bail!("map payload is not a FeatureCollection");
    };

    let mut regions = Vec::with_capacity(fc.features.len());
    for feature in fc.features {
        let name = feature
            .property("country")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();
        let anomaly = feature.property("monthly_anomaly").and_then(|v| v.as_f64());

        let Some(geometry) = feature.geometry else {
            continue;
        };

        let polygons: Vec<Vec<Ring>> = match geometry.value {
            Value::Polygon(rings) => vec![convert_rings(&rings)],
            Value::MultiPolygon(polys) => polys.iter().map(|rings| convert_rings(rings)).collect(),
            _ => continue,
        };

        let bbox = bounding_box(&polygons);
        regions.push(Region {
            name,
            anomaly,
            polygons,
            bbox,
        });
    }

    Ok(regions)
}

fn convert_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|coords| {
            coords
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect()
        })
        .collect()
}

fn bounding_box(polygons: &[Vec<Ring>]) -> (f64, f64, f64, f64) {
    let mut bbox = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for &(lon, lat) in polygons.iter().flatten().flatten() {
        bbox.0 = bbox.0.min(lon);
        bbox.1 = bbox.1.min(lat);
        bbox.2 = bbox.2.max(lon);
        bbox.3 = bbox.3.max(lat);
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":"0","properties":{"country":"USA","monthly_anomaly":1.5,"year":2000},
         "geometry":{"type":"Polygon","coordinates":[[[-100,30],[-90,30],[-90,40],[-100,40],[-100,30]]]}},
        {"type":"Feature","id":"1","properties":{"country":"FRA","monthly_anomaly":null,"year":2000},
         "geometry":{"type":"MultiPolygon","coordinates":[
            [[[0,45],[5,45],[5,50],[0,50],[0,45]]],
            [[[8,41],[9,41],[9,43],[8,43],[8,41]]]]}}
    ]}"#;

    #[test]
    fn test_decode_regions() {
        let source = GeoJsonSource::new(Arc::from(PAYLOAD)).unwrap();
        let regions = source.regions();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name, "USA");
        assert_eq!(regions[0].anomaly, Some(1.5));
        assert_eq!(regions[1].anomaly, None);
        assert_eq!(regions[1].polygons.len(), 2);
        assert_eq!(regions[1].bbox, (0.0, 41.0, 9.0, 50.0));
    }

    #[test]
    fn test_region_at() {
        let source = GeoJsonSource::new(Arc::from(PAYLOAD)).unwrap();

        assert_eq!(source.region_at(-95.0, 35.0).map(|r| r.name.as_str()), Some("USA"));
        assert_eq!(source.region_at(8.5, 42.0).map(|r| r.name.as_str()), Some("FRA"));
        // Inside FRA's bbox but between its two polygons
        assert!(source.region_at(7.0, 44.0).is_none());
        assert!(source.region_at(150.0, -30.0).is_none());
    }

    #[test]
    fn test_bad_payload_keeps_previous() {
        let mut source = GeoJsonSource::new(Arc::from(PAYLOAD)).unwrap();
        assert!(source.set_geojson(Arc::from("{\"type\":\"Point\"")).is_err());
        assert_eq!(source.regions().len(), 2);
        assert_eq!(source.geojson().as_ref(), PAYLOAD);
    }

    #[test]
    fn test_shapeless_feature_not_drawn() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":"0","properties":{"country":"B","monthly_anomaly":null,"year":2000},
             "geometry":null}
        ]}"#;
        let source = GeoJsonSource::new(Arc::from(payload)).unwrap();
        assert!(source.regions().is_empty());
        assert!(source.region_at(0.0, 0.0).is_none());
    }
}
