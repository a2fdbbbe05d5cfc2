mod anomaly;
mod join;

pub use anomaly::{aggregate, load_anomalies, AnomalyRecord, RawAnomaly};
pub use join::{JoinReport, JoinedDataset, JoinedRow};

use crate::error::DataError;
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use std::fs;
use std::path::Path;

/// Default attribute holding the country name in Natural Earth admin-0 files
pub const DEFAULT_NAME_FIELD: &str = "ADMIN";

/// A country boundary, static across years. `geometry` is `None` for
/// countries the source lists without a shape; they still get a feature.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryGeometry {
    pub country: String,
    pub geometry: Option<Geometry>,
}

/// Load country boundaries from a Shapefile or GeoJSON file, keyed by `name_field`
pub fn load_boundaries(path: &Path, name_field: &str) -> Result<Vec<CountryGeometry>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let countries = match ext.as_str() {
        "shp" => load_shapefile(path, name_field),
        "json" | "geojson" => load_geojson(path, name_field),
        _ => return Err(DataError::UnsupportedFormat(path.display().to_string()).into()),
    }
    .with_context(|| format!("Failed to load boundaries from {}", path.display()))?;

    log::info!("loaded {} country boundaries from {}", countries.len(), path.display());
    Ok(countries)
}

/// Load country polygons from a GeoJSON FeatureCollection
fn load_geojson(path: &Path, name_field: &str) -> Result<Vec<CountryGeometry>> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    boundaries_from_geojson(geojson, name_field)
}

fn boundaries_from_geojson(geojson: GeoJson, name_field: &str) -> Result<Vec<CountryGeometry>> {
    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err(DataError::NotAFeatureCollection.into());
    };

    let mut countries = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.into_iter().enumerate() {
        let country = feature
            .properties
            .as_ref()
            .and_then(|p| p.get(name_field))
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| DataError::MissingName {
                index,
                field: name_field.to_string(),
            })?;

        if let Some(geometry) = &feature.geometry {
            match geometry.value {
                Value::Polygon(_) | Value::MultiPolygon(_) => {}
                ref other => {
                    return Err(DataError::UnsupportedGeometry {
                        country,
                        kind: geometry_kind(other).to_string(),
                    }
                    .into())
                }
            }
        } else {
            log::debug!("'{}' has no geometry", country);
        }

        countries.push(CountryGeometry {
            country,
            geometry: feature.geometry,
        });
    }

    Ok(countries)
}

/// Load country polygons and names from an ESRI Shapefile (plus its .dbf)
fn load_shapefile(path: &Path, name_field: &str) -> Result<Vec<CountryGeometry>> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut countries = Vec::with_capacity(reader.shape_count()?);
    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.context("Error reading shape+record")?;
        let country = record_name(&record, name_field).ok_or_else(|| DataError::MissingName {
            index,
            field: name_field.to_string(),
        })?;

        let value = match shape {
            Shape::Polygon(p) => Some(rings_to_value(p.rings(), |pt| (pt.x, pt.y))),
            Shape::PolygonM(p) => Some(rings_to_value(p.rings(), |pt| (pt.x, pt.y))),
            Shape::PolygonZ(p) => Some(rings_to_value(p.rings(), |pt| (pt.x, pt.y))),
            Shape::NullShape => {
                log::debug!("'{}' has a null shape", country);
                None
            }
            other => {
                return Err(DataError::UnsupportedGeometry {
                    country,
                    kind: format!("{:?}", other.shapetype()),
                }
                .into())
            }
        };

        countries.push(CountryGeometry {
            country,
            geometry: value.map(Geometry::new),
        });
    }

    Ok(countries)
}

fn record_name(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
        FieldValue::Memo(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Group shapefile rings into GeoJSON polygons: each outer ring opens a new
/// polygon, inner rings attach to the most recent one.
fn rings_to_value<P, F>(rings: &[PolygonRing<P>], xy: F) -> Value
where
    F: Fn(&P) -> (f64, f64),
{
    let mut polygons: Vec<Vec<Vec<Vec<f64>>>> = Vec::new();

    for ring in rings {
        let coords: Vec<Vec<f64>> = ring
            .points()
            .iter()
            .map(|pt| {
                let (x, y) = xy(pt);
                vec![x, y]
            })
            .collect();

        match ring {
            PolygonRing::Inner(_) if !polygons.is_empty() => {
                if let Some(last) = polygons.last_mut() {
                    last.push(coords);
                }
            }
            _ => polygons.push(vec![coords]),
        }
    }

    if polygons.len() == 1 {
        Value::Polygon(polygons.remove(0))
    } else {
        Value::MultiPolygon(polygons)
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
