//! Year-indexed snapshot cache.
//!
//! Every year of the range is filtered and serialized to a GeoJSON
//! FeatureCollection once, up front. Slider updates then swap in the
//! stored payload instead of re-filtering and re-serializing geometry.

use crate::data::JoinedDataset;
use crate::error::IndexError;
use geojson::{feature::Id, Feature, FeatureCollection};
use rayon::prelude::*;
use serde_json::{json, Map};
use std::sync::Arc;
use std::time::Instant;

/// Inclusive range of indexed years
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub const DEFAULT_START: i32 = 1900;
    pub const DEFAULT_END: i32 = 2013;

    pub fn new(start: i32, end: i32) -> Result<Self, IndexError> {
        if start > end {
            return Err(IndexError::EmptyRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.start, self.end)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: Self::DEFAULT_START,
            end: Self::DEFAULT_END,
        }
    }
}

/// Immutable map from year to serialized FeatureCollection
pub struct YearIndex {
    range: YearRange,
    /// Dense by `year - range.start`
    payloads: Vec<Arc<str>>,
}

impl YearIndex {
    /// Serialize one snapshot per year. Years are built in parallel and
    /// stored in year order, so output never depends on scheduling.
    pub fn build(dataset: &JoinedDataset, range: YearRange) -> Result<Self, IndexError> {
        let started = Instant::now();

        let payloads = (range.start..=range.end)
            .into_par_iter()
            .map(|year| snapshot(dataset, year).map(Arc::<str>::from))
            .collect::<Result<Vec<_>, _>>()?;

        let bytes: usize = payloads.iter().map(|p| p.len()).sum();
        log::info!(
            "built year index {}..={} ({} snapshots, {} bytes) in {:.1?}",
            range.start,
            range.end,
            payloads.len(),
            bytes,
            started.elapsed()
        );

        Ok(Self { range, payloads })
    }

    /// O(1) payload lookup. Years outside the built range are rejected.
    pub fn lookup(&self, year: i32) -> Result<Arc<str>, IndexError> {
        if !self.range.contains(year) {
            return Err(IndexError::OutOfRange {
                year,
                start: self.range.start,
                end: self.range.end,
            });
        }
        Ok(Arc::clone(&self.payloads[(year - self.range.start) as usize]))
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    #[cfg(test)]
    pub(crate) fn from_payloads(range: YearRange, payloads: Vec<Arc<str>>) -> Self {
        assert_eq!(payloads.len(), range.len());
        Self { range, payloads }
    }

    /// (year, payload) pairs in year order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.range.years().zip(self.payloads.iter().map(|p| p.as_ref()))
    }
}

/// Filter the dataset to `year` and serialize it as a FeatureCollection.
/// One feature per geometry country; countries without data for the year
/// carry a null `monthly_anomaly`.
pub fn snapshot(dataset: &JoinedDataset, year: i32) -> Result<String, IndexError> {
    let features = dataset
        .partition(year)
        .into_iter()
        .enumerate()
        .map(|(idx, (geom, anomaly))| {
            let mut properties = Map::new();
            properties.insert("country".into(), json!(geom.country));
            properties.insert("year".into(), json!(year));
            properties.insert("monthly_anomaly".into(), json!(anomaly));

            Feature {
                bbox: None,
                geometry: geom.geometry.clone(),
                id: Some(Id::String(idx.to_string())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let fc = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    serde_json::to_string(&fc).map_err(|source| IndexError::Serialize { year, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{shapeless, square};
    use crate::data::AnomalyRecord;
    use geojson::GeoJson;

    fn usa_fra() -> JoinedDataset {
        let countries = vec![square("USA", -100.0, 30.0, 10.0), square("FRA", 0.0, 45.0, 5.0)];
        let anomalies = vec![AnomalyRecord {
            country: "USA".into(),
            year: 2000,
            monthly_anomaly: Some(1.5),
        }];
        JoinedDataset::join(countries, &anomalies).0
    }

    fn features(payload: &str) -> Vec<Feature> {
        match payload.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => fc.features,
            _ => panic!("payload is not a FeatureCollection"),
        }
    }

    fn anomaly(feature: &Feature) -> &serde_json::Value {
        feature.property("monthly_anomaly").unwrap()
    }

    #[test]
    fn test_every_year_indexed() {
        let dataset = usa_fra();
        let index = YearIndex::build(&dataset, YearRange::default()).unwrap();

        for year in 1900..=2013 {
            let payload = index.lookup(year).unwrap();
            let features = features(&payload);
            assert_eq!(features.len(), 2, "year {}", year);
            assert!(features.iter().all(|f| f.geometry.is_some()));
        }
        assert_eq!(index.iter().count(), 114);
    }

    #[test]
    fn test_year_without_data_is_null_not_absent() {
        let index = YearIndex::build(&usa_fra(), YearRange::default()).unwrap();
        let features = features(&index.lookup(1950).unwrap());

        assert_eq!(features.len(), 2);
        for f in &features {
            assert!(anomaly(f).is_null());
            assert!(f.geometry.is_some());
        }
    }

    #[test]
    fn test_usa_fra_scenario() {
        let index = YearIndex::build(&usa_fra(), YearRange::default()).unwrap();
        let features = features(&index.lookup(2000).unwrap());

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].property("country").unwrap(), "USA");
        assert_eq!(anomaly(&features[0]).as_f64(), Some(1.5));
        assert_eq!(features[1].property("country").unwrap(), "FRA");
        assert!(anomaly(&features[1]).is_null());
        assert_eq!(features[1].property("year").unwrap(), 2000);
    }

    #[test]
    fn test_shapeless_country_keeps_its_feature() {
        let countries = vec![square("A", 0.0, 0.0, 1.0), shapeless("B")];
        let (dataset, _) = JoinedDataset::join(countries, &[]);
        let index = YearIndex::build(&dataset, YearRange::new(2000, 2000).unwrap()).unwrap();
        let features = features(&index.lookup(2000).unwrap());

        assert_eq!(features.len(), dataset.countries.len());
        assert_eq!(features[1].property("country").unwrap(), "B");
        assert!(features[1].geometry.is_none());
        assert!(index.lookup(2000).unwrap().contains(r#""geometry":null"#));
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let dataset = usa_fra();
        let range = YearRange::new(1995, 2005).unwrap();
        let a = YearIndex::build(&dataset, range).unwrap();
        let b = YearIndex::build(&dataset, range).unwrap();

        for ((ya, pa), (yb, pb)) in a.iter().zip(b.iter()) {
            assert_eq!(ya, yb);
            assert_eq!(pa.as_bytes(), pb.as_bytes());
        }
    }

    #[test]
    fn test_lookup_out_of_range_rejected() {
        let index = YearIndex::build(&usa_fra(), YearRange::default()).unwrap();

        assert!(matches!(
            index.lookup(1899),
            Err(IndexError::OutOfRange { year: 1899, start: 1900, end: 2013 })
        ));
        assert!(matches!(index.lookup(2014), Err(IndexError::OutOfRange { .. })));
    }

    #[test]
    fn test_lookup_shares_payload() {
        let index = YearIndex::build(&usa_fra(), YearRange::default()).unwrap();
        let a = index.lookup(2000).unwrap();
        let b = index.lookup(2000).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_empty_range() {
        assert!(matches!(
            YearRange::new(2013, 1900),
            Err(IndexError::EmptyRange { start: 2013, end: 1900 })
        ));
        let single = YearRange::new(2000, 2000).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single.clamp(1800), 2000);
    }
}
