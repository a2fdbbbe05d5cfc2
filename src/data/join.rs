use super::{AnomalyRecord, CountryGeometry};
use std::collections::{BTreeSet, HashMap};

/// One (country, year) row of the joined dataset.
/// Countries without any anomaly data keep a single row with `year: None`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    /// Index into `JoinedDataset::countries`
    pub country: usize,
    pub year: Option<i32>,
    pub monthly_anomaly: Option<f64>,
}

/// Geometry left-joined with yearly anomalies on country name
#[derive(Debug, Clone)]
pub struct JoinedDataset {
    pub countries: Vec<CountryGeometry>,
    pub rows: Vec<JoinedRow>,
}

/// What the join matched and what it dropped
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JoinReport {
    /// Geometry countries with at least one anomaly row
    pub matched: usize,
    /// Geometry countries with no anomaly data (rendered as missing every year)
    pub without_data: Vec<String>,
    /// Anomaly countries with no geometry; dropped by the left join
    pub dropped: Vec<String>,
}

impl JoinedDataset {
    /// Left-join anomalies onto geometry by exact country name.
    /// Anomaly countries absent from the geometry are dropped, never added.
    pub fn join(countries: Vec<CountryGeometry>, anomalies: &[AnomalyRecord]) -> (Self, JoinReport) {
        let mut by_country: HashMap<&str, Vec<&AnomalyRecord>> = HashMap::new();
        for record in anomalies {
            by_country.entry(record.country.as_str()).or_default().push(record);
        }

        let mut report = JoinReport::default();
        let mut rows = Vec::with_capacity(anomalies.len() + countries.len());

        for (idx, geom) in countries.iter().enumerate() {
            match by_country.get(geom.country.as_str()) {
                Some(records) => {
                    report.matched += 1;
                    rows.extend(records.iter().map(|r| JoinedRow {
                        country: idx,
                        year: Some(r.year),
                        monthly_anomaly: r.monthly_anomaly,
                    }));
                }
                None => {
                    report.without_data.push(geom.country.clone());
                    rows.push(JoinedRow {
                        country: idx,
                        year: None,
                        monthly_anomaly: None,
                    });
                }
            }
        }

        let known: BTreeSet<&str> = countries.iter().map(|c| c.country.as_str()).collect();
        report.dropped = by_country
            .keys()
            .filter(|name| !known.contains(*name))
            .map(|name| name.to_string())
            .collect();
        report.dropped.sort();

        log::info!(
            "joined {} countries: {} with data, {} without, {} anomaly countries dropped",
            countries.len(),
            report.matched,
            report.without_data.len(),
            report.dropped.len()
        );
        if !report.dropped.is_empty() {
            log::debug!("dropped (no geometry): {}", report.dropped.join(", "));
        }

        (Self { countries, rows }, report)
    }

    /// Every geometry country paired with its anomaly for `year`, in geometry order.
    /// Countries without a row for `year` pair with `None`.
    pub fn partition(&self, year: i32) -> Vec<(&CountryGeometry, Option<f64>)> {
        let for_year: HashMap<usize, Option<f64>> = self
            .rows
            .iter()
            .filter(|row| row.year == Some(year))
            .map(|row| (row.country, row.monthly_anomaly))
            .collect();

        self.countries
            .iter()
            .enumerate()
            .map(|(idx, geom)| (geom, for_year.get(&idx).copied().flatten()))
            .collect()
    }
}
