use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One raw row of the anomaly table. Extra columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnomaly {
    pub country: String,
    pub year: i32,
    pub monthly_anomaly: Option<f64>,
}

/// Mean monthly anomaly for one country and year
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRecord {
    pub country: String,
    pub year: i32,
    /// `None` when every raw value in the group was missing
    pub monthly_anomaly: Option<f64>,
}

/// Read the anomaly CSV and average it by (country, year)
pub fn load_anomalies(path: &Path) -> Result<Vec<AnomalyRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open anomaly table: {}", path.display()))?;

    let mut raw = Vec::new();
    for (line, result) in rdr.deserialize::<RawAnomaly>().enumerate() {
        let row = result.with_context(|| format!("Bad anomaly row {} in {}", line + 1, path.display()))?;
        raw.push(row);
    }

    let records = aggregate(raw);
    log::info!(
        "aggregated anomaly table {} into {} country-years",
        path.display(),
        records.len()
    );
    Ok(records)
}

/// Group raw rows by (country, year) and take the mean of the present values.
/// Output is sorted by country, then year.
pub fn aggregate<I>(raw: I) -> Vec<AnomalyRecord>
where
    I: IntoIterator<Item = RawAnomaly>,
{
    // (sum, count of valid values)
    let mut groups: BTreeMap<(String, i32), (f64, u32)> = BTreeMap::new();

    for row in raw {
        let entry = groups.entry((row.country, row.year)).or_insert((0.0, 0));
        if let Some(v) = row.monthly_anomaly.filter(|v| !v.is_nan()) {
            entry.0 += v;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|((country, year), (sum, count))| AnomalyRecord {
            country,
            year,
            monthly_anomaly: (count > 0).then(|| sum / count as f64),
        })
        .collect()
}
