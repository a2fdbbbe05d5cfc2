//! Terminal choropleth of yearly temperature anomaly by country.
//!
//! Anomalies are averaged per country and year, left-joined onto country
//! boundaries, and serialized once per year into a [`index::YearIndex`].
//! The interactive map swaps whole precomputed snapshots on each slider
//! change.

pub mod app;
pub mod braille;
pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod index;
pub mod logging;
pub mod map;
pub mod ui;
pub mod widget;

use anyhow::Result;
use data::{JoinedDataset, JoinReport};
use index::{YearIndex, YearRange};

/// Load both inputs, join them and build the year index
pub fn prepare(args: &cli::DataArgs) -> Result<(YearIndex, JoinReport)> {
    let range = YearRange::new(args.start, args.end)?;
    let anomalies = data::load_anomalies(&args.anomalies)?;
    let boundaries = data::load_boundaries(&args.boundaries, &args.name_field)?;

    let (dataset, report) = JoinedDataset::join(boundaries, &anomalies);
    let index = YearIndex::build(&dataset, range)?;
    Ok((index, report))
}
