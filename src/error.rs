use thiserror::Error;

/// Errors raised while building or querying the year index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("empty year range: start {start} is after end {end}")]
    EmptyRange { start: i32, end: i32 },

    #[error("year {year} is outside the indexed range {start}..={end}")]
    OutOfRange { year: i32, start: i32, end: i32 },

    #[error("failed to serialize snapshot for year {year}: {source}")]
    Serialize {
        year: i32,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while reading boundary and anomaly inputs
#[derive(Error, Debug)]
pub enum DataError {
    #[error("feature {index} has no string attribute '{field}'")]
    MissingName { index: usize, field: String },

    #[error("feature '{country}' has unsupported geometry type {kind}")]
    UnsupportedGeometry { country: String, kind: String },

    #[error("unsupported boundary file extension: {0}")]
    UnsupportedFormat(String),

    #[error("boundary file is not a FeatureCollection")]
    NotAFeatureCollection,
}
