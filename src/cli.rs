use crate::data::DEFAULT_NAME_FIELD;
use crate::index::YearRange;
use std::path::PathBuf;

/// Browse or export yearly temperature anomaly by country
#[derive(clap::Parser, Debug)]
#[command(name = "anomaly-map", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to this file (the map UI owns the terminal otherwise)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive map in the terminal
    View(ViewArgs),

    /// Write every year's snapshot to <out>/<year>.geojson
    Export(ExportArgs),
}

/// Inputs shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    /// Anomaly table (CSV with country, year, monthly_anomaly columns)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub anomalies: PathBuf,

    /// Country boundaries (.shp or .geojson)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub boundaries: PathBuf,

    /// Boundary attribute holding the country name
    #[arg(long, default_value = DEFAULT_NAME_FIELD)]
    pub name_field: String,

    /// First indexed year
    #[arg(long, default_value_t = YearRange::DEFAULT_START)]
    pub start: i32,

    /// Last indexed year (inclusive)
    #[arg(long, default_value_t = YearRange::DEFAULT_END)]
    pub end: i32,
}

#[derive(clap::Args, Debug)]
pub struct ViewArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Year shown at startup, clamped into the indexed range
    #[arg(long, default_value_t = 2000)]
    pub year: i32,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output directory, created if missing
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub out: PathBuf,
}
