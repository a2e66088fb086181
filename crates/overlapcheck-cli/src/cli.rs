use clap::{Args, Parser, Subcommand, ValueEnum};
use overlapcheck_core::config::CliConfigOverrides;
use overlapcheck_core::models::{CrsPolicy, ValidityMode};
use std::path::PathBuf;

/// overlapcheck - Validate spatial overlap between two polygon datasets
#[derive(Parser, Debug)]
#[command(name = "overlapcheck")]
#[command(about = "Find real overlaps between two polygon datasets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML file with default check parameters
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join two datasets and flag valid intersections
    Check(CheckArgs),

    /// Write a map of one result row
    Explore(ExploreArgs),

    /// Show format, CRS and validation details of a dataset
    Inspect(InspectArgs),
}

/// Check parameters shared by `check` and `explore`
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// Opening distance, in CRS units
    #[arg(long, short = 'd', value_name = "D")]
    pub distance: Option<f64>,

    /// Minimum intersection area, in CRS units squared
    #[arg(long, value_name = "AREA")]
    pub min_area: Option<f64>,

    /// What to do when the datasets use different CRS
    #[arg(long, value_enum)]
    pub crs_policy: Option<CrsPolicyArg>,

    /// Geometry validation mode
    #[arg(long, value_enum)]
    pub validity_mode: Option<ValidityModeArg>,
}

impl ParamArgs {
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            opening_distance: self.distance,
            min_area: self.min_area,
            crs_policy: self.crs_policy.map(Into::into),
            geometry_validity: self.validity_mode.map(Into::into),
        }
    }
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Left dataset (GeoJSON or Shapefile)
    pub left: PathBuf,

    /// Right dataset (GeoJSON or Shapefile)
    pub right: PathBuf,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Only report rows flagged as valid intersections
    #[arg(long)]
    pub valid_only: bool,

    /// Write the result as GeoJSON
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ExploreArgs {
    /// Left dataset (GeoJSON or Shapefile)
    pub left: PathBuf,

    /// Right dataset (GeoJSON or Shapefile)
    pub right: PathBuf,

    /// Result row to display
    #[arg(long, short = 'r')]
    pub row: usize,

    #[command(flatten)]
    pub params: ParamArgs,

    /// HTML file to write
    #[arg(long, short = 'o', value_name = "FILE", default_value = "overlap_map.html")]
    pub output: PathBuf,

    /// Also write the layers as GeoJSON
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,

    /// Reproject the layers to WGS 84 and draw them over map tiles
    #[arg(long)]
    pub wgs84: bool,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Dataset to inspect
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CrsPolicyArg {
    /// Fail on CRS mismatch
    Reject,
    /// Relabel the right dataset with the left CRS
    Override,
    /// Transform the right dataset into the left CRS
    Reproject,
}

impl From<CrsPolicyArg> for CrsPolicy {
    fn from(arg: CrsPolicyArg) -> Self {
        match arg {
            CrsPolicyArg::Reject => CrsPolicy::Reject,
            CrsPolicyArg::Override => CrsPolicy::Override,
            CrsPolicyArg::Reproject => CrsPolicy::Reproject,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ValidityModeArg {
    Strict,
    Lenient,
}

impl From<ValidityModeArg> for ValidityMode {
    fn from(arg: ValidityModeArg) -> Self {
        match arg {
            ValidityModeArg::Strict => ValidityMode::Strict,
            ValidityModeArg::Lenient => ValidityMode::Lenient,
        }
    }
}
