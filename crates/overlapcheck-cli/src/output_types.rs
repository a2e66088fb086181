use overlapcheck_core::models::{IntersectionResult, MatchedPair};
use serde::Serialize;
use tabled::Tabled;

/// Output for check command
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub left: String,
    pub right: String,
    pub crs: String,
    pub opening_distance: f64,
    pub min_area: f64,
    pub pair_count: usize,
    pub valid_count: usize,
    pub output_file: Option<String>,
    pub pairs: Vec<PairRow>,
}

/// One result row, for both the table and JSON output
#[derive(Debug, Serialize, Tabled)]
pub struct PairRow {
    #[tabled(rename = "Row")]
    pub row: usize,
    #[tabled(rename = "Left")]
    pub left_id: String,
    #[tabled(rename = "Right")]
    pub right_id: String,
    #[tabled(rename = "Contact")]
    pub kind: String,
    #[tabled(rename = "Area", display_with = "display_area")]
    pub intersection_area: f64,
    #[tabled(rename = "Valid")]
    pub is_valid_intersection: bool,
}

impl PairRow {
    pub fn new(row: usize, pair: &MatchedPair) -> Self {
        Self {
            row,
            left_id: pair.left_id.clone(),
            right_id: pair.right_id.clone(),
            kind: pair.intersection_kind().to_string(),
            intersection_area: pair.intersection_area,
            is_valid_intersection: pair.is_valid_intersection,
        }
    }

    pub fn from_result(result: &IntersectionResult) -> Vec<Self> {
        result.pairs.iter().enumerate().map(|(row, pair)| Self::new(row, pair)).collect()
    }
}

fn display_area(area: &f64) -> String {
    format!("{:.2}", area)
}

/// Output for explore command
#[derive(Debug, Serialize)]
pub struct ExploreOutput {
    pub row: usize,
    pub left_id: String,
    pub right_id: String,
    pub crs: String,
    pub intersection_area: f64,
    pub is_valid_intersection: bool,
    pub html_file: String,
    pub geojson_file: Option<String>,
}

/// Output for inspect command
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub path: String,
    pub format: String,
    pub feature_count: usize,
    pub empty_geometries: usize,
    pub invalid_geometries: usize,
    pub crs: Option<String>,
    pub projected: bool,
    pub unit: Option<String>,
    pub warnings: Vec<String>,
    pub config: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Setting")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
