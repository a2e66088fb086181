//! Check command implementation

use crate::cli::CheckArgs;
use crate::config_loader::load_params;
use crate::output::OutputWriter;
use crate::output_types::{CheckOutput, PairRow};
use anyhow::{Context, Result};
use overlapcheck_core::formats::geojson::write_feature_collection;
use overlapcheck_geo::OverlapChecker;
use std::path::Path;

pub fn execute(args: CheckArgs, config: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let params = load_params(config, args.params.overrides())?;
    let checker = OverlapChecker::new(params);

    let result = checker
        .check(args.left.as_path(), args.right.as_path())
        .context("Failed to run intersection checks")?;

    // Row numbers always refer to the unfiltered result so they can be passed to `explore`
    let mut rows = PairRow::from_result(&result);
    if args.valid_only {
        rows.retain(|row| row.is_valid_intersection);
    }

    if let Some(ref path) = args.output {
        let written = if args.valid_only { result.retain_valid() } else { result.clone() };
        write_feature_collection(path, &written.to_feature_collection())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if output.is_json() {
        output.result(CheckOutput {
            left: args.left.display().to_string(),
            right: args.right.display().to_string(),
            crs: result.crs.to_string(),
            opening_distance: params.opening_distance,
            min_area: params.min_area,
            pair_count: result.len(),
            valid_count: result.valid_count(),
            output_file: args.output.as_ref().map(|p| p.display().to_string()),
            pairs: rows,
        })?;
        return Ok(());
    }

    let unit = result.crs.unit.symbol();
    output.section("Overlap Check");
    output.kv("Left", args.left.display());
    output.kv("Right", args.right.display());
    output.kv("CRS", &result.crs);
    output.kv("Opening distance", format!("{} {}", params.opening_distance, unit));
    output.kv("Minimum area", format!("{} {}²", params.min_area, unit));

    output.section("Intersecting Pairs");
    output.table(rows);

    if result.is_empty() {
        output.info("No intersecting pairs found");
    } else {
        output.success(format!(
            "{} of {} intersecting pairs are valid intersections",
            result.valid_count(),
            result.len()
        ));
    }

    if let Some(ref path) = args.output {
        output.info(format!("Result written to {}", path.display()));
    }

    Ok(())
}
