//! Explore command implementation

use crate::cli::ExploreArgs;
use crate::config_loader::load_params;
use crate::output::OutputWriter;
use crate::output_types::ExploreOutput;
use anyhow::{Context, Result};
use overlapcheck_core::formats::geojson::write_feature_collection;
use overlapcheck_geo::{explore_pair, OverlapChecker};
use std::path::Path;

pub fn execute(args: ExploreArgs, config: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let params = load_params(config, args.params.overrides())?;
    let checker = OverlapChecker::new(params);

    let result = checker
        .check(args.left.as_path(), args.right.as_path())
        .context("Failed to run intersection checks")?;

    let mut map = explore_pair(&result, args.row)?;
    if args.wgs84 {
        map = map.to_wgs84().context("Failed to reproject map layers to WGS 84")?;
    }

    map.save_html(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(ref path) = args.geojson {
        write_feature_collection(path, &map.to_feature_collection())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if output.is_json() {
        output.result(ExploreOutput {
            row: map.row,
            left_id: map.left_id.clone(),
            right_id: map.right_id.clone(),
            crs: map.crs.to_string(),
            intersection_area: map.intersection_area,
            is_valid_intersection: map.is_valid_intersection,
            html_file: args.output.display().to_string(),
            geojson_file: args.geojson.as_ref().map(|p| p.display().to_string()),
        })?;
        return Ok(());
    }

    output.section(format!("Row {}", map.row));
    output.kv("Left", &map.left_id);
    output.kv("Right", &map.right_id);
    output.kv("CRS", &map.crs);
    output.kv(
        "Intersection area",
        format!("{:.2} {}²", map.intersection_area, result.crs.unit.symbol()),
    );
    output.kv("Valid intersection", map.is_valid_intersection);

    if !map.is_geographic() {
        output.warning("Layers are not in WGS 84, drawing without map tiles (use --wgs84 to reproject)");
    }

    output.success(format!("Map written to {}", args.output.display()));
    if let Some(ref path) = args.geojson {
        output.info(format!("Layers written to {}", path.display()));
    }

    Ok(())
}
