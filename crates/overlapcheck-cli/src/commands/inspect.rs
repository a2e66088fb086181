//! Inspect command implementation

use crate::cli::InspectArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, InspectOutput};
use anyhow::{Context, Result};
use overlapcheck_core::formats::validation::FormatValidator;
use overlapcheck_core::formats::FormatRegistry;
use overlapcheck_core::OverlapError;
use overlapcheck_geo::transform::resolve_collection_crs;
use overlapcheck_geo::validation::validate_multipolygon;
use std::path::Path;

/// Keys in the order they are printed
const CONFIG_KEYS: [&str; 4] = ["opening_distance", "min_area", "crs_policy", "geometry_validity"];

pub fn execute(args: InspectArgs, config: Option<&Path>, output: &OutputWriter) -> Result<()> {
    if !args.path.exists() {
        return Err(OverlapError::FileNotFound { path: args.path.clone() }.into());
    }

    let registry = FormatRegistry::with_default_readers();
    let reader = registry.detect_format(&args.path)?;
    let format = reader.format_name().to_string();

    let validation = reader.validate(&args.path)?;
    FormatValidator::validation_to_result(&validation, &format)?;
    let mut warnings = validation.warnings;

    let mut collection = registry
        .read(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    resolve_collection_crs(&mut collection);

    let empty_geometries = collection.iter().filter(|f| !f.has_geometry()).count();
    let mut invalid_geometries = 0;
    for feature in collection.iter() {
        let result = validate_multipolygon(&feature.geometry);
        if !result.is_valid {
            invalid_geometries += 1;
            if let Some(summary) = result.summary() {
                warnings.push(format!("Feature {}: {}", feature.id, summary));
            }
        }
    }

    match collection.crs {
        None => warnings.push("No CRS defined; checks will fail until one is set".to_string()),
        Some(ref crs) if !crs.is_resolved() => {
            warnings.push(format!("{} could not be resolved; its axis unit is unknown", crs))
        }
        Some(ref crs) if !crs.is_projected() => {
            warnings.push(format!("{} is not projected; areas and distances are not in metres", crs))
        }
        Some(_) => {}
    }

    let layered = load_config(config)?;
    let inspection = layered.to_inspection_map();
    let config_entries: Vec<ConfigEntry> = CONFIG_KEYS
        .iter()
        .filter_map(|key| {
            inspection.get(*key).map(|(value, source)| ConfigEntry {
                key: key.to_string(),
                value: value.clone(),
                source: source.to_string(),
            })
        })
        .collect();

    let inspect = InspectOutput {
        path: args.path.display().to_string(),
        format,
        feature_count: collection.len(),
        empty_geometries,
        invalid_geometries,
        crs: collection.crs.as_ref().map(|crs| crs.to_string()),
        projected: collection.crs.as_ref().is_some_and(|crs| crs.is_projected()),
        unit: collection.crs.as_ref().map(|crs| crs.unit.symbol().to_string()),
        warnings,
        config: config_entries,
    };

    if output.is_json() {
        output.result(inspect)?;
        return Ok(());
    }

    output.section("Dataset");
    output.kv("Path", &inspect.path);
    output.kv("Format", &inspect.format);
    output.kv("Features", inspect.feature_count);
    output.kv("Empty geometries", inspect.empty_geometries);
    output.kv("Invalid geometries", inspect.invalid_geometries);
    output.kv("CRS", inspect.crs.as_deref().unwrap_or("(none)"));
    output.kv("Projected", inspect.projected);

    for warning in &inspect.warnings {
        output.warning(warning);
    }

    output.section("Check Parameters");
    output.table(inspect.config);

    Ok(())
}
