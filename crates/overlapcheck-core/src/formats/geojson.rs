//! GeoJSON format reader and writer

use ::geojson::{feature::Id, FeatureCollection, GeoJson, JsonObject, Value};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use std::fs;
use std::path::Path;

use crate::error::{OverlapError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{FormatReader, FormatValidation};
use crate::models::{Crs, Feature, Properties, SpatialCollection};

/// GeoJSON format reader
pub struct GeoJsonReader;

impl FormatReader for GeoJsonReader {
    fn read(&self, path: &Path) -> Result<SpatialCollection> {
        let content = fs::read_to_string(path)?;

        let geojson: GeoJson = content.parse().map_err(|e| OverlapError::FormatError {
            format: "GeoJSON".to_string(),
            message: format!("Failed to parse GeoJSON: {}", e),
        })?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();

        let collection = self.extract_collection(name, &geojson)?;
        if collection.crs.is_none() {
            tracing::warn!(
                path = %path.display(),
                "GeoJSON has no crs member; the collection CRS is unset"
            );
        }
        Ok(collection)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }

    fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let json_validation = FormatValidator::validate_json_structure(path);

        if json_validation.is_valid() {
            match fs::read_to_string(path) {
                Ok(content) => match content.parse::<GeoJson>() {
                    Ok(geojson) => {
                        if top_level_crs(&geojson).is_none() {
                            validation
                                .warnings
                                .push("No crs member; a projected CRS must be assigned".to_string());
                        }
                    }
                    Err(e) => validation.errors.push(format!("Invalid GeoJSON: {}", e)),
                },
                Err(e) => validation.errors.push(format!("Cannot read file: {}", e)),
            }
        }

        Ok(FormatValidator::merge_validations(vec![validation, json_validation]))
    }
}

impl GeoJsonReader {
    /// Build a collection from any GeoJSON object
    pub fn extract_collection(&self, name: String, geojson: &GeoJson) -> Result<SpatialCollection> {
        let crs = top_level_crs(geojson);

        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc
                .features
                .iter()
                .enumerate()
                .map(|(idx, feature)| convert_feature(feature, idx))
                .collect::<Result<Vec<_>>>()?,
            GeoJson::Feature(feature) => vec![convert_feature(feature, 0)?],
            GeoJson::Geometry(geometry) => {
                let multipolygon =
                    to_multipolygon(&geometry.value).map_err(|reason| OverlapError::InvalidGeometry {
                        feature_id: "0".to_string(),
                        reason,
                    })?;
                vec![Feature::new("0", multipolygon)]
            }
        };

        Ok(SpatialCollection::with_features(name, crs, features))
    }
}

/// Write a feature collection as pretty-printed GeoJSON
pub fn write_feature_collection(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let content = serde_json::to_string_pretty(collection)
        .map_err(|e| OverlapError::Serialization(format!("Failed to serialize GeoJSON: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}

fn top_level_crs(geojson: &GeoJson) -> Option<Crs> {
    let members = match geojson {
        GeoJson::FeatureCollection(fc) => fc.foreign_members.as_ref(),
        GeoJson::Feature(feature) => feature.foreign_members.as_ref(),
        GeoJson::Geometry(geometry) => geometry.foreign_members.as_ref(),
    };
    members.and_then(|fm| fm.get("crs")).and_then(crs_from_member)
}

/// Read a legacy `{"type": "name", "properties": {"name": ...}}` member
fn crs_from_member(crs: &serde_json::Value) -> Option<Crs> {
    crs.get("properties")?.get("name")?.as_str().and_then(Crs::from_name)
}

fn convert_feature(feature: &::geojson::Feature, idx: usize) -> Result<Feature> {
    let id = feature
        .id
        .as_ref()
        .map(|id| match id {
            Id::String(s) => s.clone(),
            Id::Number(n) => n.to_string(),
        })
        .unwrap_or_else(|| idx.to_string());

    let geometry = match &feature.geometry {
        Some(geometry) => to_multipolygon(&geometry.value)
            .map_err(|reason| OverlapError::InvalidGeometry { feature_id: id.clone(), reason })?,
        None => MultiPolygon::new(vec![]),
    };

    let properties: Properties = feature
        .properties
        .as_ref()
        .map(|props: &JsonObject| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    Ok(Feature { id, geometry, properties })
}

/// Convert a GeoJSON geometry value into a multipolygon.
///
/// Only polygonal values are accepted; Z ordinates are dropped.
pub fn to_multipolygon(value: &Value) -> std::result::Result<MultiPolygon<f64>, String> {
    match value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
        Value::MultiPolygon(polygons) => Ok(MultiPolygon::new(
            polygons.iter().map(|rings| polygon_from_rings(rings)).collect::<std::result::Result<_, _>>()?,
        )),
        Value::GeometryCollection(geometries) => {
            let mut polygons = Vec::new();
            for geometry in geometries {
                polygons.extend(to_multipolygon(&geometry.value)?.0);
            }
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(format!("expected Polygon or MultiPolygon, found {}", value_type_name(other))),
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> std::result::Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .map(|position| match position.as_slice() {
                [x, y, ..] => Ok(Coord { x: *x, y: *y }),
                _ => Err(format!("position needs at least 2 ordinates, found {}", position.len())),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(LineString::new)
    });

    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => return Ok(Polygon::new(LineString::new(vec![]), vec![])),
    };
    let interiors = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
