//! Shapefile format reader implementation
//!
//! ESRI Shapefiles consist of multiple component files (.shp, .shx, .dbf,
//! .prj). The first three must be present; the CRS comes from the optional
//! .prj file.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;
use shapefile::dbase::FieldValue as DbaseFieldValue;
use shapefile::{PolygonRing, Reader as ShapefileReader, Shape};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OverlapError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{FormatReader, FormatValidation};
use crate::models::{Crs, Feature, Properties, SpatialCollection};

const REQUIRED_COMPONENTS: [&str; 3] = ["shp", "shx", "dbf"];

/// Shapefile format reader
pub struct ShapefileFormatReader;

impl FormatReader for ShapefileFormatReader {
    fn read(&self, path: &Path) -> Result<SpatialCollection> {
        self.verify_components(path)?;

        let mut reader = ShapefileReader::from_path(path).map_err(|e| OverlapError::FormatError {
            format: "Shapefile".to_string(),
            message: format!("Failed to open Shapefile: {}", e),
        })?;

        let crs = self.extract_crs(path)?;

        let mut features = Vec::new();
        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result.map_err(|e| OverlapError::FormatError {
                format: "Shapefile".to_string(),
                message: format!("Failed to read feature: {}", e),
            })?;

            let id = features.len().to_string();
            let geometry = convert_shape(&shape)
                .map_err(|reason| OverlapError::InvalidGeometry { feature_id: id.clone(), reason })?;

            let properties: Properties =
                record.into_iter().map(|(name, value)| (name, convert_dbase_value(&value))).collect();

            features.push(Feature { id, geometry, properties });
        }

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();
        Ok(SpatialCollection::with_features(name, crs, features))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }

    fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let base = match self.get_shapefile_base(path) {
            Ok(b) => b,
            Err(e) => {
                validation.errors.push(format!("Invalid Shapefile path: {}", e));
                return Ok(validation);
            }
        };

        let component_validation =
            FormatValidator::validate_component_files(&base, &REQUIRED_COMPONENTS, &["prj"]);

        Ok(FormatValidator::merge_validations(vec![validation, component_validation]))
    }
}

impl ShapefileFormatReader {
    /// Get the base path for a Shapefile (without extension)
    fn get_shapefile_base(&self, path: &Path) -> Result<PathBuf> {
        let is_shp = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("shp"))
            .unwrap_or(false);

        if !is_shp {
            return Err(OverlapError::InvalidInput {
                reason: format!("Not a Shapefile (.shp): {}", path.display()),
            });
        }

        Ok(path.with_extension(""))
    }

    /// Verify that all required Shapefile component files exist
    fn verify_components(&self, path: &Path) -> Result<()> {
        let base = self.get_shapefile_base(path)?;
        let missing: Vec<String> = REQUIRED_COMPONENTS
            .iter()
            .filter(|ext| !base.with_extension(ext).exists())
            .map(|ext| format!(".{}", ext))
            .collect();

        if !missing.is_empty() {
            return Err(OverlapError::FormatError {
                format: "Shapefile".to_string(),
                message: format!("Missing required component files: {}", missing.join(", ")),
            });
        }

        Ok(())
    }

    /// Extract the CRS from the .prj file, if any
    fn extract_crs(&self, path: &Path) -> Result<Option<Crs>> {
        let prj_path = self.get_shapefile_base(path)?.with_extension("prj");

        if !prj_path.exists() {
            tracing::warn!(path = %path.display(), "Shapefile has no .prj; the collection CRS is unset");
            return Ok(None);
        }

        let prj_content = fs::read_to_string(&prj_path).map_err(|e| OverlapError::FormatError {
            format: "Shapefile".to_string(),
            message: format!("Failed to read .prj file: {}", e),
        })?;

        match Crs::from_wkt(&prj_content) {
            Ok(crs) => Ok(Some(crs)),
            Err(e) => {
                tracing::warn!(path = %prj_path.display(), error = %e, "Unreadable .prj; the collection CRS is unset");
                Ok(None)
            }
        }
    }
}

/// Convert a shape record into a multipolygon. Z and M values are dropped.
fn convert_shape(shape: &Shape) -> std::result::Result<MultiPolygon<f64>, String> {
    match shape {
        Shape::Polygon(polygon) => {
            Ok(rings_to_multipolygon(polygon.rings(), |p| Coord { x: p.x, y: p.y }))
        }
        Shape::PolygonM(polygon) => {
            Ok(rings_to_multipolygon(polygon.rings(), |p| Coord { x: p.x, y: p.y }))
        }
        Shape::PolygonZ(polygon) => {
            Ok(rings_to_multipolygon(polygon.rings(), |p| Coord { x: p.x, y: p.y }))
        }
        Shape::NullShape => Ok(MultiPolygon::new(vec![])),
        other => Err(format!("expected a polygon shape, found {:?}", other.shapetype())),
    }
}

/// Outer rings start a new polygon; inner rings are holes of the last one
fn rings_to_multipolygon<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => {
                polygons.push((points.iter().map(&xy).collect(), Vec::new()));
            }
            PolygonRing::Inner(points) => {
                let hole: LineString<f64> = points.iter().map(&xy).collect();
                match polygons.last_mut() {
                    Some((_, holes)) => holes.push(hole),
                    None => polygons.push((hole, Vec::new())),
                }
            }
        }
    }

    MultiPolygon::new(
        polygons.into_iter().map(|(exterior, holes)| Polygon::new(exterior, holes)).collect(),
    )
}

/// Convert dBase field value to JSON value
fn convert_dbase_value(value: &DbaseFieldValue) -> Value {
    let number = |n: f64| serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null);

    #[allow(unreachable_patterns)]
    match value {
        DbaseFieldValue::Character(Some(s)) => Value::String(s.trim_end().to_string()),
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Logical(Some(b)) => Value::Bool(*b),
        DbaseFieldValue::Date(Some(date)) => {
            Value::String(format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()))
        }
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Integer(i) => Value::Number((*i).into()),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::DateTime(dt) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::Memo(s) => Value::String(s.clone()),
        _ => Value::Null,
    }
}
