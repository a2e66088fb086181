//! CRS preconditions and basic geometry validation

use geo::{LineString, MultiPolygon, Polygon};
use overlapcheck_core::error::{OverlapError, Result, Side};
use overlapcheck_core::models::{SpatialCollection, ValidityMode};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// First error formatted as `location: reason`
    pub fn summary(&self) -> Option<String> {
        self.errors.first().map(|e| format!("{}: {}", e.location, e.reason))
    }
}

/// Ensure both collections carry a projected CRS.
///
/// Runs before any geometry is touched; the left side is checked first. A
/// CRS whose unit is unknown is reported as unresolved, not as geographic.
pub fn check_crs(left: &SpatialCollection, right: &SpatialCollection) -> Result<()> {
    for (side, collection) in [(Side::Left, left), (Side::Right, right)] {
        match &collection.crs {
            None => return Err(OverlapError::CrsMissing { side }),
            Some(crs) if !crs.is_resolved() => {
                return Err(OverlapError::CrsUnresolved { side, crs: crs.to_string() });
            }
            Some(crs) if !crs.is_projected() => {
                return Err(OverlapError::CrsNotProjected { side, crs: crs.to_string() });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Validate a multipolygon: finite coordinates, closed rings of at least 4 positions
pub fn validate_multipolygon(multipolygon: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for (i, polygon) in multipolygon.0.iter().enumerate() {
        let poly_result = validate_polygon(polygon);
        for error in poly_result.errors {
            result.add_error(format!("MultiPolygon[{}].{}", i, error.location), error.reason);
        }
    }

    result
}

fn validate_polygon(polygon: &Polygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    validate_ring(polygon.exterior(), "exterior".to_string(), &mut result);
    for (i, interior) in polygon.interiors().iter().enumerate() {
        validate_ring(interior, format!("interior[{}]", i), &mut result);
    }

    result
}

fn validate_ring(ring: &LineString<f64>, location: String, result: &mut ValidationResult) {
    if ring.0.len() < 4 {
        result.add_error(
            location.clone(),
            format!("ring must have at least 4 points, found {}", ring.0.len()),
        );
    }

    if !ring.is_closed() {
        result.add_error(location.clone(), "ring must be closed (first point == last point)".to_string());
    }

    if let Some(i) = ring.0.iter().position(|c| !c.x.is_finite() || !c.y.is_finite()) {
        result.add_error(format!("{}[{}]", location, i), "coordinates must be finite".to_string());
    }
}

/// Validate every feature of a collection.
///
/// `Strict` fails on the first invalid feature; `Lenient` logs each one and
/// returns how many were found.
pub fn validate_collection(collection: &SpatialCollection, mode: ValidityMode) -> Result<usize> {
    let mut invalid = 0;

    for feature in collection.iter() {
        let validation = validate_multipolygon(&feature.geometry);
        if validation.is_valid {
            continue;
        }

        let reason = validation.summary().unwrap_or_else(|| "invalid geometry".to_string());
        match mode {
            ValidityMode::Strict => {
                return Err(OverlapError::InvalidGeometry { feature_id: feature.id.clone(), reason });
            }
            ValidityMode::Lenient => {
                tracing::warn!(
                    collection = %collection.name,
                    feature = %feature.id,
                    "Invalid geometry kept in lenient mode: {}",
                    reason
                );
                invalid += 1;
            }
        }
    }

    Ok(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};
    use overlapcheck_core::models::{Crs, Feature};

    fn square_collection(crs: Option<Crs>) -> SpatialCollection {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        SpatialCollection::with_features("squares", crs, vec![Feature::from_polygon("a", square)])
    }

    #[test]
    fn test_check_crs_accepts_projected() {
        let utm = Some(Crs::from_epsg(32633));
        assert!(check_crs(&square_collection(utm.clone()), &square_collection(utm)).is_ok());
    }

    #[test]
    fn test_check_crs_missing() {
        let utm = Some(Crs::from_epsg(32633));
        let err = check_crs(&square_collection(utm), &square_collection(None)).unwrap_err();
        assert!(matches!(err, OverlapError::CrsMissing { side: Side::Right }));

        let err = check_crs(&square_collection(None), &square_collection(None)).unwrap_err();
        assert!(matches!(err, OverlapError::CrsMissing { side: Side::Left }));
    }

    #[test]
    fn test_check_crs_geographic() {
        let err = check_crs(&square_collection(Some(Crs::wgs84())), &square_collection(Some(Crs::wgs84())))
            .unwrap_err();
        assert!(matches!(err, OverlapError::CrsNotProjected { side: Side::Left, .. }));
        assert!(err.is_crs_error());
    }

    #[test]
    fn test_check_crs_unresolved_code() {
        let utm = Some(Crs::from_epsg(32633));
        let unknown = Some(Crs::from_epsg(99999));

        let err = check_crs(&square_collection(utm), &square_collection(unknown)).unwrap_err();
        assert!(matches!(err, OverlapError::CrsUnresolved { side: Side::Right, ref crs } if crs.contains("99999")));
    }

    #[test]
    fn test_check_crs_accepts_metric_codes_outside_utm() {
        let lv95 = Some(Crs::from_name("EPSG:2056").unwrap());
        let krovak = Some(Crs::from_name("urn:ogc:def:crs:EPSG::5514").unwrap());
        assert!(check_crs(&square_collection(lv95), &square_collection(krovak)).is_ok());
    }

    #[test]
    fn test_validate_valid_multipolygon() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        assert!(validate_multipolygon(&MultiPolygon::new(vec![square])).is_valid);
        assert!(validate_multipolygon(&MultiPolygon::new(vec![])).is_valid);
    }

    #[test]
    fn test_validate_short_and_non_finite_rings() {
        let short = Polygon::new(
            LineString::new(vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 }]),
            vec![],
        );
        let result = validate_multipolygon(&MultiPolygon::new(vec![short]));
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("at least 4 points"));

        let nan = polygon![(x: 0.0, y: 0.0), (x: f64::NAN, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let result = validate_multipolygon(&MultiPolygon::new(vec![nan]));
        assert!(result.errors.iter().any(|e| e.reason.contains("finite")));
    }

    #[test]
    fn test_validate_collection_modes() {
        let bad = Polygon::new(
            LineString::new(vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 }]),
            vec![],
        );
        let mut collection = square_collection(None);
        collection.push(Feature::from_polygon("broken", bad));

        assert_eq!(validate_collection(&collection, ValidityMode::Lenient).unwrap(), 1);

        let err = validate_collection(&collection, ValidityMode::Strict).unwrap_err();
        assert!(matches!(err, OverlapError::InvalidGeometry { ref feature_id, .. } if feature_id == "broken"));
    }
}
