//! Overlap checks between two polygon collections

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{
    Area, BooleanOps, Coord, Geometry, GeometryCollection, Intersects, Line, LineString,
    LinesIter, MultiLineString, MultiPoint, MultiPolygon, Point,
};
use overlapcheck_core::error::{OverlapError, Result};
use overlapcheck_core::formats::FormatRegistry;
use overlapcheck_core::input::{ensure_spatial_inputs, SpatialInput};
use overlapcheck_core::models::{CheckParams, IntersectionResult, MatchedPair, SpatialCollection};

use crate::index::spatial_join;
use crate::morphology::opening;
use crate::transform::{harmonize_crs, resolve_collection_crs};
use crate::validation::{check_crs, validate_collection};

/// Join two collections and flag which overlaps are real.
///
/// Both collections must carry a projected CRS; a CRS difference is resolved
/// with `params.crs_policy`. Every intersecting pair becomes one row, in
/// left then right order. A row is a valid intersection when the morphological
/// opening of the overlap by `params.opening_distance` is non-empty and the
/// raw overlap area reaches `params.min_area`.
pub fn spatial_intersection_checks(
    mut left: SpatialCollection,
    mut right: SpatialCollection,
    params: &CheckParams,
) -> Result<IntersectionResult> {
    params.validate()?;
    resolve_collection_crs(&mut left);
    resolve_collection_crs(&mut right);
    check_crs(&left, &right)?;
    let (left, right) = harmonize_crs(left, right, params.crs_policy)?;

    for collection in [&left, &right] {
        let invalid = validate_collection(collection, params.validity_mode)?;
        if invalid > 0 {
            tracing::warn!(
                collection = %collection.name,
                invalid,
                "Collection contains invalid geometries"
            );
        }
    }

    let crs = left.crs.clone().ok_or_else(|| OverlapError::InvalidInput {
        reason: "left collection lost its CRS during harmonization".to_string(),
    })?;

    let pairs: Vec<MatchedPair> = spatial_join(&left, &right)
        .into_iter()
        .map(|(left_index, right_index)| {
            check_pair(&left, left_index, &right, right_index, params)
        })
        .collect();

    let result = IntersectionResult::new(crs, *params, pairs);
    tracing::info!(
        left = %left.name,
        right = %right.name,
        pairs = result.len(),
        valid = result.valid_count(),
        opening_distance = params.opening_distance,
        min_area = params.min_area,
        "Intersection check complete"
    );
    Ok(result)
}

fn check_pair(
    left: &SpatialCollection,
    left_index: usize,
    right: &SpatialCollection,
    right_index: usize,
    params: &CheckParams,
) -> MatchedPair {
    let left_feature = &left.features[left_index];
    let right_feature = &right.features[right_index];

    let (intersection_geom, polygonal) =
        intersection_geometry(&left_feature.geometry, &right_feature.geometry);
    let intersection_geom_open = opening(&polygonal, params.opening_distance);
    let intersection_area = polygonal.unsigned_area();
    let is_valid_intersection =
        !intersection_geom_open.0.is_empty() && intersection_area >= params.min_area;

    tracing::debug!(
        left = %left_feature.id,
        right = %right_feature.id,
        area = intersection_area,
        valid = is_valid_intersection,
        "Checked pair"
    );

    MatchedPair {
        left_index,
        right_index,
        left_id: left_feature.id.clone(),
        right_id: right_feature.id.clone(),
        left_properties: left_feature.properties.clone(),
        right_properties: right_feature.properties.clone(),
        geometry_left: left_feature.geometry.clone(),
        geometry_right: right_feature.geometry.clone(),
        intersection_geom,
        intersection_geom_open,
        intersection_area,
        is_valid_intersection,
    }
}

/// Exact intersection of two polygonal geometries.
///
/// Returns the intersection as reported on the row and its polygonal part.
/// When the overlap has no area the reported geometry is the boundary
/// contact and the polygonal part is empty.
pub fn intersection_geometry(
    left: &MultiPolygon<f64>,
    right: &MultiPolygon<f64>,
) -> (Geometry<f64>, MultiPolygon<f64>) {
    let polygonal = left.intersection(right);
    if !polygonal.0.is_empty() && polygonal.unsigned_area() > 0.0 {
        return (Geometry::MultiPolygon(polygonal.clone()), polygonal);
    }
    (contact_geometry(left, right), MultiPolygon::new(vec![]))
}

/// Shared boundary of two geometries whose interiors do not overlap:
/// common edges as lines, isolated touching vertices as points
fn contact_geometry(left: &MultiPolygon<f64>, right: &MultiPolygon<f64>) -> Geometry<f64> {
    let mut segments: Vec<Line<f64>> = Vec::new();
    let mut points: Vec<Coord<f64>> = Vec::new();

    for a in left.lines_iter() {
        for b in right.lines_iter() {
            match line_intersection(a, b) {
                Some(LineIntersection::Collinear { intersection }) => {
                    if intersection.start == intersection.end {
                        points.push(intersection.start);
                    } else {
                        segments.push(intersection);
                    }
                }
                Some(LineIntersection::SinglePoint { intersection, .. }) => points.push(intersection),
                None => {}
            }
        }
    }

    let mut isolated: Vec<Coord<f64>> = Vec::new();
    for point in points {
        let on_segment = segments.iter().any(|s| s.intersects(&point));
        if !on_segment && !isolated.contains(&point) {
            isolated.push(point);
        }
    }

    let lines = MultiLineString::new(
        segments.into_iter().map(|s| LineString::new(vec![s.start, s.end])).collect(),
    );
    let points = MultiPoint::new(isolated.into_iter().map(Point::from).collect());

    match (lines.0.is_empty(), points.0.is_empty()) {
        (true, true) => Geometry::GeometryCollection(GeometryCollection(Vec::new())),
        (false, true) => Geometry::MultiLineString(lines),
        (true, false) => Geometry::MultiPoint(points),
        (false, false) => Geometry::GeometryCollection(GeometryCollection(vec![
            Geometry::MultiLineString(lines),
            Geometry::MultiPoint(points),
        ])),
    }
}

/// Loads inputs through a format registry and runs intersection checks
/// with a fixed set of parameters
pub struct OverlapChecker {
    registry: FormatRegistry,
    params: CheckParams,
}

impl OverlapChecker {
    pub fn new(params: CheckParams) -> Self {
        Self::with_registry(FormatRegistry::with_default_readers(), params)
    }

    pub fn with_registry(registry: FormatRegistry, params: CheckParams) -> Self {
        Self { registry, params }
    }

    pub fn params(&self) -> &CheckParams {
        &self.params
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Resolve both inputs into collections
    pub fn load(
        &self,
        left: impl Into<SpatialInput>,
        right: impl Into<SpatialInput>,
    ) -> Result<(SpatialCollection, SpatialCollection)> {
        ensure_spatial_inputs(left.into(), right.into(), &self.registry)
    }

    /// Load both inputs and run the intersection checks
    pub fn check(
        &self,
        left: impl Into<SpatialInput>,
        right: impl Into<SpatialInput>,
    ) -> Result<IntersectionResult> {
        let (left, right) = self.load(left, right)?;
        spatial_intersection_checks(left, right, &self.params)
    }
}

impl Default for OverlapChecker {
    fn default() -> Self {
        Self::new(CheckParams::default())
    }
}
