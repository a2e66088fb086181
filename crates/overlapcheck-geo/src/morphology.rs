//! Morphological operators on polygonal geometry

use geo::{Buffer, HasDimensions, MultiPolygon};

/// Shrink the geometry inward by `distance`
pub fn erode(geometry: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if geometry.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    geometry.buffer(-distance)
}

/// Grow the geometry outward by `distance`
pub fn dilate(geometry: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if geometry.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    geometry.buffer(distance)
}

/// Erosion followed by dilation by the same distance.
///
/// Parts of the geometry narrower than `2 * distance` vanish; wider parts
/// survive with their convex corners rounded. Non-positive distances are
/// passed through to the buffer as-is.
pub fn opening(geometry: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    dilate(&erode(geometry, distance), distance)
}
