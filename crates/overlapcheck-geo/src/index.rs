use geo::{BoundingRect, Intersects, MultiPolygon};
use overlapcheck_core::models::SpatialCollection;
use rstar::{RTree, RTreeObject, AABB};

/// Feature envelope stored in the R-tree
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEnvelope {
    /// Position of the feature in its collection
    pub index: usize,

    envelope: AABB<[f64; 2]>,
}

impl IndexedEnvelope {
    /// Envelope of a feature geometry; `None` for empty geometries, which
    /// can never satisfy an intersects predicate
    pub fn new(index: usize, geometry: &MultiPolygon<f64>) -> Option<Self> {
        envelope_of(geometry).map(|envelope| Self { index, envelope })
    }
}

/// Axis-aligned envelope of a geometry, `None` when it is empty
pub fn envelope_of(geometry: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    let rect = geometry.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    Some(AABB::from_corners([min.x, min.y], [max.x, max.y]))
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the envelopes of one collection
pub struct SpatialIndex {
    tree: RTree<IndexedEnvelope>,
}

impl SpatialIndex {
    /// Bulk-load an index over every non-empty geometry of a collection
    pub fn from_collection(collection: &SpatialCollection) -> Self {
        let envelopes: Vec<IndexedEnvelope> = collection
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| IndexedEnvelope::new(index, &feature.geometry))
            .collect();

        Self { tree: RTree::bulk_load(envelopes) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Positions whose envelope intersects the envelope of `geometry`,
    /// boundary contact included
    pub fn candidates(&self, geometry: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(query) = envelope_of(geometry) else {
            return Vec::new();
        };

        let mut indices: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(&query).map(|e| e.index).collect();
        indices.sort_unstable();
        indices
    }
}

/// Inner spatial join with the intersects predicate.
///
/// Returns `(left, right)` position pairs ordered by left position, then
/// right position. Pairs that only touch along a boundary are included.
pub fn spatial_join(left: &SpatialCollection, right: &SpatialCollection) -> Vec<(usize, usize)> {
    let index = SpatialIndex::from_collection(right);
    let mut pairs = Vec::new();
    let mut candidate_count = 0;

    for (left_index, feature) in left.iter().enumerate() {
        let candidates = index.candidates(&feature.geometry);
        candidate_count += candidates.len();

        pairs.extend(
            candidates
                .into_iter()
                .filter(|&right_index| feature.geometry.intersects(&right.features[right_index].geometry))
                .map(|right_index| (left_index, right_index)),
        );
    }

    tracing::debug!(
        left = left.len(),
        right = right.len(),
        candidates = candidate_count,
        matches = pairs.len(),
        "Spatial join complete"
    );

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Polygon};
    use overlapcheck_core::models::{Crs, Feature};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]
    }

    fn collection(squares: Vec<Polygon<f64>>) -> SpatialCollection {
        let features = squares
            .into_iter()
            .enumerate()
            .map(|(i, p)| Feature::from_polygon(i.to_string(), p))
            .collect();
        SpatialCollection::with_features("test", Some(Crs::from_epsg(32633)), features)
    }

    #[test]
    fn test_index_skips_empty_geometries() {
        let mut right = collection(vec![square(0.0, 0.0, 10.0)]);
        right.push(Feature::new("empty", MultiPolygon::new(vec![])));

        let index = SpatialIndex::from_collection(&right);
        assert_eq!(index.len(), 1);
        assert!(index.candidates(&MultiPolygon::new(vec![])).is_empty());
    }

    #[test]
    fn test_envelope_of_geometry() {
        let geometry = MultiPolygon::new(vec![square(0.0, 0.0, 10.0), square(20.0, -5.0, 5.0)]);
        let envelope = envelope_of(&geometry).unwrap();
        assert_eq!(envelope.lower(), [0.0, -5.0]);
        assert_eq!(envelope.upper(), [25.0, 10.0]);

        assert!(envelope_of(&MultiPolygon::new(vec![])).is_none());
    }

    #[test]
    fn test_join_orders_by_left_then_right() {
        let left = collection(vec![square(0.0, 0.0, 10.0), square(100.0, 100.0, 10.0)]);
        let right = collection(vec![
            square(105.0, 105.0, 10.0),
            square(5.0, 5.0, 10.0),
            square(-5.0, -5.0, 10.0),
        ]);

        assert_eq!(spatial_join(&left, &right), vec![(0, 1), (0, 2), (1, 0)]);
    }

    #[test]
    fn test_join_includes_boundary_touch() {
        let left = collection(vec![square(0.0, 0.0, 10.0)]);
        let right = collection(vec![square(10.0, 0.0, 10.0), square(10.0, 10.0, 10.0)]);

        assert_eq!(spatial_join(&left, &right), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_join_refines_envelope_candidates() {
        // Envelopes overlap but the triangles do not
        let left = collection(vec![polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 0.0, y: 10.0)]]);
        let right = collection(vec![polygon![(x: 10.0, y: 10.0), (x: 10.0, y: 6.0), (x: 6.0, y: 10.0)]]);

        assert!(spatial_join(&left, &right).is_empty());
    }
}
