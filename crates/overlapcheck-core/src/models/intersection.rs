//! Output records of an intersection check.

use geo::{Geometry, MultiPolygon};
use geojson::{Feature as GeoJsonFeature, FeatureCollection, JsonObject};
use serde_json::{json, Value};
use wkt::ToWkt;

use super::collection::Properties;
use super::crs::Crs;
use super::params::CheckParams;

/// One row of the spatial join, annotated with the overlap diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    /// Position of the left feature in the left collection
    pub left_index: usize,

    /// Position of the right feature in the right collection
    pub right_index: usize,

    pub left_id: String,
    pub right_id: String,

    pub left_properties: Properties,
    pub right_properties: Properties,

    pub geometry_left: MultiPolygon<f64>,

    /// Right geometry, denormalized onto the row
    pub geometry_right: MultiPolygon<f64>,

    /// Exact intersection. Polygonal when the overlap has area, otherwise
    /// the lower-dimensional contact (shared edges or touching corners).
    pub intersection_geom: Geometry<f64>,

    /// Intersection after erosion then dilation by the opening distance
    pub intersection_geom_open: MultiPolygon<f64>,

    /// Planar area of the intersection, in CRS units squared
    pub intersection_area: f64,

    /// Opened geometry non-empty and area at least the minimum
    pub is_valid_intersection: bool,
}

impl MatchedPair {
    /// Merged attribute row.
    ///
    /// Keys present on both sides get `_left` / `_right` suffixes; the
    /// position of the right feature is reported as `index_right`.
    pub fn attributes(&self) -> Properties {
        let mut merged = Properties::new();

        for (key, value) in &self.left_properties {
            if self.right_properties.contains_key(key) {
                merged.insert(format!("{}_left", key), value.clone());
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &self.right_properties {
            if self.left_properties.contains_key(key) {
                merged.insert(format!("{}_right", key), value.clone());
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }

        merged.insert("index_right".to_string(), Value::from(self.right_index));
        merged
    }

    /// Kind of geometry the intersection collapsed to
    pub fn intersection_kind(&self) -> &'static str {
        match &self.intersection_geom {
            Geometry::MultiPolygon(_) | Geometry::Polygon(_) => "area",
            Geometry::MultiLineString(_) | Geometry::LineString(_) | Geometry::Line(_) => "edge",
            Geometry::MultiPoint(_) | Geometry::Point(_) => "point",
            _ => "empty",
        }
    }

    fn to_geojson_feature(&self, row: usize) -> GeoJsonFeature {
        let mut properties = JsonObject::new();
        for (key, value) in self.attributes() {
            properties.insert(key, value);
        }
        properties.insert("left_id".to_string(), Value::from(self.left_id.clone()));
        properties.insert("right_id".to_string(), Value::from(self.right_id.clone()));
        properties.insert("geometry_right".to_string(), Value::from(self.geometry_right.wkt_string()));
        properties
            .insert("intersection_geom".to_string(), Value::from(self.intersection_geom.wkt_string()));
        properties.insert(
            "intersection_geom_open".to_string(),
            Value::from(self.intersection_geom_open.wkt_string()),
        );
        properties.insert("intersection_area".to_string(), json!(self.intersection_area));
        properties
            .insert("is_valid_intersection".to_string(), Value::from(self.is_valid_intersection));

        GeoJsonFeature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry_left))),
            id: Some(geojson::feature::Id::Number(row.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// All rows of an intersection check, valid and invalid
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionResult {
    /// CRS shared by every geometry of the result
    pub crs: Crs,

    /// Parameters the check ran with
    pub params: CheckParams,

    /// Rows ordered by left position, then right position
    pub pairs: Vec<MatchedPair>,
}

impl IntersectionResult {
    pub fn new(crs: Crs, params: CheckParams, pairs: Vec<MatchedPair>) -> Self {
        Self { crs, params, pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Row by integer position
    pub fn get(&self, row: usize) -> Option<&MatchedPair> {
        self.pairs.get(row)
    }

    /// Rows flagged as valid intersections
    pub fn valid_pairs(&self) -> impl Iterator<Item = &MatchedPair> {
        self.pairs.iter().filter(|pair| pair.is_valid_intersection)
    }

    pub fn valid_count(&self) -> usize {
        self.valid_pairs().count()
    }

    /// Copy of the result keeping only valid rows
    pub fn retain_valid(&self) -> Self {
        Self {
            crs: self.crs.clone(),
            params: self.params,
            pairs: self.valid_pairs().cloned().collect(),
        }
    }

    /// GeoJSON rendering: the left geometry is the feature geometry, the
    /// other geometry columns are carried as WKT properties.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features =
            self.pairs.iter().enumerate().map(|(row, pair)| pair.to_geojson_feature(row)).collect();

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("crs".to_string(), crs_member(&self.crs));

        FeatureCollection { bbox: None, features, foreign_members: Some(foreign_members) }
    }
}

/// Legacy GeoJSON `crs` member for a CRS
pub fn crs_member(crs: &Crs) -> Value {
    let name = match crs.epsg {
        Some(code) => format!("urn:ogc:def:crs:EPSG::{}", code),
        None => crs.name.clone(),
    };
    json!({ "type": "name", "properties": { "name": name } })
}
