use geo::{MultiPolygon, Polygon};
use serde_json::Value;
use std::collections::BTreeMap;

use super::crs::Crs;

/// Attribute table of a single feature
pub type Properties = BTreeMap<String, Value>;

/// Polygon feature with attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature identifier (source id, or the record position)
    pub id: String,

    /// Polygonal geometry. Empty for records without geometry.
    pub geometry: MultiPolygon<f64>,

    /// Feature attributes
    pub properties: Properties,
}

impl Feature {
    /// Create a feature from a multipolygon
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self { id: id.into(), geometry, properties: Properties::new() }
    }

    /// Create a feature from a single polygon
    pub fn from_polygon(id: impl Into<String>, polygon: Polygon<f64>) -> Self {
        Self::new(id, MultiPolygon::new(vec![polygon]))
    }

    /// Add an attribute
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Check if this feature has any geometry
    pub fn has_geometry(&self) -> bool {
        !self.geometry.0.is_empty()
    }
}

/// Ordered polygon collection sharing one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialCollection {
    /// Collection name (file stem for loaded data)
    pub name: String,

    /// CRS of every geometry in the collection
    pub crs: Option<Crs>,

    /// Features in source order
    pub features: Vec<Feature>,
}

impl SpatialCollection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>, crs: Option<Crs>) -> Self {
        Self { name: name.into(), crs, features: Vec::new() }
    }

    /// Create a collection from features
    pub fn with_features(name: impl Into<String>, crs: Option<Crs>, features: Vec<Feature>) -> Self {
        Self { name: name.into(), crs, features }
    }

    /// Append a feature
    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Replace the CRS label. Coordinates are left untouched.
    pub fn set_crs(&mut self, crs: Crs) {
        self.crs = Some(crs);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}
