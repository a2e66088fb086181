//! Map view of a single result row, for visual inspection of an overlap

use geo::{BoundingRect, Geometry, Rect};
use geojson::{Feature as GeoJsonFeature, FeatureCollection, JsonObject};
use overlapcheck_core::error::{OverlapError, Result};
use overlapcheck_core::models::intersection::crs_member;
use overlapcheck_core::models::{Crs, IntersectionResult};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::transform::Reprojector;

pub const GOOGLE_SATELLITE_URL: &str = "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}";
pub const OPENSTREETMAP_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

const LEAFLET_VERSION: &str = "1.9.4";

/// Leaflet path style of a layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: String,
    pub weight: u32,
    pub fill_opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl LayerStyle {
    fn new(color: &str, weight: u32, dash_array: Option<&str>) -> Self {
        Self {
            color: color.to_string(),
            weight,
            fill_opacity: 0.0,
            dash_array: dash_array.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub name: String,
    pub geometry: Geometry<f64>,
    pub style: LayerStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub name: String,
    pub url: String,
    pub attribution: String,
}

/// The left geometry, right geometry and intersection of one row
#[derive(Debug, Clone, PartialEq)]
pub struct PairMap {
    pub row: usize,
    pub left_id: String,
    pub right_id: String,
    pub intersection_area: f64,
    pub is_valid_intersection: bool,

    /// CRS of every layer geometry
    pub crs: Crs,

    /// Overlays, drawn in order
    pub layers: Vec<MapLayer>,

    /// Base layers; the first one is shown initially
    pub tiles: Vec<TileLayer>,

    pub layer_control_collapsed: bool,
}

/// Build the map of result row `row`
pub fn explore_pair(result: &IntersectionResult, row: usize) -> Result<PairMap> {
    let pair = result
        .get(row)
        .ok_or(OverlapError::RowOutOfRange { index: row, len: result.len() })?;

    let layers = vec![
        MapLayer {
            name: "geometry_left".to_string(),
            geometry: Geometry::MultiPolygon(pair.geometry_left.clone()),
            style: LayerStyle::new("red", 2, None),
        },
        MapLayer {
            name: "geometry_right".to_string(),
            geometry: Geometry::MultiPolygon(pair.geometry_right.clone()),
            style: LayerStyle::new("blue", 3, Some("5,5")),
        },
        MapLayer {
            name: "intersection_geom".to_string(),
            geometry: pair.intersection_geom.clone(),
            style: LayerStyle::new("pink", 3, Some("5,5")),
        },
    ];

    let tiles = vec![
        TileLayer {
            name: "OpenStreetMap".to_string(),
            url: OPENSTREETMAP_URL.to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
        },
        TileLayer {
            name: "Google Satellite".to_string(),
            url: GOOGLE_SATELLITE_URL.to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
        },
    ];

    Ok(PairMap {
        row,
        left_id: pair.left_id.clone(),
        right_id: pair.right_id.clone(),
        intersection_area: pair.intersection_area,
        is_valid_intersection: pair.is_valid_intersection,
        crs: result.crs.clone(),
        layers,
        tiles,
        layer_control_collapsed: false,
    })
}

impl PairMap {
    /// Whether the layers can be drawn over web map tiles
    pub fn is_geographic(&self) -> bool {
        self.crs.epsg == Some(4326)
    }

    /// Bounding box of all layers
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.layers
            .iter()
            .filter_map(|layer| layer.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }

    /// Copy of the map with every layer transformed to WGS 84
    pub fn to_wgs84(&self) -> Result<PairMap> {
        let wgs84 = Crs::wgs84();
        let reprojector = Reprojector::new(&self.crs, &wgs84)?;

        let layers = self
            .layers
            .iter()
            .map(|layer| {
                Ok(MapLayer { geometry: reprojector.transform(&layer.geometry)?, ..layer.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PairMap { crs: wgs84, layers, ..self.clone() })
    }

    /// One feature per layer, style carried in the properties
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .layers
            .iter()
            .map(|layer| {
                let mut properties = JsonObject::new();
                properties.insert("layer".to_string(), Value::from(layer.name.clone()));
                if let Value::Object(style) = json!(layer.style) {
                    properties.extend(style);
                }

                GeoJsonFeature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&layer.geometry))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("crs".to_string(), crs_member(&self.crs));
        foreign_members.insert("row".to_string(), Value::from(self.row));

        FeatureCollection { bbox: None, features, foreign_members: Some(foreign_members) }
    }

    /// Standalone Leaflet page.
    ///
    /// Tile layers are only added in WGS 84; any other CRS is drawn on a
    /// planar `L.CRS.Simple` canvas with the raw coordinates.
    pub fn to_html(&self) -> Result<String> {
        let overlays: Vec<Value> = self
            .layers
            .iter()
            .map(|layer| {
                json!({
                    "name": layer.name,
                    "style": layer.style,
                    "data": geojson::Geometry::new(geojson::Value::from(&layer.geometry)),
                })
            })
            .collect();

        let (tiles, map_options) = if self.is_geographic() {
            (self.tiles.clone(), "{}")
        } else {
            (Vec::new(), "{ crs: L.CRS.Simple, minZoom: -10 }")
        };

        let title = format!(
            "Row {}: {} / {} (area {:.2}, {})",
            self.row,
            self.left_id,
            self.right_id,
            self.intersection_area,
            if self.is_valid_intersection { "valid" } else { "invalid" }
        );

        Ok(HTML_TEMPLATE
            .replace("{{LEAFLET_VERSION}}", LEAFLET_VERSION)
            .replace("{{TITLE}}", &escape_html(&title))
            .replace("{{MAP_OPTIONS}}", map_options)
            .replace("{{COLLAPSED}}", if self.layer_control_collapsed { "true" } else { "false" })
            .replace("{{TILES}}", &script_json(&tiles)?)
            .replace("{{LAYERS}}", &script_json(&overlays)?))
    }

    /// Write the HTML page to disk
    pub fn save_html(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_html()?)?;
        tracing::info!(path = %path.display(), row = self.row, "Wrote pair map");
        Ok(())
    }
}

fn script_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map(|s| s.replace("</", "<\\/"))
        .map_err(|e| OverlapError::Serialization(format!("Failed to serialize map layers: {}", e)))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{{LEAFLET_VERSION}}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{{LEAFLET_VERSION}}/dist/leaflet.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
const tiles = {{TILES}};
const layers = {{LAYERS}};
const map = L.map("map", {{MAP_OPTIONS}});
const baseLayers = {};
tiles.forEach((tile, i) => {
  const layer = L.tileLayer(tile.url, { attribution: tile.attribution, maxZoom: 20 });
  if (i === 0) { layer.addTo(map); }
  baseLayers[tile.name] = layer;
});
const overlays = {};
const group = L.featureGroup();
layers.forEach((entry) => {
  const layer = L.geoJSON(entry.data, { style: entry.style }).addTo(map);
  overlays[entry.name] = layer;
  group.addLayer(layer);
});
L.control.layers(baseLayers, overlays, { collapsed: {{COLLAPSED}} }).addTo(map);
const bounds = group.getBounds();
if (bounds.isValid()) { map.fitBounds(bounds); } else { map.setView([0, 0], 1); }
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::spatial_intersection_checks;
    use geo::{polygon, MultiPolygon};
    use overlapcheck_core::models::{CheckParams, Feature, SpatialCollection};

    fn result() -> IntersectionResult {
        let left = SpatialCollection::with_features(
            "left",
            Some(Crs::from_epsg(32723)),
            vec![Feature::from_polygon(
                "a",
                polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
            )],
        );
        let right = SpatialCollection::with_features(
            "right",
            Some(Crs::from_epsg(32723)),
            vec![Feature::from_polygon(
                "b",
                polygon![(x: 50.0, y: 50.0), (x: 150.0, y: 50.0), (x: 150.0, y: 150.0), (x: 50.0, y: 150.0)],
            )],
        );
        spatial_intersection_checks(left, right, &CheckParams::new(10.0, 1000.0)).unwrap()
    }

    #[test]
    fn test_explore_pair_layers() {
        let map = explore_pair(&result(), 0).unwrap();

        let names: Vec<&str> = map.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["geometry_left", "geometry_right", "intersection_geom"]);
        assert_eq!(map.layers[0].style, LayerStyle::new("red", 2, None));
        assert_eq!(map.layers[1].style.dash_array.as_deref(), Some("5,5"));
        assert_eq!(map.layers[2].style.color, "pink");
        assert!(map.tiles.iter().any(|t| t.url == GOOGLE_SATELLITE_URL));
        assert!(!map.layer_control_collapsed);
    }

    #[test]
    fn test_row_out_of_range() {
        let err = explore_pair(&result(), 1).unwrap_err();
        assert!(matches!(err, OverlapError::RowOutOfRange { index: 1, len: 1 }));
    }

    #[test]
    fn test_bounds_cover_all_layers() {
        let bounds = explore_pair(&result(), 0).unwrap().bounds().unwrap();
        assert_eq!(bounds.min().x, 0.0);
        assert_eq!(bounds.max().y, 150.0);
    }

    #[test]
    fn test_feature_collection_carries_style() {
        let collection = explore_pair(&result(), 0).unwrap().to_feature_collection();

        assert_eq!(collection.features.len(), 3);
        let properties = collection.features[1].properties.as_ref().unwrap();
        assert_eq!(properties["layer"], "geometry_right");
        assert_eq!(properties["color"], "blue");
        assert_eq!(properties["dashArray"], "5,5");
        assert_eq!(properties["fillOpacity"], 0.0);
    }

    #[test]
    fn test_projected_html_uses_planar_canvas() {
        let html = explore_pair(&result(), 0).unwrap().to_html().unwrap();

        assert!(html.contains("L.CRS.Simple"));
        assert!(html.contains("\"geometry_left\""));
        assert!(!html.contains("mt1.google.com"));
        assert!(html.contains("collapsed: false"));
    }

    #[test]
    fn test_geographic_html_has_tiles() {
        let mut map = explore_pair(&result(), 0).unwrap();
        map.crs = Crs::wgs84();
        map.layers[0].geometry = Geometry::MultiPolygon(MultiPolygon::new(vec![]));

        let html = map.to_html().unwrap();
        assert!(html.contains("mt1.google.com"));
        assert!(!html.contains("L.CRS.Simple"));
    }

    #[test]
    fn test_save_html() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("pair.html");

        explore_pair(&result(), 0).unwrap().save_html(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
