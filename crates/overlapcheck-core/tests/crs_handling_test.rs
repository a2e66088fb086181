//! Integration tests for CRS handling across the format readers
//!
//! This test suite verifies that:
//! - GeoJSON `crs` members and Shapefile `.prj` files are resolved to a CRS
//! - Missing CRS information leaves the collection CRS unset
//! - Projected and geographic definitions are told apart

use overlapcheck_core::formats::FormatRegistry;
use overlapcheck_core::models::{Crs, CrsUnit};
use overlapcheck_core::{ensure_spatial_inputs, SpatialInput};
use std::fs;
use tempfile::TempDir;

fn geojson_with_crs(crs: Option<&str>) -> String {
    let crs_member = crs
        .map(|name| format!(r#""crs": {{ "type": "name", "properties": {{ "name": "{}" }} }},"#, name))
        .unwrap_or_default();
    format!(
        r#"{{
            "type": "FeatureCollection",
            {}
            "features": [
                {{
                    "type": "Feature",
                    "geometry": {{ "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]] }},
                    "properties": {{ "name": "plot" }}
                }}
            ]
        }}"#,
        crs_member
    )
}

#[test]
fn test_geojson_with_projected_crs() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("plots.geojson");
    fs::write(&file_path, geojson_with_crs(Some("EPSG:32633"))).unwrap();

    let collection = FormatRegistry::with_default_readers().read(&file_path).unwrap();
    let crs = collection.crs.unwrap();

    assert_eq!(crs.epsg, Some(32633));
    assert_eq!(crs.unit, CrsUnit::Metre);
    assert!(crs.is_projected());
}

#[test]
fn test_geojson_urn_and_crs84() {
    let temp_dir = TempDir::new().unwrap();
    let urn = temp_dir.path().join("urn.geojson");
    let crs84 = temp_dir.path().join("crs84.json");
    fs::write(&urn, geojson_with_crs(Some("urn:ogc:def:crs:EPSG::27700"))).unwrap();
    fs::write(&crs84, geojson_with_crs(Some("urn:ogc:def:crs:OGC:1.3:CRS84"))).unwrap();

    let (urn, crs84) =
        ensure_spatial_inputs(urn.into(), crs84.into(), &FormatRegistry::default()).unwrap();

    assert_eq!(urn.crs.as_ref().and_then(|c| c.epsg), Some(27700));
    assert_eq!(crs84.crs, Some(Crs::wgs84()));
    assert!(!Crs::wgs84().is_projected());
}

#[test]
fn test_geojson_without_crs_is_unset() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("plain.geojson");
    fs::write(&file_path, geojson_with_crs(None)).unwrap();

    let collection = FormatRegistry::with_default_readers().read(&file_path).unwrap();
    assert!(collection.crs.is_none());
    assert_eq!(collection.features[0].properties["name"], "plot");
}

#[test]
fn test_prj_wkt_definitions() {
    let utm = r#"PROJCS["WGS_1984_UTM_Zone_23S",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",10000000.0],PARAMETER["Central_Meridian",-45.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;
    let geographic = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    let projected = Crs::from_wkt(utm).unwrap();
    assert_eq!(projected.name, "WGS_1984_UTM_Zone_23S");
    assert!(projected.is_projected());
    // ESRI names carry no AUTHORITY node; the code comes from the name
    assert_eq!(projected.epsg, Some(32723));
    assert!(projected.same_as(&Crs::from_name("EPSG:32723").unwrap()));

    assert!(!Crs::from_wkt(geographic).unwrap().is_projected());
    assert!(Crs::from_wkt("LOCAL_CS[\"grid\"]").is_err());
}

#[test]
fn test_collections_keep_their_crs() {
    let registry = FormatRegistry::with_default_readers();
    let left = overlapcheck_core::models::SpatialCollection::new("a", Some(Crs::from_epsg(2154)));
    let right = overlapcheck_core::models::SpatialCollection::new("b", None);

    let (left, right) = ensure_spatial_inputs(
        SpatialInput::Collection(left),
        SpatialInput::Collection(right),
        &registry,
    )
    .unwrap();

    assert_eq!(left.crs.map(|c| c.epsg), Some(Some(2154)));
    assert!(right.crs.is_none());
}
