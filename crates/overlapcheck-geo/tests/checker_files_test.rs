//! End-to-end checks reading inputs from disk

use overlapcheck_core::formats::geojson::write_feature_collection;
use overlapcheck_core::formats::FormatRegistry;
use overlapcheck_core::models::CheckParams;
use overlapcheck_core::OverlapError;
use overlapcheck_geo::{explore_pair, OverlapChecker};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::PolygonRing;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FARMS: &str = r#"{
    "type": "FeatureCollection",
    "crs": { "type": "name", "properties": { "name": "EPSG:32723" } },
    "features": [
        { "type": "Feature", "id": "farm-a", "properties": { "owner": "Silva", "area_ha": 1.0 },
          "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [100, 0], [100, 100], [0, 100], [0, 0]]] } },
        { "type": "Feature", "id": "farm-b", "properties": { "owner": "Costa", "area_ha": 1.0 },
          "geometry": { "type": "Polygon", "coordinates": [[[300, 0], [400, 0], [400, 100], [300, 100], [300, 0]]] } }
    ]
}"#;

const RESERVES: &str = r#"{
    "type": "FeatureCollection",
    "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::32723" } },
    "features": [
        { "type": "Feature", "id": "reserve-1", "properties": { "owner": "State" },
          "geometry": { "type": "Polygon", "coordinates": [[[50, 50], [150, 50], [150, 150], [50, 150], [50, 50]]] } },
        { "type": "Feature", "id": "reserve-2", "properties": { "owner": "State" },
          "geometry": { "type": "Polygon", "coordinates": [[[400, 0], [500, 0], [500, 100], [400, 100], [400, 0]]] } }
    ]
}"#;

const ESRI_UTM23S_PRJ: &str = r#"PROJCS["WGS_1984_UTM_Zone_23S",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",10000000.0],PARAMETER["Central_Meridian",-45.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

/// One 100x100 reserve at (50, 50), with an ESRI `.prj`
fn write_reserve_shapefile(dir: &Path) -> PathBuf {
    let shp_path = dir.join("reserves.shp");
    let table = TableWriterBuilder::new().add_character_field(FieldName::try_from("owner").unwrap(), 20);
    let mut writer = shapefile::Writer::from_path(&shp_path, table).unwrap();

    let square = shapefile::Polygon::new(PolygonRing::Outer(vec![
        shapefile::Point::new(50.0, 50.0),
        shapefile::Point::new(50.0, 150.0),
        shapefile::Point::new(150.0, 150.0),
        shapefile::Point::new(150.0, 50.0),
        shapefile::Point::new(50.0, 50.0),
    ]));
    let mut record = Record::default();
    record.insert("owner".to_string(), FieldValue::Character(Some("State".to_string())));
    writer.write_shape_and_record(&square, &record).unwrap();
    drop(writer);

    fs::write(dir.join("reserves.prj"), ESRI_UTM23S_PRJ).unwrap();
    shp_path
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_check_geojson_files() {
    let temp_dir = TempDir::new().unwrap();
    let farms = write(temp_dir.path(), "farms.geojson", FARMS);
    let reserves = write(temp_dir.path(), "reserves.geojson", RESERVES);

    let checker = OverlapChecker::new(CheckParams::new(10.0, 1000.0));
    let result = checker.check(farms.as_path(), reserves.as_path()).unwrap();

    assert_eq!(result.len(), 2);

    let overlap = &result.pairs[0];
    assert_eq!((overlap.left_id.as_str(), overlap.right_id.as_str()), ("farm-a", "reserve-1"));
    assert!((overlap.intersection_area - 2500.0).abs() < 1e-6);
    assert!(overlap.is_valid_intersection);

    let touch = &result.pairs[1];
    assert_eq!((touch.left_id.as_str(), touch.right_id.as_str()), ("farm-b", "reserve-2"));
    assert_eq!(touch.intersection_area, 0.0);
    assert!(!touch.is_valid_intersection);

    assert_eq!(result.valid_count(), 1);
}

#[test]
fn test_shapefile_with_esri_prj_matches_epsg_geojson() {
    let temp_dir = TempDir::new().unwrap();
    let farms = write(temp_dir.path(), "farms.geojson", FARMS);
    let reserves = write_reserve_shapefile(temp_dir.path());

    // Same CRS in two spellings: no mismatch under the default reject policy
    let result = OverlapChecker::new(CheckParams::new(10.0, 1000.0)).check(farms, reserves).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.crs.epsg, Some(32723));
    assert_eq!(result.pairs[0].left_id, "farm-a");
    assert!((result.pairs[0].intersection_area - 2500.0).abs() < 1e-6);
    assert!(result.pairs[0].is_valid_intersection);
}

#[test]
fn test_result_round_trips_through_geojson() {
    let temp_dir = TempDir::new().unwrap();
    let farms = write(temp_dir.path(), "farms.geojson", FARMS);
    let reserves = write(temp_dir.path(), "reserves.geojson", RESERVES);
    let output = temp_dir.path().join("overlaps.geojson");

    let result = OverlapChecker::new(CheckParams::new(10.0, 1000.0)).check(farms, reserves).unwrap();
    write_feature_collection(&output, &result.to_feature_collection()).unwrap();

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let features = written["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"]["owner_left"], "Silva");
    assert_eq!(features[0]["properties"]["owner_right"], "State");
    assert_eq!(features[0]["properties"]["area_ha"], 1.0);
    assert_eq!(features[0]["properties"]["index_right"], 0);
    assert_eq!(features[0]["properties"]["is_valid_intersection"], true);
    assert!(features[1]["properties"]["intersection_geom"].as_str().unwrap().starts_with("MULTILINESTRING"));
    assert_eq!(written["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::32723");

    // Written results carry a CRS and can be read back as polygon input
    let reread = FormatRegistry::default().read(&output).unwrap();
    assert_eq!(reread.len(), 2);
    assert_eq!(reread.crs.and_then(|c| c.epsg), Some(32723));
}

#[test]
fn test_explore_file_result() {
    let temp_dir = TempDir::new().unwrap();
    let farms = write(temp_dir.path(), "farms.geojson", FARMS);
    let reserves = write(temp_dir.path(), "reserves.geojson", RESERVES);
    let result = OverlapChecker::default().check(farms, reserves).unwrap();

    let map = explore_pair(&result, 1).unwrap();
    assert_eq!(map.left_id, "farm-b");
    assert!(map.to_html().unwrap().contains("intersection_geom"));

    assert!(matches!(explore_pair(&result, 5), Err(OverlapError::RowOutOfRange { index: 5, len: 2 })));
}

#[test]
fn test_missing_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let farms = write(temp_dir.path(), "farms.geojson", FARMS);
    let missing = temp_dir.path().join("missing.geojson");

    let err = OverlapChecker::default().check(farms, missing.clone()).unwrap_err();
    assert!(matches!(err, OverlapError::FileNotFound { path } if path == missing));
}
