//! Synthetic boundary layers and code table shared by unit tests.
//!
//! Layout (lon × lat squares):
//! - 北京市 province and municipality city: 115..118 × 39..41
//!   - 西城区 115..116 × 39..41, 东城区 116..117 × 39.5..40.5,
//!     朝阳区 117..118 × 39.5..40.5 (shares the x=117 edge with 东城区)
//! - 辽宁省 province 120..124 × 39..43, holding a city coded under 黑龙江
//! - 吉林省 province 124..127 × 43..45
//!   - 长春市 124..126 × 43..45: 朝阳区 124..125 × 43..44, 南关区 125..126 × 43..44
//!   - 吉林市 126..127 × 43..45: 船营区 126..127 × 43..44, plus 错位区 at
//!     126..127 × 44..45 coded under 长春市

use geo::{polygon, MultiPolygon};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

use crate::models::RegionLevel;
use crate::pip::{BoundaryLayers, BoundaryRecord};

type Square = (&'static str, &'static str, [f64; 4]);

const PROVINCES: &[Square] = &[
    ("北京市", "156110000", [115.0, 39.0, 118.0, 41.0]),
    ("辽宁省", "156210000", [120.0, 39.0, 124.0, 43.0]),
    ("吉林省", "156220000", [124.0, 43.0, 127.0, 45.0]),
];

const CITIES: &[Square] = &[
    ("北京市", "156110000", [115.0, 39.0, 118.0, 41.0]),
    ("长春市", "156220100", [124.0, 43.0, 126.0, 45.0]),
    ("吉林市", "156220200", [126.0, 43.0, 127.0, 45.0]),
    ("错配市", "156230100", [121.0, 40.0, 123.0, 41.0]),
];

const DISTRICTS: &[Square] = &[
    ("东城区", "156110101", [116.0, 39.5, 117.0, 40.5]),
    ("西城区", "156110102", [115.0, 39.0, 116.0, 41.0]),
    ("朝阳区", "156110105", [117.0, 39.5, 118.0, 40.5]),
    ("朝阳区", "156220104", [124.0, 43.0, 125.0, 44.0]),
    ("南关区", "156220102", [125.0, 43.0, 126.0, 44.0]),
    ("船营区", "156220204", [126.0, 43.0, 127.0, 44.0]),
    ("错位区", "156220105", [126.0, 44.0, 127.0, 45.0]),
];

pub const ADMIN_TABLE: &str = r#"{
    "provinces": [["110000","北京市"],["220000","吉林省"],["810000","香港特别行政区"]],
    "cities": [["110100","北京市"],["220200","吉林市"],["220100","长春市"],["810000","香港特别行政区"]],
    "districts": [
        ["110105","朝阳区"],["110101","东城区"],["110102","西城区"],
        ["220104","朝阳区"],["220102","南关区"],["220204","船营区"],
        ["810001","中西区"],["229901","孤儿区"]
    ]
}"#;

pub fn square([min_x, min_y, max_x, max_y]: [f64; 4]) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
        (x: min_x, y: min_y),
    ]])
}

fn records(squares: &[Square]) -> Vec<BoundaryRecord> {
    squares
        .iter()
        .map(|(name, code, bounds)| BoundaryRecord {
            name: name.to_string(),
            code: code.to_string(),
            geometry: square(*bounds),
        })
        .collect()
}

pub fn layers() -> BoundaryLayers {
    BoundaryLayers {
        provinces: records(PROVINCES),
        cities: records(CITIES),
        districts: records(DISTRICTS),
    }
}

fn feature_collection(squares: &[Square]) -> String {
    let features: Vec<_> = squares
        .iter()
        .map(|(name, code, [min_x, min_y, max_x, max_y])| {
            json!({
                "type": "Feature",
                "properties": {"name": name, "gb": code},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [min_x, min_y], [max_x, min_y], [max_x, max_y],
                        [min_x, max_y], [min_x, min_y]
                    ]]
                }
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features}).to_string()
}

/// Write the fixture layers and code table with default file names
pub fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (level, squares) in [
        (RegionLevel::Province, PROVINCES),
        (RegionLevel::City, CITIES),
        (RegionLevel::District, DISTRICTS),
    ] {
        let path = dir.path().join(format!("china_{}.geojson", level));
        fs::write(path, feature_collection(squares)).unwrap();
    }
    fs::write(dir.path().join("china_admin.json"), ADMIN_TABLE).unwrap();
    dir
}
