//! Boundary layer loading from GeoJSON.

use geo::{BoundingRect, MultiPolygon};
use geojson::{Feature, GeoJson};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{GeoToolError, Result};
use crate::models::RegionLevel;

/// A single region boundary polygon with metadata
#[derive(Debug, Clone)]
pub struct BoundaryRecord {
    pub name: String,
    /// 9-digit GB code
    pub code: String,
    pub geometry: MultiPolygon<f64>,
}

impl BoundaryRecord {
    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Boundary records of all three levels, in load order
#[derive(Debug, Clone, Default)]
pub struct BoundaryLayers {
    pub provinces: Vec<BoundaryRecord>,
    pub cities: Vec<BoundaryRecord>,
    pub districts: Vec<BoundaryRecord>,
}

impl BoundaryLayers {
    pub fn layer(&self, level: RegionLevel) -> &[BoundaryRecord] {
        match level {
            RegionLevel::Province => &self.provinces,
            RegionLevel::City => &self.cities,
            RegionLevel::District => &self.districts,
        }
    }

    /// Consume into `(level, records)` pairs, province first
    pub fn into_levels(self) -> [(RegionLevel, Vec<BoundaryRecord>); 3] {
        [
            (RegionLevel::Province, self.provinces),
            (RegionLevel::City, self.cities),
            (RegionLevel::District, self.districts),
        ]
    }
}

/// Load one level from a GeoJSON FeatureCollection.
///
/// Features need a `name` property and a `gb` (or `code`) property, and a
/// Polygon or MultiPolygon geometry. Anything else is skipped.
pub fn load_layer<P: AsRef<Path>>(path: P, level: RegionLevel) -> Result<Vec<BoundaryRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| GeoToolError::data_load(path, e))?;
    let records = parse_layer(&text, level).map_err(|e| GeoToolError::data_load(path, e))?;

    info!(
        "Loaded {} {} boundaries from {}",
        records.len(),
        level,
        path.display()
    );
    Ok(records)
}

/// Parse GeoJSON text into boundary records
pub fn parse_layer(text: &str, level: RegionLevel) -> std::result::Result<Vec<BoundaryRecord>, String> {
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| e.to_string())?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err("expected a FeatureCollection, found a bare geometry".to_string())
        }
    };

    let mut records = Vec::with_capacity(features.len());
    for (i, feature) in features.into_iter().enumerate() {
        match feature_to_record(feature) {
            Some(record) => records.push(record),
            None => warn!("Skipping {} feature #{}: missing name, code or polygon", level, i),
        }
    }
    Ok(records)
}

fn feature_to_record(feature: Feature) -> Option<BoundaryRecord> {
    let name = feature.property("name").and_then(JsonValue::as_str)?.trim().to_string();
    let code = feature
        .property("gb")
        .or_else(|| feature.property("code"))
        .and_then(property_to_code)?;
    if name.is_empty() {
        return None;
    }

    let geometry = geo_types::Geometry::<f64>::try_from(feature.geometry?.value).ok()?;
    let geometry = match geometry {
        geo_types::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        geo_types::Geometry::MultiPolygon(mp) => mp,
        _ => return None,
    };

    Some(BoundaryRecord {
        name,
        code,
        geometry,
    })
}

/// Codes show up both as strings and as bare numbers
fn property_to_code(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => n.as_u64().map(|n| n.to_string()),
        _ => None,
    }
}
