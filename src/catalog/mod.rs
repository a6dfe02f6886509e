//! Immutable registry of region records with code and name indices.

use geo::{InteriorPoint, MultiPolygon};
use hashbrown::HashMap;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::{Region, RegionLevel};
use crate::pip::{BoundaryLayers, RegionId};

/// Polygon handed to the spatial index, keyed like the catalog entry
pub type IndexedGeometry = (RegionLevel, RegionId, MultiPolygon<f64>);

/// Normalize a region name for indexing and matching.
///
/// Trims, folds full-width ASCII to half-width, lowercases and squashes
/// runs of whitespace.
pub fn normalize_name(name: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let folded: String = name
        .chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect();

    whitespace.replace_all(folded.trim(), " ").into_owned()
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

pub struct RegionCatalog {
    regions: Vec<Region>,
    by_level: [Vec<RegionId>; 3],
    /// First record loaded for each code
    code_index: HashMap<String, RegionId>,
    level_code_index: [HashMap<String, RegionId>; 3],
    name_index: HashMap<String, Vec<RegionId>>,
}

impl RegionCatalog {
    /// Build the catalog from boundary layers.
    ///
    /// Returns the polygons alongside so the spatial index can be keyed by
    /// the same ids. Records whose geometry yields no interior point are
    /// skipped.
    pub fn build(layers: BoundaryLayers) -> (Self, Vec<IndexedGeometry>) {
        let mut catalog = Self {
            regions: Vec::new(),
            by_level: Default::default(),
            code_index: HashMap::new(),
            level_code_index: Default::default(),
            name_index: HashMap::new(),
        };
        let mut geometries = Vec::new();

        for (level, records) in layers.into_levels() {
            for record in records {
                let Some(point) = record.geometry.interior_point() else {
                    warn!("Skipping {} {} ({}): empty geometry", level, record.name, record.code);
                    continue;
                };

                let id = RegionId(catalog.regions.len());
                let region = Region {
                    name: record.name,
                    code: record.code,
                    level,
                    latitude: round6(point.y()),
                    longitude: round6(point.x()),
                };

                catalog.code_index.entry(region.code.clone()).or_insert(id);
                let previous = catalog.level_code_index[level.index()].insert(region.code.clone(), id);
                if previous.is_some() {
                    warn!("Duplicate {} code {}", level, region.code);
                }
                catalog
                    .name_index
                    .entry(normalize_name(&region.name))
                    .or_default()
                    .push(id);
                catalog.by_level[level.index()].push(id);
                catalog.regions.push(region);
                geometries.push((level, id, record.geometry));
            }
        }

        info!(
            "Region catalog built: {} provinces, {} cities, {} districts",
            catalog.by_level[0].len(),
            catalog.by_level[1].len(),
            catalog.by_level[2].len()
        );

        (catalog, geometries)
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    pub fn id_by_code(&self, code: &str) -> Option<RegionId> {
        self.code_index.get(code).copied()
    }

    pub fn by_code(&self, code: &str) -> Option<&Region> {
        self.id_by_code(code).and_then(|id| self.get(id))
    }

    /// Code lookup restricted to one level
    pub fn id_by_code_at(&self, level: RegionLevel, code: &str) -> Option<RegionId> {
        self.level_code_index[level.index()].get(code).copied()
    }

    pub fn by_code_at(&self, level: RegionLevel, code: &str) -> Option<&Region> {
        self.id_by_code_at(level, code).and_then(|id| self.get(id))
    }

    /// All regions with this (normalized) name, in load order
    pub fn by_name(&self, name: &str) -> Vec<&Region> {
        self.name_index
            .get(&normalize_name(name))
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    /// Regions of one level in load order
    pub fn list_level(&self, level: RegionLevel) -> impl Iterator<Item = &Region> + '_ {
        self.by_level[level.index()]
            .iter()
            .filter_map(move |id| self.get(*id))
    }

    /// All regions in load order (provinces, then cities, then districts)
    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  朝阳区 "), "朝阳区");
        assert_eq!(normalize_name("ＡＢＣ　Ｄ"), "abc d");
        assert_eq!(normalize_name("Hong   Kong"), "hong kong");
    }

    #[test]
    fn test_build_indexes() {
        let (catalog, geometries) = RegionCatalog::build(testutil::layers());
        assert_eq!(catalog.len(), geometries.len());

        let bj = catalog.by_code("156110000").unwrap();
        assert_eq!(bj.name, "北京市");
        assert_eq!(bj.level, RegionLevel::Province);

        // municipality city shares the province code
        let bj_city = catalog.by_code_at(RegionLevel::City, "156110000").unwrap();
        assert_eq!(bj_city.level, RegionLevel::City);

        let chaoyang = catalog.by_name("朝阳区");
        assert_eq!(chaoyang.len(), 2);
        assert_eq!(chaoyang[0].code, "156110105");
        assert_eq!(chaoyang[1].code, "156220104");

        assert!(catalog.by_code("156999999").is_none());
    }

    #[test]
    fn test_list_level_round_trips_by_code() {
        let (catalog, _) = RegionCatalog::build(testutil::layers());
        for &level in RegionLevel::all() {
            for region in catalog.list_level(level) {
                let found = catalog.by_code(&region.code).unwrap();
                if region.level == RegionLevel::City && region.code == "156110000" {
                    // municipality city shares the province code; the province wins
                    assert_eq!(found.level, RegionLevel::Province);
                    assert_eq!(found.name, region.name);
                } else {
                    assert_eq!(found, region);
                }
            }
        }
    }

    #[test]
    fn test_representative_point_inside_polygon() {
        let (catalog, geometries) = RegionCatalog::build(testutil::layers());
        use geo::{Intersects, Point};
        for (_, id, geometry) in &geometries {
            let region = catalog.get(*id).unwrap();
            assert!(geometry.intersects(&Point::new(region.longitude, region.latitude)));
        }
    }
}
