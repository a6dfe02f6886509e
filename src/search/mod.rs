//! Forward search: region names or GB codes to region records.

use hashbrown::HashSet;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{normalize_name, RegionCatalog};
use crate::error::Result;
use crate::models::region::is_gb_code;
use crate::models::{Region, RegionLevel};

/// Search parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Restrict to `province`, `city` or `district`
    pub level: Option<String>,
    /// Parent province, by name or GB code
    pub province: Option<String>,
    /// Parent city, by name or GB code
    pub city: Option<String>,
    /// Fall back to substring matching when nothing matches exactly
    pub fuzzy: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            level: None,
            province: None,
            city: None,
            fuzzy: true,
        }
    }
}

impl SearchOptions {
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }
}

pub struct ForwardSearchEngine {
    catalog: Arc<RegionCatalog>,
}

impl ForwardSearchEngine {
    pub fn new(catalog: Arc<RegionCatalog>) -> Self {
        Self { catalog }
    }

    /// Search by name or GB code.
    ///
    /// Results keep catalog load order with duplicate codes removed. An
    /// unresolvable `province`/`city` filter yields an empty list; an
    /// unknown `level` is an error.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<Region>> {
        let level = options
            .level
            .as_deref()
            .map(str::parse::<RegionLevel>)
            .transpose()?;
        let query = query.trim();

        let mut candidates: Vec<&Region> = if is_gb_code(query) {
            self.catalog
                .by_code(query)
                .filter(|r| level.map_or(true, |l| r.level == l))
                .into_iter()
                .collect()
        } else {
            self.match_name(query, level, options.fuzzy)
        };

        for (parent_level, parent_query) in [
            (RegionLevel::Province, &options.province),
            (RegionLevel::City, &options.city),
        ] {
            let Some(parent_query) = parent_query else {
                continue;
            };
            let Some(parent) = self.resolve_parent(parent_level, parent_query) else {
                debug!("Search {:?}: {} filter {:?} not found", query, parent_level, parent_query);
                return Ok(Vec::new());
            };
            candidates.retain(|r| r.descends_from(parent));
        }

        let mut seen = HashSet::new();
        let results: Vec<Region> = candidates
            .into_iter()
            .filter(|r| seen.insert(r.code.clone()))
            .cloned()
            .collect();

        debug!("Search {:?}: {} results", query, results.len());
        Ok(results)
    }

    /// Exact lookup by GB code
    pub fn get_region(&self, code: &str) -> Option<Region> {
        self.catalog.by_code(code).cloned()
    }

    /// All regions of one level in load order
    pub fn list_regions(&self, level: &str) -> Result<Vec<Region>> {
        let level: RegionLevel = level.parse()?;
        Ok(self.catalog.list_level(level).cloned().collect())
    }

    fn match_name(&self, query: &str, level: Option<RegionLevel>, fuzzy: bool) -> Vec<&Region> {
        let exact: Vec<&Region> = self
            .catalog
            .by_name(query)
            .into_iter()
            .filter(|r| level.map_or(true, |l| r.level == l))
            .collect();
        if !exact.is_empty() || !fuzzy {
            return exact;
        }

        let needle = normalize_name(query);
        if needle.is_empty() {
            return Vec::new();
        }

        let contains = |r: &&Region| normalize_name(&r.name).contains(&needle);
        match level {
            Some(level) => self.catalog.list_level(level).filter(contains).collect(),
            None => self.catalog.iter().filter(contains).collect(),
        }
    }

    /// Resolve a parent filter by GB code or exact name at `level`
    fn resolve_parent(&self, level: RegionLevel, query: &str) -> Option<&Region> {
        let query = query.trim();
        if is_gb_code(query) {
            self.catalog.by_code_at(level, query)
        } else {
            self.catalog
                .by_name(query)
                .into_iter()
                .find(|r| r.level == level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoToolError;
    use crate::testutil;

    fn engine() -> ForwardSearchEngine {
        let (catalog, _) = RegionCatalog::build(testutil::layers());
        ForwardSearchEngine::new(Arc::new(catalog))
    }

    fn codes(regions: &[Region]) -> Vec<&str> {
        regions.iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn test_duplicate_names_across_parents() {
        let engine = engine();
        let all = engine.search("朝阳区", &SearchOptions::default()).unwrap();
        assert_eq!(codes(&all), vec!["156110105", "156220104"]);

        let beijing = engine
            .search("朝阳区", &SearchOptions::default().province("北京市"))
            .unwrap();
        assert_eq!(codes(&beijing), vec!["156110105"]);
        assert!(beijing[0].code.starts_with("15611"));
    }

    #[test]
    fn test_parent_filter_by_code_and_city() {
        let engine = engine();
        let by_code = engine
            .search("朝阳区", &SearchOptions::default().province("156110000"))
            .unwrap();
        assert_eq!(codes(&by_code), vec!["156110105"]);

        let by_city = engine
            .search("朝阳区", &SearchOptions::default().city("长春市"))
            .unwrap();
        assert_eq!(codes(&by_city), vec!["156220104"]);
    }

    #[test]
    fn test_unresolvable_parent_is_empty() {
        let engine = engine();
        let results = engine
            .search("朝阳区", &SearchOptions::default().province("广东省"))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_code_query() {
        let engine = engine();
        let results = engine.search("156110000", &SearchOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "北京市");
        assert_eq!(results[0].level, RegionLevel::Province);

        let wrong_level = engine
            .search("156110000", &SearchOptions::default().level("district"))
            .unwrap();
        assert!(wrong_level.is_empty());
    }

    #[test]
    fn test_municipality_name_is_deduplicated() {
        // province and municipality city share 156110000
        let results = engine().search("北京市", &SearchOptions::default()).unwrap();
        assert_eq!(codes(&results), vec!["156110000"]);
    }

    #[test]
    fn test_fuzzy_fallback() {
        let engine = engine();
        let fuzzy = engine.search("吉林", &SearchOptions::default()).unwrap();
        assert_eq!(codes(&fuzzy), vec!["156220000", "156220200"]);

        let strict = engine
            .search("吉林", &SearchOptions::default().fuzzy(false))
            .unwrap();
        assert!(strict.is_empty());

        let cities = engine
            .search("吉林", &SearchOptions::default().level("city"))
            .unwrap();
        assert_eq!(codes(&cities), vec!["156220200"]);
    }

    #[test]
    fn test_exact_match_suppresses_fuzzy() {
        let results = engine().search("南关区", &SearchOptions::default()).unwrap();
        assert_eq!(codes(&results), vec!["156220102"]);
    }

    #[test]
    fn test_normalized_query() {
        let results = engine().search("  朝阳区 ", &SearchOptions::default()).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_no_match_and_empty_query() {
        let engine = engine();
        assert!(engine.search("不存在的地方xyz", &SearchOptions::default()).unwrap().is_empty());
        assert!(engine.search("   ", &SearchOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_level() {
        let engine = engine();
        let err = engine
            .search("朝阳区", &SearchOptions::default().level("country"))
            .unwrap_err();
        assert!(matches!(err, GeoToolError::InvalidArgument(_)));
        assert!(matches!(
            engine.list_regions("country"),
            Err(GeoToolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_list_and_get_round_trip() {
        let engine = engine();
        let provinces = engine.list_regions("province").unwrap();
        assert_eq!(provinces.len(), 3);
        for region in provinces.iter().chain(engine.list_regions("district").unwrap().iter()) {
            assert_eq!(engine.get_region(&region.code).as_ref(), Some(region));
        }
        // cities round-trip except the municipality city, which shares the province code
        for city in engine.list_regions("city").unwrap() {
            let found = engine.get_region(&city.code).unwrap();
            if city.code == "156110000" {
                assert_eq!(found.level, RegionLevel::Province);
            } else {
                assert_eq!(found, city);
            }
        }
        assert!(engine.get_region("999999999").is_none());
    }
}
