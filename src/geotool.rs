//! Offline geocoding facade over the catalog, spatial index and search.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::catalog::RegionCatalog;
use crate::config::GeoToolConfig;
use crate::error::{GeoToolError, Result};
use crate::models::admin::{adcode_level, adcode_to_gb, city_adcode, is_municipality_prefix, province_adcode};
use crate::models::{Region, RegionLevel, ReverseResult};
use crate::pip::{load_layer, BoundaryLayers, GeometryIndex, RegionId, ReverseResolver};
use crate::search::{ForwardSearchEngine, SearchOptions};

/// Offline geocoding toolkit for Chinese administrative regions.
///
/// Immutable once built; share it behind an `Arc` for concurrent reads.
pub struct GeoTool {
    catalog: Arc<RegionCatalog>,
    index: Arc<GeometryIndex>,
    resolver: ReverseResolver,
    search: ForwardSearchEngine,
}

impl GeoTool {
    /// Load the three boundary layers named by `config`.
    ///
    /// Any missing or unreadable layer fails the whole construction.
    pub fn new(config: &GeoToolConfig) -> Result<Self> {
        info!("Loading boundary layers from {}", config.data_dir.display());
        let layers = BoundaryLayers {
            provinces: load_layer(config.province_path(), RegionLevel::Province)?,
            cities: load_layer(config.city_path(), RegionLevel::City)?,
            districts: load_layer(config.district_path(), RegionLevel::District)?,
        };
        Ok(Self::from_layers(layers))
    }

    /// Load from `data_dir` with the default file names
    pub fn open<P: Into<PathBuf>>(data_dir: P) -> Result<Self> {
        Self::new(&GeoToolConfig::with_data_dir(data_dir))
    }

    pub fn from_layers(layers: BoundaryLayers) -> Self {
        let (catalog, geometries) = RegionCatalog::build(layers);
        let catalog = Arc::new(catalog);
        let index = Arc::new(GeometryIndex::build(geometries));

        Self {
            resolver: ReverseResolver::new(Arc::clone(&catalog), Arc::clone(&index)),
            search: ForwardSearchEngine::new(Arc::clone(&catalog)),
            catalog,
            index,
        }
    }

    pub fn reverse(&self, lat: f64, lng: f64) -> ReverseResult {
        self.resolver.reverse(lat, lng)
    }

    /// Reverse many `(lat, lng)` pairs; output order matches input
    pub fn reverse_batch(&self, coords: &[(f64, f64)]) -> Vec<ReverseResult> {
        self.resolver.reverse_batch(coords)
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<Region>> {
        self.search.search(query, options)
    }

    pub fn list_regions(&self, level: &str) -> Result<Vec<Region>> {
        self.search.list_regions(level)
    }

    pub fn get_region(&self, code: &str) -> Option<Region> {
        self.search.get_region(code)
    }

    /// Resolve a 6-digit adcode to the regions it names.
    ///
    /// Malformed or unknown adcodes give `None`.
    pub fn lookup_adcode(&self, adcode: &str) -> Option<ReverseResult> {
        let level = adcode_level(adcode)?;
        let province = self.region_for_adcode(RegionLevel::Province, adcode)?;
        let mut result = ReverseResult {
            province: Some(province.clone()),
            ..ReverseResult::default()
        };

        match level {
            RegionLevel::Province => {}
            RegionLevel::City => {
                result.city = Some(self.region_for_adcode(RegionLevel::City, adcode)?.clone());
            }
            RegionLevel::District => {
                let district = self.region_for_adcode(RegionLevel::District, adcode)?;
                result.city = self.region_for_adcode(RegionLevel::City, adcode).cloned();
                result.district = Some(district.clone());
            }
        }
        Some(result)
    }

    /// True if any province polygon covers the point
    pub fn is_in_china(&self, lat: f64, lng: f64) -> bool {
        self.index.query(RegionLevel::Province, lng, lat).is_some()
    }

    /// Boundary-inclusive test of the point against the region named by
    /// `adcode`. Malformed or unknown adcodes are invalid arguments.
    pub fn is_in_region(&self, lat: f64, lng: f64, adcode: &str) -> Result<bool> {
        let level = adcode_level(adcode)
            .ok_or_else(|| GeoToolError::InvalidArgument(format!("malformed adcode {:?}", adcode)))?;
        let id = self
            .id_for_adcode(level, adcode)
            .ok_or_else(|| GeoToolError::InvalidArgument(format!("unknown adcode {:?}", adcode)))?;
        Ok(self.index.covers(level, id, lng, lat))
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    fn region_for_adcode(&self, level: RegionLevel, adcode: &str) -> Option<&Region> {
        self.id_for_adcode(level, adcode)
            .and_then(|id| self.catalog.get(id))
    }

    /// Catalog id of the `level` ancestor named by `adcode`.
    ///
    /// Municipalities and SARs have their city record under the province
    /// code, so the city lookup falls back to it.
    fn id_for_adcode(&self, level: RegionLevel, adcode: &str) -> Option<RegionId> {
        match level {
            RegionLevel::Province => self
                .catalog
                .id_by_code_at(level, &adcode_to_gb(&province_adcode(adcode))),
            RegionLevel::City => self
                .catalog
                .id_by_code_at(level, &adcode_to_gb(&city_adcode(adcode)))
                .or_else(|| {
                    is_municipality_prefix(&adcode[..2])
                        .then(|| adcode_to_gb(&province_adcode(adcode)))
                        .and_then(|code| self.catalog.id_by_code_at(level, &code))
                }),
            RegionLevel::District => self.catalog.id_by_code_at(level, &adcode_to_gb(adcode)),
        }
    }
}
