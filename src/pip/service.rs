//! Reverse resolution of coordinates to a consistent region triple.

use std::sync::Arc;
use tracing::debug;

use super::{GeometryIndex, RegionId};
use crate::catalog::RegionCatalog;
use crate::models::{RegionLevel, ReverseResult};

/// Point-in-polygon resolver enforcing province → city → district prefixes
pub struct ReverseResolver {
    catalog: Arc<RegionCatalog>,
    index: Arc<GeometryIndex>,
}

impl ReverseResolver {
    pub fn new(catalog: Arc<RegionCatalog>, index: Arc<GeometryIndex>) -> Self {
        Self { catalog, index }
    }

    /// Resolve one WGS-84 coordinate
    pub fn reverse(&self, lat: f64, lng: f64) -> ReverseResult {
        let Some(province) = self.index.query(RegionLevel::Province, lng, lat) else {
            debug!("Reverse ({}, {}): outside all provinces", lat, lng);
            return ReverseResult::default();
        };
        let city = self.index.query(RegionLevel::City, lng, lat);
        let district = self.index.query(RegionLevel::District, lng, lat);

        self.reconcile(Some(province), city, district)
    }

    /// Resolve many `(lat, lng)` coordinates with one spatial join per level.
    ///
    /// Output length and order match `coords`; misses are empty results.
    pub fn reverse_batch(&self, coords: &[(f64, f64)]) -> Vec<ReverseResult> {
        if coords.is_empty() {
            return Vec::new();
        }

        let points: Vec<(f64, f64)> = coords.iter().map(|&(lat, lng)| (lng, lat)).collect();
        let provinces = self.index.batch_query(RegionLevel::Province, &points);
        let cities = self.index.batch_query(RegionLevel::City, &points);
        let districts = self.index.batch_query(RegionLevel::District, &points);

        debug!("Reverse batch of {} points", points.len());

        provinces
            .into_iter()
            .zip(cities)
            .zip(districts)
            .map(|((province, city), district)| self.reconcile(province, city, district))
            .collect()
    }

    /// Drop any hit whose code does not descend from the level above.
    ///
    /// A dropped city takes the district with it; the province is kept.
    fn reconcile(
        &self,
        province: Option<RegionId>,
        city: Option<RegionId>,
        district: Option<RegionId>,
    ) -> ReverseResult {
        let Some(province) = province.and_then(|id| self.catalog.get(id)) else {
            return ReverseResult::default();
        };

        let city = city
            .and_then(|id| self.catalog.get(id))
            .filter(|c| c.descends_from(province));
        let district = city.and_then(|city| {
            district
                .and_then(|id| self.catalog.get(id))
                .filter(|d| d.descends_from(city))
        });

        ReverseResult {
            province: Some(province.clone()),
            city: city.cloned(),
            district: district.cloned(),
        }
    }
}
