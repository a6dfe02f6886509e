//! Per-level spatial index for fast region boundary lookups.

use geo::{Intersects, MultiPolygon, Point};
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::RegionLevel;

/// Position of a region in the catalog's load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub usize);

/// Wrapper for R-tree indexing of one boundary
#[derive(Clone)]
struct IndexedBoundary {
    id: RegionId,
    /// Slot in the owning level's geometry list
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

struct LevelIndex {
    tree: RTree<IndexedBoundary>,
    geometries: Vec<(RegionId, MultiPolygon<f64>)>,
}

impl LevelIndex {
    fn build(geometries: Vec<(RegionId, MultiPolygon<f64>)>) -> Self {
        use geo::BoundingRect;

        let indexed: Vec<IndexedBoundary> = geometries
            .iter()
            .enumerate()
            .filter_map(|(slot, (id, geometry))| {
                let rect = geometry.bounding_rect()?;
                Some(IndexedBoundary {
                    id: *id,
                    slot,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
            geometries,
        }
    }

    fn query(&self, lon: f64, lat: f64) -> Option<RegionId> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        // R-tree iteration order is arbitrary; the lowest id wins so that
        // overlapping polygons resolve in load order.
        // Intersects is boundary-inclusive, so a point on a shared edge is
        // claimed by both neighbours and the tie goes to the earlier one.
        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ib| self.geometries[ib.slot].1.intersects(&point))
            .map(|ib| ib.id)
            .min()
    }
}

/// Spatial index over the province, city and district layers
pub struct GeometryIndex {
    levels: [LevelIndex; 3],
}

impl GeometryIndex {
    /// Build one R-tree per level from `(level, id, polygon)` triples
    pub fn build(entries: Vec<(RegionLevel, RegionId, MultiPolygon<f64>)>) -> Self {
        info!("Building spatial index for {} boundaries...", entries.len());

        let mut per_level: [Vec<(RegionId, MultiPolygon<f64>)>; 3] = Default::default();
        for (level, id, geometry) in entries {
            per_level[level.index()].push((id, geometry));
        }

        let [provinces, cities, districts] = per_level;
        let levels = [
            LevelIndex::build(provinces),
            LevelIndex::build(cities),
            LevelIndex::build(districts),
        ];

        for level in RegionLevel::all() {
            info!(
                "  {}: {} boundaries",
                level,
                levels[level.index()].tree.size()
            );
        }

        Self { levels }
    }

    /// Find the region at `level` covering the point
    pub fn query(&self, level: RegionLevel, lon: f64, lat: f64) -> Option<RegionId> {
        self.levels[level.index()].query(lon, lat)
    }

    /// Spatial join of many `(lon, lat)` points against one level.
    ///
    /// Output has one entry per input point, in input order.
    pub fn batch_query(&self, level: RegionLevel, points: &[(f64, f64)]) -> Vec<Option<RegionId>> {
        let index = &self.levels[level.index()];
        points
            .par_iter()
            .map(|&(lon, lat)| index.query(lon, lat))
            .collect()
    }

    /// Boundary-inclusive test of a point against one indexed region
    pub fn covers(&self, level: RegionLevel, id: RegionId, lon: f64, lat: f64) -> bool {
        let geometries = &self.levels[level.index()].geometries;
        geometries
            .binary_search_by_key(&id, |(gid, _)| *gid)
            .map(|slot| geometries[slot].1.intersects(&Point::new(lon, lat)))
            .unwrap_or(false)
    }

    /// Get total number of indexed boundaries
    pub fn len(&self) -> usize {
        self.levels.iter().map(|l| l.tree.size()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
