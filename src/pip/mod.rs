//! Point-in-Polygon (PIP) region lookup.
//!
//! Loads province, city and district boundaries and resolves coordinates
//! using one R-tree spatial index per level.

mod boundary;
mod index;
mod service;

pub use boundary::{load_layer, parse_layer, BoundaryLayers, BoundaryRecord};
pub use index::{GeometryIndex, RegionId};
pub use service::ReverseResolver;
