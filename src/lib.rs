//! GeoToolCN - offline geocoding for Chinese administrative regions
//!
//! Reverse geocoding (coordinate → province/city/district), forward search
//! by name or GB code, and the province → city → district cascader tree,
//! all from bundled boundary and code-table files.

pub mod admin_tree;
pub mod catalog;
pub mod config;
pub mod coords;
pub mod error;
pub mod geotool;
pub mod global;
pub mod models;
pub mod pip;
pub mod search;
pub mod shared;

#[cfg(test)]
mod testutil;

pub use admin_tree::AdminTreeBuilder;
pub use config::GeoToolConfig;
pub use error::{GeoToolError, Result};
pub use geotool::GeoTool;
pub use global::get_administrative_tree;
pub use models::{AdminNode, Region, RegionLevel, ReverseResult};
pub use search::SearchOptions;
