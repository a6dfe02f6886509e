//! Process-wide convenience API.
//!
//! The `GeoTool` and the admin tree are built on first use from
//! [`GeoToolConfig::from_env`] and cached until reset.

use std::sync::Arc;

use crate::admin_tree::{build_tree, load_code_table};
use crate::config::GeoToolConfig;
use crate::error::Result;
use crate::geotool::GeoTool;
use crate::models::{AdminNode, Region, ReverseResult};
use crate::search::SearchOptions;
use crate::shared::SharedInstance;

static INSTANCE: SharedInstance<GeoTool> = SharedInstance::new();
static ADMIN_TREE: SharedInstance<Vec<AdminNode>> = SharedInstance::new();

/// Shared `GeoTool`, loaded on first call
pub fn instance() -> Result<Arc<GeoTool>> {
    INSTANCE.get_or_try_init(|| GeoTool::new(&GeoToolConfig::from_env()?))
}

/// Replace the shared `GeoTool` with one built elsewhere
pub fn install(tool: GeoTool) {
    INSTANCE.set(Arc::new(tool));
}

pub fn reset_instance() {
    INSTANCE.reset();
}

pub fn reverse(lat: f64, lng: f64) -> Result<ReverseResult> {
    Ok(instance()?.reverse(lat, lng))
}

pub fn reverse_batch(coords: &[(f64, f64)]) -> Result<Vec<ReverseResult>> {
    Ok(instance()?.reverse_batch(coords))
}

pub fn search(query: &str, options: &SearchOptions) -> Result<Vec<Region>> {
    instance()?.search(query, options)
}

pub fn list_regions(level: &str) -> Result<Vec<Region>> {
    instance()?.list_regions(level)
}

pub fn get_region(code: &str) -> Result<Option<Region>> {
    Ok(instance()?.get_region(code))
}

pub fn lookup_adcode(adcode: &str) -> Result<Option<ReverseResult>> {
    Ok(instance()?.lookup_adcode(adcode))
}

pub fn is_in_china(lat: f64, lng: f64) -> Result<bool> {
    Ok(instance()?.is_in_china(lat, lng))
}

pub fn is_in_region(lat: f64, lng: f64, adcode: &str) -> Result<bool> {
    instance()?.is_in_region(lat, lng, adcode)
}

/// Province → city → district tree, built once per process
pub fn get_administrative_tree() -> Result<Arc<Vec<AdminNode>>> {
    ADMIN_TREE.get_or_try_init(|| {
        let config = GeoToolConfig::from_env()?;
        Ok(build_tree(&load_code_table(config.admin_path())?))
    })
}

pub fn reset_administrative_tree() {
    ADMIN_TREE.reset();
}
