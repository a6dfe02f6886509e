//! Core data models for the geocoding system.

pub mod admin;
pub mod region;

pub use admin::{AdminCodeRecord, AdminNode};
pub use region::{Region, RegionLevel, ReverseResult};
