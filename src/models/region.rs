//! Region records produced by the geocoding catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GeoToolError;

/// Country prefix carried by every GB region code
pub const GB_COUNTRY_PREFIX: &str = "156";

/// Administrative level of a boundary layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RegionLevel {
    Province,
    City,
    District,
}

impl RegionLevel {
    /// All levels in hierarchical order (province first)
    pub fn all() -> &'static [RegionLevel] {
        &[RegionLevel::Province, RegionLevel::City, RegionLevel::District]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLevel::Province => "province",
            RegionLevel::City => "city",
            RegionLevel::District => "district",
        }
    }

    /// Slot of this level in per-level arrays
    pub(crate) fn index(&self) -> usize {
        match self {
            RegionLevel::Province => 0,
            RegionLevel::City => 1,
            RegionLevel::District => 2,
        }
    }
}

impl fmt::Display for RegionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionLevel {
    type Err = GeoToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "province" => Ok(RegionLevel::Province),
            "city" => Ok(RegionLevel::City),
            "district" => Ok(RegionLevel::District),
            other => Err(GeoToolError::InvalidArgument(format!(
                "invalid level {:?}, must be one of province, city, district",
                other
            ))),
        }
    }
}

/// A single administrative region.
///
/// `latitude`/`longitude` is a representative point guaranteed to lie
/// inside the region polygon, not necessarily its centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    /// 9-digit GB code, e.g. `156110000`
    pub code: String,
    pub level: RegionLevel,
    pub latitude: f64,
    pub longitude: f64,
}

impl Region {
    /// True if this region lies under `ancestor` by GB code prefix
    pub fn descends_from(&self, ancestor: &Region) -> bool {
        code_descends_from(&self.code, &ancestor.code)
    }
}

/// Result of a reverse lookup for one coordinate.
///
/// A present `city` always shares the province prefix, a present `district`
/// always shares the city prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverseResult {
    pub province: Option<Region>,
    pub city: Option<Region>,
    pub district: Option<Region>,
}

impl ReverseResult {
    /// No region resolved at any level
    pub fn is_empty(&self) -> bool {
        self.province.is_none() && self.city.is_none() && self.district.is_none()
    }
}

/// Returns true for a syntactically valid 9-digit GB code
pub fn is_gb_code(s: &str) -> bool {
    s.len() == 9 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Significant prefix of a GB code: `156XX` for province-shaped codes,
/// `156XXYY` for city-shaped codes, the whole code otherwise.
///
/// Municipality cities share the province code, so their prefix is the
/// province prefix as well.
pub fn code_prefix(code: &str) -> &str {
    if !is_gb_code(code) {
        return code;
    }
    if code.ends_with("0000") {
        &code[..5]
    } else if code.ends_with("00") {
        &code[..7]
    } else {
        code
    }
}

pub fn code_descends_from(code: &str, ancestor: &str) -> bool {
    code.starts_with(code_prefix(ancestor))
}
