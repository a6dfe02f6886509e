//! Administrative-code types for the province → city → district tree.

use serde::{Deserialize, Serialize};

use super::region::{RegionLevel, GB_COUNTRY_PREFIX};

/// Two-digit prefixes of the direct-controlled municipalities
/// (北京, 天津, 上海, 重庆) and SARs (香港, 澳门).
///
/// These have no genuine city level; their city node reuses the
/// province code.
pub const MUNICIPALITY_PREFIXES: &[&str] = &["11", "12", "31", "50", "81", "82"];

pub fn is_municipality_prefix(prefix: &str) -> bool {
    MUNICIPALITY_PREFIXES.contains(&prefix)
}

/// Returns true for a syntactically valid 6-digit adcode
pub fn is_adcode(s: &str) -> bool {
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Level implied by the shape of an adcode:
/// `XX0000` province, `XXYY00` city, `XXYYZZ` district.
pub fn adcode_level(adcode: &str) -> Option<RegionLevel> {
    if !is_adcode(adcode) {
        return None;
    }
    if adcode.ends_with("0000") {
        Some(RegionLevel::Province)
    } else if adcode.ends_with("00") {
        Some(RegionLevel::City)
    } else {
        Some(RegionLevel::District)
    }
}

/// Province adcode (`XX0000`) owning an adcode
pub fn province_adcode(adcode: &str) -> String {
    format!("{}0000", &adcode[..2])
}

/// City adcode (`XXYY00`) owning an adcode
pub fn city_adcode(adcode: &str) -> String {
    format!("{}00", &adcode[..4])
}

/// GB code used by the boundary layers for a 6-digit adcode
pub fn adcode_to_gb(adcode: &str) -> String {
    format!("{}{}", GB_COUNTRY_PREFIX, adcode)
}

/// One row of the flat administrative code table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCodeRecord {
    pub adcode: String,
    pub name: String,
}

impl AdminCodeRecord {
    pub fn new(adcode: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            adcode: adcode.into(),
            name: name.into(),
        }
    }

    pub fn level(&self) -> Option<RegionLevel> {
        adcode_level(&self.adcode)
    }
}

/// Node of the cascader tree.
///
/// `children` is sorted ascending by `value` and absent on district leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminNode {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<AdminNode>>,
}

impl AdminNode {
    pub fn leaf(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            children: None,
        }
    }

    /// Branch node; children are sorted by `value` here
    pub fn branch(
        value: impl Into<String>,
        label: impl Into<String>,
        mut children: Vec<AdminNode>,
    ) -> Self {
        children.sort_by(|a, b| a.value.cmp(&b.value));
        Self {
            value: value.into(),
            label: label.into(),
            children: Some(children),
        }
    }

    pub fn children(&self) -> &[AdminNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Total number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(AdminNode::node_count).sum::<usize>()
    }
}
