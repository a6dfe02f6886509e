//! Province → city → district cascader tree built from the flat code table.
//!
//! Level and parent are inferred from code shape only: cities hang under
//! `XX0000`, districts under `XXYY00`. Municipalities and SARs get a
//! synthesized city node carrying the province code.

use hashbrown::{HashMap, HashSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{GeoToolError, Result};
use crate::models::admin::{city_adcode, is_municipality_prefix};
use crate::models::{AdminCodeRecord, AdminNode, RegionLevel};
use crate::shared::SharedInstance;

/// Accepted layouts of `china_admin.json`
#[derive(Deserialize)]
#[serde(untagged)]
enum CodeTableFile {
    Grouped {
        provinces: Vec<(String, String)>,
        #[serde(default)]
        cities: Vec<(String, String)>,
        #[serde(default)]
        districts: Vec<(String, String)>,
    },
    Flat(Vec<AdminCodeRecord>),
}

impl CodeTableFile {
    fn into_records(self) -> Vec<AdminCodeRecord> {
        match self {
            CodeTableFile::Grouped {
                provinces,
                cities,
                districts,
            } => provinces
                .into_iter()
                .chain(cities)
                .chain(districts)
                .map(|(adcode, name)| AdminCodeRecord { adcode, name })
                .collect(),
            CodeTableFile::Flat(records) => records,
        }
    }
}

/// Parse a code table in either the grouped or the flat layout
pub fn parse_code_table(text: &str) -> std::result::Result<Vec<AdminCodeRecord>, String> {
    let file: CodeTableFile = serde_json::from_str(text).map_err(|e| e.to_string())?;
    Ok(file.into_records())
}

pub fn load_code_table<P: AsRef<Path>>(path: P) -> Result<Vec<AdminCodeRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| GeoToolError::data_load(path, e))?;
    let records = parse_code_table(&text).map_err(|e| GeoToolError::data_load(path, e))?;
    info!("Loaded {} admin code records from {}", records.len(), path.display());
    Ok(records)
}

/// Build the sorted three-level tree from flat records.
///
/// Duplicate adcodes keep the first record. Records that are not six
/// digits, cities without a province and districts without a city are
/// dropped.
pub fn build_tree(records: &[AdminCodeRecord]) -> Vec<AdminNode> {
    let mut seen = HashSet::new();
    let mut provinces: BTreeMap<&str, &str> = BTreeMap::new();
    let mut cities_by_province: HashMap<&str, Vec<&AdminCodeRecord>> = HashMap::new();
    let mut districts_by_city: HashMap<String, Vec<AdminNode>> = HashMap::new();
    let mut districts_by_province: HashMap<&str, Vec<AdminNode>> = HashMap::new();
    let mut district_count = 0usize;

    for record in records {
        let Some(level) = record.level() else {
            warn!("Skipping admin record {:?} ({}): not a 6-digit adcode", record.adcode, record.name);
            continue;
        };
        if !seen.insert(record.adcode.as_str()) {
            continue;
        }
        let prefix = &record.adcode[..2];
        match level {
            RegionLevel::Province => {
                provinces.insert(&record.adcode, &record.name);
            }
            RegionLevel::City => cities_by_province.entry(prefix).or_default().push(record),
            RegionLevel::District => {
                district_count += 1;
                let leaf = AdminNode::leaf(record.adcode.clone(), record.name.clone());
                districts_by_province
                    .entry(prefix)
                    .or_default()
                    .push(leaf.clone());
                districts_by_city
                    .entry(city_adcode(&record.adcode))
                    .or_default()
                    .push(leaf);
            }
        }
    }

    let mut attached = 0usize;
    let mut tree = Vec::with_capacity(provinces.len());

    for (code, name) in provinces {
        let prefix = &code[..2];
        let cities = cities_by_province.remove(prefix).unwrap_or_default();
        let city_nodes = if is_municipality_prefix(prefix) {
            let districts = districts_by_province.remove(prefix).unwrap_or_default();
            attached += districts.len();
            vec![AdminNode::branch(code, name, districts)]
        } else {
            cities
                .into_iter()
                .map(|city| {
                    let districts = districts_by_city.remove(&city.adcode).unwrap_or_default();
                    attached += districts.len();
                    AdminNode::branch(city.adcode.clone(), city.name.clone(), districts)
                })
                .collect()
        };

        tree.push(AdminNode::branch(code, name, city_nodes));
    }

    if attached < district_count {
        debug!("Dropped {} orphan districts from admin tree", district_count - attached);
    }

    tree.sort_by(|a, b| a.value.cmp(&b.value));
    tree
}

/// Lazily builds and caches the tree for one code-table file
pub struct AdminTreeBuilder {
    source: PathBuf,
    cache: SharedInstance<Vec<AdminNode>>,
}

impl AdminTreeBuilder {
    pub fn new<P: Into<PathBuf>>(source: P) -> Self {
        Self {
            source: source.into(),
            cache: SharedInstance::new(),
        }
    }

    /// Build on first call, return the cached tree afterwards
    pub fn get(&self) -> Result<Arc<Vec<AdminNode>>> {
        self.cache.get_or_try_init(|| {
            let records = load_code_table(&self.source)?;
            let tree = build_tree(&records);
            info!("Admin tree built with {} provinces", tree.len());
            Ok(tree)
        })
    }

    /// Drop the cached tree so the next call rebuilds it
    pub fn reset(&self) {
        self.cache.reset();
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    fn find<'a>(nodes: &'a [AdminNode], value: &str) -> &'a AdminNode {
        nodes.iter().find(|n| n.value == value).unwrap()
    }

    fn tree() -> Vec<AdminNode> {
        build_tree(&parse_code_table(testutil::ADMIN_TABLE).unwrap())
    }

    fn assert_sorted(nodes: &[AdminNode]) {
        let values: Vec<&str> = nodes.iter().map(|n| n.value.as_str()).collect();
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(values, sorted);
        for node in nodes {
            assert_sorted(node.children());
        }
    }

    #[test]
    fn test_root_sorted_by_value() {
        let tree = tree();
        let values: Vec<&str> = tree.iter().map(|n| n.value.as_str()).collect();
        assert_eq!(values, vec!["110000", "220000", "810000"]);
        assert_sorted(&tree);
    }

    #[test]
    fn test_municipality_single_city_node() {
        let tree = tree();
        let bj = find(&tree, "110000");
        assert_eq!(bj.label, "北京市");
        assert_eq!(bj.children().len(), 1);

        let city = &bj.children()[0];
        assert_eq!(city.value, "110000");
        let districts: Vec<&str> = city.children().iter().map(|d| d.value.as_str()).collect();
        assert_eq!(districts, vec!["110101", "110102", "110105"]);
        assert!(city.children().iter().all(|d| d.children.is_none()));
    }

    #[test]
    fn test_sar_single_city_node() {
        let tree = tree();
        let hk = find(&tree, "810000");
        assert_eq!(hk.children().len(), 1);
        assert_eq!(hk.children()[0].value, "810000");
        assert_eq!(hk.children()[0].children()[0].label, "中西区");
    }

    #[test]
    fn test_normal_province_cities_and_districts() {
        let tree = tree();
        let jilin = find(&tree, "220000");
        let cities: Vec<&str> = jilin.children().iter().map(|c| c.value.as_str()).collect();
        assert_eq!(cities, vec!["220100", "220200"]);

        let changchun = find(jilin.children(), "220100");
        let districts: Vec<&str> = changchun.children().iter().map(|d| d.label.as_str()).collect();
        assert_eq!(districts, vec!["南关区", "朝阳区"]);
    }

    #[test]
    fn test_orphan_district_dropped() {
        let tree = tree();
        let all_values: Vec<&str> = tree
            .iter()
            .flat_map(|p| p.children())
            .flat_map(|c| c.children())
            .map(|d| d.value.as_str())
            .collect();
        assert!(!all_values.contains(&"229901"));
        assert_eq!(all_values.len(), 7);
    }

    #[test]
    fn test_flat_layout_and_province_without_cities() {
        let records = parse_code_table(
            r#"[{"adcode":"460000","name":"海南省"},
                {"adcode":"469001","name":"五指山市"},
                {"adcode":"7100","name":"坏编码"}]"#,
        )
        .unwrap();
        let tree = build_tree(&records);
        assert_eq!(tree.len(), 1);
        let hainan = &tree[0];
        assert_eq!(hainan.value, "460000");
        // 469001 derives city 469000, which is not in the table
        assert!(hainan.children().is_empty());
        assert_eq!(hainan.node_count(), 1);
    }

    #[test]
    fn test_builder_caches_and_resets() {
        let dir = testutil::data_dir();
        let builder = AdminTreeBuilder::new(dir.path().join("china_admin.json"));
        let first = builder.get().unwrap();
        let second = builder.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        builder.reset();
        let rebuilt = builder.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(*first, *rebuilt);
        assert_eq!(
            first.iter().map(AdminNode::node_count).sum::<usize>(),
            rebuilt.iter().map(AdminNode::node_count).sum::<usize>()
        );
    }

    #[test]
    fn test_missing_table_is_data_load_error() {
        let builder = AdminTreeBuilder::new("/nonexistent/china_admin.json");
        assert!(matches!(builder.get(), Err(GeoToolError::DataLoad { .. })));
    }
}
