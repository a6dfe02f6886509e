//! Data-file configuration shared by the library and binaries.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeoToolError, Result};

/// Environment variable pointing at a TOML config file
pub const CONFIG_ENV: &str = "GEOTOOL_CONFIG";
/// Environment variable overriding only the data directory
pub const DATA_DIR_ENV: &str = "GEOTOOL_DATA_DIR";

const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeoToolConfig {
    pub data_dir: PathBuf,
    pub province_file: String,
    pub city_file: String,
    pub district_file: String,
    pub admin_file: String,
}

impl Default for GeoToolConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            province_file: "china_province.geojson".to_string(),
            city_file: "china_city.geojson".to_string(),
            district_file: "china_district.geojson".to_string(),
            admin_file: "china_admin.json".to_string(),
        }
    }
}

impl GeoToolConfig {
    /// Default file names rooted at `data_dir`
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GeoToolError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            GeoToolError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Resolve configuration from `GEOTOOL_CONFIG`, then `GEOTOOL_DATA_DIR`,
    /// then the bundled data directory.
    pub fn from_env() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from_file(path);
        }
        Ok(match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => Self::with_data_dir(dir),
            None => Self::default(),
        })
    }

    pub fn province_path(&self) -> PathBuf {
        self.data_dir.join(&self.province_file)
    }

    pub fn city_path(&self) -> PathBuf {
        self.data_dir.join(&self.city_file)
    }

    pub fn district_path(&self) -> PathBuf {
        self.data_dir.join(&self.district_file)
    }

    pub fn admin_path(&self) -> PathBuf {
        self.data_dir.join(&self.admin_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = \"/srv/geo\"\ncity_file = \"cities.geojson\"").unwrap();

        let config = GeoToolConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/geo"));
        assert_eq!(config.city_path(), PathBuf::from("/srv/geo/cities.geojson"));
        assert_eq!(
            config.province_path(),
            PathBuf::from("/srv/geo/china_province.geojson")
        );
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = [").unwrap();

        let err = GeoToolConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, GeoToolError::Config(_)));
    }
}
