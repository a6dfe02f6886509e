use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoToolError {
    #[error("Failed to load data file {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GeoToolError {
    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoToolError>;
