//! Reader configuration
//!
//! Controls how shapefiles are opened and how the result set labels its
//! synthetic feature column.

use crate::{Result, ShapeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Label of the pseudo-column at index 0 that yields the row's geometry
pub const DEFAULT_FEATURE_COLUMN_LABEL: &str = "GIS_FEATURE";

/// Shapefile reader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Memory-map `.shp`/`.shx`/`.dbf` instead of reading them into memory
    pub use_mmap: bool,

    /// Fail to open when the `.dbf` sibling is missing.
    ///
    /// When false, a missing attribute table yields zero columns.
    pub require_attributes: bool,

    /// Strip leading/trailing padding from character fields
    pub trim_text: bool,

    /// Label of the feature pseudo-column (case-insensitive)
    pub feature_column_label: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            use_mmap: true,
            require_attributes: false,
            trim_text: true,
            feature_column_label: DEFAULT_FEATURE_COLUMN_LABEL.to_string(),
        }
    }
}

impl ReaderConfig {
    /// Read everything into memory; for files on network mounts that may
    /// change underneath a mapping
    pub fn for_buffered() -> Self {
        Self {
            use_mmap: false,
            ..Default::default()
        }
    }

    /// Reject datasets without an attribute table
    pub fn for_strict() -> Self {
        Self {
            require_attributes: true,
            ..Default::default()
        }
    }

    /// Load from a JSON file; absent keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: ReaderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feature_column_label.trim().is_empty() {
            return Err(ShapeError::Config("feature_column_label must not be empty".into()));
        }
        Ok(())
    }
}
