//! Resource resolution logic for baryscore
//!
//! Maps speed grids and the static venue dataset to HTTP URLs or local files.

use std::path::PathBuf;

use crate::core::types::TravelMode;

/// Where a data resource lives
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceLocation {
    /// HTTP source with direct URL
    Http { url: String },
    /// Local file, typically from an unpacked data directory
    File { path: PathBuf },
}

impl std::fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLocation::Http { url } => f.write_str(url),
            ResourceLocation::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Configuration for data resources
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL (`http://`, `https://`) or local directory holding the resources
    pub data_base: String,

    /// Speed grid file name template, `{mode}` is replaced by the grid key
    pub grid_file_template: String,

    /// Compressed GeoJSON with the preloaded regional venues
    pub static_dataset_file: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_base: "data".to_string(),
            grid_file_template: "routing-grid-{mode}.json.gz".to_string(),
            static_dataset_file: "bars-france.geojson.gz".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn with_base(data_base: impl Into<String>) -> Self {
        Self {
            data_base: data_base.into(),
            ..Default::default()
        }
    }
}

/// Resolves the speed grid resource for a travel mode
pub fn resolve_grid_resource(mode: TravelMode, config: &SourceConfig) -> ResourceLocation {
    let file = config.grid_file_template.replace("{mode}", mode.grid_key());
    resolve_file(&config.data_base, &file)
}

/// Resolves the static venue dataset resource
pub fn resolve_static_dataset(config: &SourceConfig) -> ResourceLocation {
    resolve_file(&config.data_base, &config.static_dataset_file)
}

fn resolve_file(base: &str, file: &str) -> ResourceLocation {
    if base.starts_with("http://") || base.starts_with("https://") {
        ResourceLocation::Http {
            url: format!("{}/{}", base.trim_end_matches('/'), file),
        }
    } else {
        ResourceLocation::File {
            path: PathBuf::from(base).join(file),
        }
    }
}
