use envrisk_engine::HazardReport;
use serde::Serialize;
use std::path::PathBuf;

/// Output for the query command
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    #[serde(flatten)]
    pub report: HazardReport,
    /// JPEG files written with --images
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_files: Vec<PathBuf>,
}

/// Output for the layers command
#[derive(Debug, Serialize)]
pub struct LayersOutput {
    pub planar_crs: u32,
    pub layers: Vec<LayerInfo>,
}

#[derive(Debug, Serialize)]
pub struct LayerInfo {
    pub id: String,
    pub title: String,
    pub source_crs: u32,
    pub records: usize,
    pub discarded: usize,
    pub defective: usize,
    pub skipped_features: usize,
    pub overlaps: Vec<(String, String)>,
}

/// Output for the config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}
