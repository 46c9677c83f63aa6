//! Source readers for layer datasets
//!
//! Readers turn a dataset file into a [`LayerSource`]: polygonal features in
//! the file's native CRS with their raw properties. Reprojection, validation
//! and indexing happen later, when the layer is built.

use geo::MultiPolygon;
use std::path::Path;

use crate::error::{EnvriskError, Result};
use crate::models::Crs;

pub mod geojson;

/// Reader trait implemented by every supported source format
pub trait SourceReader: Send + Sync {
    /// Read a dataset from the given path
    fn read(&self, path: &Path) -> Result<LayerSource>;

    /// Supported file extensions (e.g. ["geojson", "json"])
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name
    fn format_name(&self) -> &str;
}

/// Polygonal feature read from a source file
#[derive(Debug, Clone)]
pub struct SourceFeature {
    /// Feature id, or its ordinal when the source has none
    pub id: String,
    pub geometry: MultiPolygon<f64>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Dataset contents handed to the layer builder
#[derive(Debug, Clone)]
pub struct LayerSource {
    pub name: String,
    /// Native CRS of `features`
    pub crs: Crs,
    pub features: Vec<SourceFeature>,
    /// Features dropped because they carried no polygonal geometry
    pub skipped: usize,
}

/// Pick a reader by file extension and read the dataset
pub fn read_source(path: &Path) -> Result<LayerSource> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    let readers: [&dyn SourceReader; 1] = [&geojson::GeoJsonReader];
    let reader = readers
        .into_iter()
        .find(|reader| reader.supported_extensions().contains(&extension.as_str()))
        .ok_or_else(|| EnvriskError::SourceFormat {
            format: extension.clone(),
            path: path.to_path_buf(),
            reason: "no reader for this file extension".to_string(),
        })?;

    tracing::debug!(path = %path.display(), format = reader.format_name(), "reading layer source");
    reader.read(path)
}
