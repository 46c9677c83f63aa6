//! Error types for envrisk

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvriskError {
    // Input errors
    #[error("Projection error: {reason}")]
    Projection { reason: String },

    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    // Stored data errors
    #[error("Invalid geometry in record {record}: {reason}")]
    InvalidGeometry { record: String, reason: String },

    #[error("Layer not found: {id}")]
    LayerNotFound { id: String },

    #[error("Unsupported CRS: EPSG:{epsg}")]
    UnsupportedCrs { epsg: u32 },

    // Rendering errors
    #[error("Render failed: {reason}")]
    Render { reason: String },

    // Source dataset errors
    #[error("Invalid {format} source at {path}: {reason}")]
    SourceFormat {
        format: String,
        path: PathBuf,
        reason: String,
    },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EnvriskError {
    pub fn projection(reason: impl Into<String>) -> Self {
        Self::Projection { reason: reason.into() }
    }

    pub fn invalid_geometry(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry { record: record.into(), reason: reason.into() }
    }

    pub fn render(reason: impl Into<String>) -> Self {
        Self::Render { reason: reason.into() }
    }

    /// Errors caused by the caller's input rather than by stored data.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, Self::Projection { .. } | Self::InvalidQuery { .. })
    }

    /// Errors that point at a defect in loaded layer data.
    pub fn is_geometry_defect(&self) -> bool {
        matches!(self, Self::InvalidGeometry { .. })
    }
}

pub type Result<T> = std::result::Result<T, EnvriskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(EnvriskError::projection("latitude out of range").is_bad_input());
        assert!(EnvriskError::InvalidQuery { reason: "radius".into() }.is_bad_input());
        assert!(!EnvriskError::render("no canvas").is_bad_input());

        let defect = EnvriskError::invalid_geometry("feature-7", "self-intersection");
        assert!(defect.is_geometry_defect());
        assert_eq!(
            defect.to_string(),
            "Invalid geometry in record feature-7: self-intersection"
        );
    }
}
