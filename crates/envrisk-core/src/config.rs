use crate::error::{EnvriskError, Result};
use crate::models::{Crs, ValidityMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the risk engine
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// EPSG code of the planar frame used for distances and rendering
    pub planar_crs: ConfigValue<u32>,
    /// Default neighborhood radius
    pub radius_km: ConfigValue<f64>,
    pub image_width: ConfigValue<u32>,
    pub image_height: ConfigValue<u32>,
    pub jpeg_quality: ConfigValue<u8>,
    /// Upper bound for an encoded neighborhood image
    pub max_image_bytes: ConfigValue<usize>,
    pub geometry_validity: ConfigValue<ValidityMode>,
    /// Warn about overlapping polygons within a layer at load time
    pub check_overlaps: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            planar_crs: ConfigValue::new(25830, ConfigSource::Default),
            radius_km: ConfigValue::new(100.0, ConfigSource::Default),
            image_width: ConfigValue::new(480, ConfigSource::Default),
            image_height: ConfigValue::new(400, ConfigSource::Default),
            jpeg_quality: ConfigValue::new(50, ConfigSource::Default),
            max_image_bytes: ConfigValue::new(64 * 1024, ConfigSource::Default),
            geometry_validity: ConfigValue::new(ValidityMode::Strict, ConfigSource::Default),
            check_overlaps: ConfigValue::new(true, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| EnvriskError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| EnvriskError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(planar_crs) = file_config.planar_crs {
            self.planar_crs.update(planar_crs, ConfigSource::File);
        }
        if let Some(radius_km) = file_config.radius_km {
            self.radius_km.update(radius_km, ConfigSource::File);
        }
        if let Some(image_width) = file_config.image_width {
            self.image_width.update(image_width, ConfigSource::File);
        }
        if let Some(image_height) = file_config.image_height {
            self.image_height.update(image_height, ConfigSource::File);
        }
        if let Some(jpeg_quality) = file_config.jpeg_quality {
            self.jpeg_quality.update(jpeg_quality, ConfigSource::File);
        }
        if let Some(max_image_bytes) = file_config.max_image_bytes {
            self.max_image_bytes.update(max_image_bytes, ConfigSource::File);
        }
        if let Some(geometry_validity) = file_config.geometry_validity {
            self.geometry_validity.update(geometry_validity, ConfigSource::File);
        }
        if let Some(check_overlaps) = file_config.check_overlaps {
            self.check_overlaps.update(check_overlaps, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        env_override("ENVRISK_PLANAR_CRS", &mut self.planar_crs);
        env_override("ENVRISK_RADIUS_KM", &mut self.radius_km);
        env_override("ENVRISK_IMAGE_WIDTH", &mut self.image_width);
        env_override("ENVRISK_IMAGE_HEIGHT", &mut self.image_height);
        env_override("ENVRISK_JPEG_QUALITY", &mut self.jpeg_quality);
        env_override("ENVRISK_MAX_IMAGE_BYTES", &mut self.max_image_bytes);
        env_override("ENVRISK_CHECK_OVERLAPS", &mut self.check_overlaps);

        if let Ok(validity_str) = env::var("ENVRISK_GEOMETRY_VALIDITY") {
            match parse_validity_mode(&validity_str) {
                Ok(validity) => self.geometry_validity.update(validity, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ENVRISK_GEOMETRY_VALIDITY value '{}': expected strict or lenient",
                    validity_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(planar_crs) = overrides.planar_crs {
            self.planar_crs.update(planar_crs, ConfigSource::Cli);
        }
        if let Some(radius_km) = overrides.radius_km {
            self.radius_km.update(radius_km, ConfigSource::Cli);
        }
        if let Some(geometry_validity) = overrides.geometry_validity {
            self.geometry_validity.update(geometry_validity, ConfigSource::Cli);
        }
    }

    /// Check value ranges that the engine relies on
    pub fn validate(&self) -> Result<()> {
        Crs::from_epsg(self.planar_crs.value)?;

        if !self.radius_km.value.is_finite() || self.radius_km.value < 0.0 {
            return Err(EnvriskError::ConfigInvalid {
                key: "radius_km".to_string(),
                reason: format!("must be a non-negative number, got {}", self.radius_km.value),
            });
        }
        if self.image_width.value == 0 || self.image_height.value == 0 {
            return Err(EnvriskError::ConfigInvalid {
                key: "image_width/image_height".to_string(),
                reason: "image dimensions must be non-zero".to_string(),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality.value) {
            return Err(EnvriskError::ConfigInvalid {
                key: "jpeg_quality".to_string(),
                reason: format!("must be within 1..=100, got {}", self.jpeg_quality.value),
            });
        }
        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "planar_crs".to_string(),
            (format!("EPSG:{}", self.planar_crs.value), self.planar_crs.source),
        );
        map.insert(
            "radius_km".to_string(),
            (self.radius_km.value.to_string(), self.radius_km.source),
        );
        map.insert(
            "image_width".to_string(),
            (self.image_width.value.to_string(), self.image_width.source),
        );
        map.insert(
            "image_height".to_string(),
            (self.image_height.value.to_string(), self.image_height.source),
        );
        map.insert(
            "jpeg_quality".to_string(),
            (self.jpeg_quality.value.to_string(), self.jpeg_quality.source),
        );
        map.insert(
            "max_image_bytes".to_string(),
            (self.max_image_bytes.value.to_string(), self.max_image_bytes.source),
        );
        map.insert(
            "geometry_validity".to_string(),
            (format!("{:?}", self.geometry_validity.value), self.geometry_validity.source),
        );
        map.insert(
            "check_overlaps".to_string(),
            (self.check_overlaps.value.to_string(), self.check_overlaps.source),
        );

        map
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut ConfigValue<T>) {
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => target.update(value, ConfigSource::Environment),
            Err(_) => tracing::warn!("Invalid {} value '{}': ignoring", key, raw),
        }
    }
}

/// Configuration loaded from TOML file.
///
/// Unknown keys are ignored so the same file can carry the layer manifest.
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    planar_crs: Option<u32>,
    radius_km: Option<f64>,
    image_width: Option<u32>,
    image_height: Option<u32>,
    jpeg_quality: Option<u8>,
    max_image_bytes: Option<usize>,
    geometry_validity: Option<ValidityMode>,
    check_overlaps: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub planar_crs: Option<u32>,
    pub radius_km: Option<f64>,
    pub geometry_validity: Option<ValidityMode>,
}

/// Parse validity mode from string
pub fn parse_validity_mode(s: &str) -> Result<ValidityMode> {
    match s.to_lowercase().as_str() {
        "strict" => Ok(ValidityMode::Strict),
        "lenient" => Ok(ValidityMode::Lenient),
        _ => Err(EnvriskError::ConfigInvalid {
            key: "geometry_validity".to_string(),
            reason: format!("Invalid validity mode: {}. Use strict or lenient", s),
        }),
    }
}
