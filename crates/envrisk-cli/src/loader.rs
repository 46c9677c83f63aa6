//! Configuration and layer manifest loading for CLI commands

use anyhow::{Context, Result};
use envrisk_core::config::{parse_validity_mode, CliConfigOverrides, LayeredConfig};
use envrisk_core::models::{ClassificationRule, LayerMeta};
use envrisk_engine::{FallbackChain, ReportPlan, Section};
use envrisk_geo::GeometryStore;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::errors;

/// How a manifest layer's features are classified and drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Municipality fire counts in free-form attribute tables
    FireFrequency,
    /// PAND desertification classes in `DESER_CLA`
    Desertification,
    /// Keep all properties; graduated by `intensity_key` when given
    #[default]
    Attributes,
}

/// `[[layers]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct LayerEntry {
    pub id: String,
    pub title: Option<String>,
    pub path: PathBuf,
    #[serde(default)]
    pub preset: Preset,
    /// Integer class field; overrides the preset's classification
    pub code_field: Option<String>,
    pub intensity_key: Option<String>,
    pub match_key_field: Option<String>,
}

impl LayerEntry {
    pub fn meta(&self) -> LayerMeta {
        let title = self.title.clone().unwrap_or_else(|| self.id.clone());
        let mut meta = match self.preset {
            Preset::FireFrequency => LayerMeta::fire_frequency(self.id.as_str(), title),
            Preset::Desertification => LayerMeta::desertification(self.id.as_str(), title),
            Preset::Attributes => {
                LayerMeta::new(self.id.as_str(), title, ClassificationRule::Attributes)
            }
        };
        if let Some(field) = &self.code_field {
            meta.classification = ClassificationRule::Code { field: field.clone() };
        }
        if let Some(key) = &self.intensity_key {
            meta = meta.intensity_key(key.clone());
        }
        if let Some(field) = &self.match_key_field {
            meta = meta.match_key_field(field.clone());
        }
        meta
    }
}

/// `[[sections]]` entry; more than one layer forms a fallback chain
#[derive(Debug, Clone, Deserialize)]
pub struct SectionEntry {
    pub name: String,
    pub layers: Vec<String>,
}

/// Layer manifest, read from the same TOML file as the configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub layers: Vec<LayerEntry>,
    #[serde(default)]
    pub sections: Vec<SectionEntry>,

    /// Directory relative layer paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(errors::manifest_not_found(path).into());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let mut manifest: Manifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    pub fn resolve_path(&self, entry: &LayerEntry) -> PathBuf {
        if entry.path.is_absolute() {
            entry.path.clone()
        } else {
            self.base_dir.join(&entry.path)
        }
    }

    /// Sections from the manifest, or one single-layer section per layer
    pub fn plan(&self) -> Result<ReportPlan> {
        if self.sections.is_empty() {
            return Ok(self.layers.iter().fold(ReportPlan::new(), |plan, entry| {
                plan.section(Section::new(entry.id.clone(), FallbackChain::single(entry.id.as_str())))
            }));
        }

        self.sections.iter().try_fold(ReportPlan::new(), |plan, entry| {
            let chain = FallbackChain::new(entry.layers.iter().map(String::as_str))
                .with_context(|| format!("Section '{}' is invalid", entry.name))?;
            Ok(plan.section(Section::new(entry.name.clone(), chain)))
        })
    }
}

/// Defaults, then the file (when present), then `ENVRISK_*`, then flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if cli.config.exists() {
        config = config.load_from_file(&cli.config).context("Failed to load configuration file")?;
    }
    let mut config = config.load_from_env();

    let geometry_validity = cli.validity.as_deref().map(parse_validity_mode).transpose()?;
    config.update_from_cli(CliConfigOverrides {
        planar_crs: cli.planar_crs,
        radius_km: None,
        geometry_validity,
    });
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Read every manifest layer into a store
pub fn build_store(config: &LayeredConfig, manifest: &Manifest) -> Result<GeometryStore> {
    let mut builder = GeometryStore::builder_from_config(config)?;

    for entry in &manifest.layers {
        let path = manifest.resolve_path(entry);
        if !path.exists() {
            return Err(errors::layer_source_not_found(&entry.id, &path).into());
        }
        builder = builder
            .load_source(entry.meta(), &path)
            .with_context(|| format!("Failed to load layer '{}'", entry.id))?;
    }

    let store = builder.build();
    tracing::info!(layers = store.len(), "geometry store ready");
    Ok(store)
}
