//! Which layers a report consults, and in what order

use envrisk_core::error::{EnvriskError, Result};
use envrisk_core::models::LayerId;
use envrisk_geo::GeometryStore;
use serde::{Deserialize, Serialize};

/// Ordered list of layers tried until one matches.
///
/// A single-layer chain is an ordinary layer query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackChain {
    layers: Vec<LayerId>,
}

impl FallbackChain {
    pub fn new(layers: impl IntoIterator<Item = impl Into<LayerId>>) -> Result<Self> {
        let layers: Vec<LayerId> = layers.into_iter().map(Into::into).collect();
        if layers.is_empty() {
            return Err(EnvriskError::InvalidQuery {
                reason: "a fallback chain needs at least one layer".to_string(),
            });
        }
        Ok(Self { layers })
    }

    pub fn single(layer: impl Into<LayerId>) -> Self {
        Self { layers: vec![layer.into()] }
    }

    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    pub fn is_fallback(&self) -> bool {
        self.layers.len() > 1
    }
}

/// A named report section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub chain: FallbackChain,
}

impl Section {
    pub fn new(name: impl Into<String>, chain: FallbackChain) -> Self {
        Self { name: name.into(), chain }
    }
}

/// Sections evaluated for every query point, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPlan {
    pub sections: Vec<Section>,
}

impl ReportPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Keep only the named section
    pub fn only(&self, name: &str) -> Result<Self> {
        let section = self
            .sections
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| EnvriskError::InvalidQuery {
                reason: format!("no report section named '{}'", name),
            })?;
        Ok(Self { sections: vec![section] })
    }

    /// Every layer any section refers to
    pub fn layer_ids(&self) -> impl Iterator<Item = &LayerId> {
        self.sections.iter().flat_map(|s| s.chain.layers())
    }

    /// Fail when a section names a layer the store does not hold
    pub fn check_layers(&self, store: &GeometryStore) -> Result<()> {
        for section in &self.sections {
            if let Some(missing) = section.chain.layers().iter().find(|id| store.layer(id).is_err()) {
                return Err(EnvriskError::ConfigInvalid {
                    key: "sections".to_string(),
                    reason: format!(
                        "section '{}' names layer '{}', which is not loaded",
                        section.name, missing
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envrisk_core::models::{Crs, LayerMeta};
    use envrisk_geo::LayerBuilder;

    #[test]
    fn test_empty_chain_is_rejected() {
        assert!(FallbackChain::new(Vec::<LayerId>::new()).is_err());
        let chain = FallbackChain::new(["a", "b"]).unwrap();
        assert!(chain.is_fallback());
        assert!(!FallbackChain::single("a").is_fallback());
    }

    fn plan() -> ReportPlan {
        ReportPlan::new()
            .section(Section::new("fire_1996_2005", FallbackChain::single("fire_1996_2005")))
            .section(Section::new(
                "desertification",
                FallbackChain::new(["desert_mainland", "desert_canarias"]).unwrap(),
            ))
    }

    #[test]
    fn test_only_keeps_one_section() {
        let plan = plan();
        assert_eq!(plan.layer_ids().count(), 3);

        let desert = plan.only("desertification").unwrap();
        assert_eq!(desert.sections.len(), 1);
        assert_eq!(desert.sections[0].chain.layers()[1].as_str(), "desert_canarias");
        assert!(plan.only("seismic").is_err());
    }

    #[test]
    fn test_check_layers_names_missing_layer() {
        let store = GeometryStore::builder(&Crs::etrs89_utm30n())
            .unwrap()
            .layer(LayerBuilder::new(LayerMeta::fire_frequency("fire_1996_2005", "Fires")))
            .unwrap()
            .layer(LayerBuilder::new(LayerMeta::desertification("desert_mainland", "Mainland")))
            .unwrap()
            .build();

        let err = plan().check_layers(&store).unwrap_err();
        assert!(matches!(err, EnvriskError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("'desertification'"));
        assert!(err.to_string().contains("'desert_canarias'"));

        assert!(plan().only("fire_1996_2005").unwrap().check_layers(&store).is_ok());
    }
}
