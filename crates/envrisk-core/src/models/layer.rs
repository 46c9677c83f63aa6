//! Layer identity, classification rules and symbology.

use serde::{Deserialize, Serialize};

use super::record::{Classification, ClassificationRule};

/// Unique identifier for a layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// RGB color
pub type Rgb = [u8; 3];

/// Continuous color ramps for graduated layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorRamp {
    /// White to dark red
    #[default]
    Reds,
}

/// One entry of a categorical color table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryClass {
    pub code: i64,
    pub label: String,
    pub color: Rgb,
}

impl CategoryClass {
    pub fn new(code: i64, label: impl Into<String>, color: Rgb) -> Self {
        Self { code, label: label.into(), color }
    }
}

/// How a layer's records are colored when rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Symbology {
    /// Intensity normalized between the neighborhood's min and max
    Graduated { ramp: ColorRamp, opacity: f32 },
    /// Fixed color per classification code
    Categorical { classes: Vec<CategoryClass>, fallback: Rgb, opacity: f32 },
}

impl Symbology {
    /// Desertification classes (PAND programme)
    pub fn desertification() -> Self {
        Symbology::Categorical {
            classes: vec![
                CategoryClass::new(1, "BAJO (Low)", [0, 128, 0]),
                CategoryClass::new(2, "MEDIO (Medium)", [255, 255, 0]),
                CategoryClass::new(3, "ALTO (High)", [255, 165, 0]),
                CategoryClass::new(4, "MUY ALTO (Very High)", [255, 0, 0]),
                CategoryClass::new(8, "LÁMINAS DE AGUA (Water bodies)", [0, 0, 255]),
                CategoryClass::new(9, "URBANO (Urban)", [128, 128, 128]),
                CategoryClass::new(99, "FUERA DE PROGRAMA (Outside programme)", [255, 255, 255]),
            ],
            fallback: [0, 0, 0],
            opacity: 0.5,
        }
    }

    pub fn class(&self, code: i64) -> Option<&CategoryClass> {
        match self {
            Symbology::Categorical { classes, .. } => classes.iter().find(|c| c.code == code),
            Symbology::Graduated { .. } => None,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Symbology::Graduated { opacity, .. } | Symbology::Categorical { opacity, .. } => {
                *opacity
            }
        }
    }
}

impl Default for Symbology {
    fn default() -> Self {
        Symbology::Graduated { ramp: ColorRamp::Reds, opacity: 0.7 }
    }
}

/// Layer metadata: what the polygons mean and how to present them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMeta {
    pub id: LayerId,
    pub title: String,
    pub classification: ClassificationRule,
    /// Attribute key fragment holding the numeric intensity of attribute tables
    pub intensity_key: Option<String>,
    /// Attribute used as the human-facing match key
    pub match_key_field: Option<String>,
    pub symbology: Symbology,
}

impl LayerMeta {
    pub fn new(id: impl Into<LayerId>, title: impl Into<String>, rule: ClassificationRule) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            classification: rule,
            intensity_key: None,
            match_key_field: None,
            symbology: Symbology::default(),
        }
    }

    /// Historical fire-frequency zones, one record per municipality
    pub fn fire_frequency(id: impl Into<LayerId>, title: impl Into<String>) -> Self {
        Self::new(id, title, ClassificationRule::Attributes)
            .intensity_key("incendios")
            .match_key_field("Término municipal")
    }

    /// Desertification classification zones
    pub fn desertification(id: impl Into<LayerId>, title: impl Into<String>) -> Self {
        Self::new(id, title, ClassificationRule::Code { field: "DESER_CLA".to_string() })
            .symbology(Symbology::desertification())
    }

    pub fn intensity_key(mut self, key: impl Into<String>) -> Self {
        self.intensity_key = Some(key.into());
        self
    }

    pub fn match_key_field(mut self, field: impl Into<String>) -> Self {
        self.match_key_field = Some(field.into());
        self
    }

    pub fn symbology(mut self, symbology: Symbology) -> Self {
        self.symbology = symbology;
        self
    }

    pub fn intensity_of(&self, classification: &Classification) -> Option<f64> {
        classification.intensity(self.intensity_key.as_deref())
    }

    /// Human-readable label for a classification, when the symbology defines one.
    pub fn label_for(&self, classification: &Classification) -> Option<String> {
        let code = classification.code()?;
        match &self.symbology {
            Symbology::Categorical { .. } => Some(
                self.symbology
                    .class(code)
                    .map(|class| class.label.clone())
                    .unwrap_or_else(|| format!("Unknown code: {code}")),
            ),
            Symbology::Graduated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desertification_labels() {
        let meta = LayerMeta::desertification("desert_mainland", "Desertification, mainland");
        assert_eq!(meta.label_for(&Classification::Code(3)).as_deref(), Some("ALTO (High)"));
        assert_eq!(
            meta.label_for(&Classification::Code(42)).as_deref(),
            Some("Unknown code: 42")
        );
        assert_eq!(meta.label_for(&Classification::Unclassified), None);
        assert_eq!(meta.symbology.opacity(), 0.5);
    }

    #[test]
    fn test_fire_frequency_preset() {
        let meta = LayerMeta::fire_frequency("fire_1996_2005", "Fire frequency 1996-2005");
        assert_eq!(meta.classification, ClassificationRule::Attributes);
        assert_eq!(meta.intensity_key.as_deref(), Some("incendios"));
        assert_eq!(meta.match_key_field.as_deref(), Some("Término municipal"));
        assert!(matches!(meta.symbology, Symbology::Graduated { ramp: ColorRamp::Reds, .. }));
        assert_eq!(meta.label_for(&Classification::Code(3)), None);
    }
}
