use base64::Engine as _;
use envrisk_core::models::{Classification, LayerId};
use envrisk_render::EncodedImage;
use serde::{Serialize, Serializer};

/// Label reported for categorical layers when nothing matched
pub const NO_DATA_LABEL: &str = "No Data";

/// Label reported for graduated layers when nothing matched
pub const NO_RISK_LABEL: &str = "No risk";

/// Match key reported for attribute layers lacking the key field
pub const UNKNOWN_MATCH_KEY: &str = "Unknown";

/// Exact membership of a point in one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Membership {
    pub layer: LayerId,
    pub matched: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,

    /// Human-readable class label (categorical layers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Numeric intensity of the matched record, e.g. a fire count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,

    /// Human-facing key of the matched record, e.g. a municipality name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_key: Option<String>,

    /// Position of the matched record in load order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
}

impl Membership {
    pub fn no_match(layer: LayerId, label: Option<String>) -> Self {
        Self {
            layer,
            matched: false,
            classification: None,
            label,
            intensity: None,
            match_key: None,
            record_index: None,
        }
    }
}

/// Outcome of a neighborhood rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Rendered,
    /// No record near the point
    Empty,
    /// Rendering failed; membership is still valid
    Failed,
}

/// Rendered neighborhood of a point in one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborhoodImage {
    pub layer: LayerId,
    pub status: ImageStatus,
    pub has_image: bool,
    pub mime_type: String,
    /// Records drawn
    pub record_count: usize,

    #[serde(
        rename = "image_base64",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_base64"
    )]
    pub image_bytes: Option<Vec<u8>>,
}

impl NeighborhoodImage {
    pub fn rendered(layer: LayerId, image: EncodedImage, record_count: usize) -> Self {
        Self {
            layer,
            status: ImageStatus::Rendered,
            has_image: true,
            mime_type: image.mime_type,
            record_count,
            image_bytes: Some(image.bytes),
        }
    }

    pub fn without_image(layer: LayerId, status: ImageStatus, record_count: usize) -> Self {
        Self {
            layer,
            status,
            has_image: false,
            mime_type: envrisk_render::JPEG_MIME_TYPE.to_string(),
            record_count,
            image_bytes: None,
        }
    }

    /// `data:image/jpeg;base64,...` when an image exists
    pub fn data_uri(&self) -> Option<String> {
        let bytes = self.image_bytes.as_ref()?;
        Some(format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }
}

fn serialize_base64<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serializer
            .serialize_some(&base64::engine::general_purpose::STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// One named section of a hazard report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub name: String,
    /// Layer the section's answer came from
    pub layer: LayerId,
    pub membership: Membership,
    pub image: NeighborhoodImage,
}

/// Everything known about one query point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardReport {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub sections: Vec<SectionReport>,
}

impl HazardReport {
    pub fn section(&self, name: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.name == name)
    }
}
