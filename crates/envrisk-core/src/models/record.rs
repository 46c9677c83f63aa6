//! Polygon records and their classification values.

use geo::MultiPolygon;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EnvriskError, Result};

/// Free-form attribute table with no assumed schema.
///
/// Keeps the source property order; best-effort lookups (first key
/// containing a fragment) follow it.
pub type AttributeMap = IndexMap<String, String>;

/// Classification carried by a polygon record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Classification {
    /// Discrete risk code (e.g. desertification class)
    Code(i64),
    /// Numeric intensity
    Numeric(f64),
    /// Descriptive attribute table (e.g. fire-period placemark description)
    Attributes(AttributeMap),
    /// No value; hazard handled elsewhere
    Unclassified,
}

impl Classification {
    pub fn code(&self) -> Option<i64> {
        match self {
            Classification::Code(code) => Some(*code),
            _ => None,
        }
    }

    pub fn attributes(&self) -> Option<&AttributeMap> {
        match self {
            Classification::Attributes(map) => Some(map),
            _ => None,
        }
    }

    /// Numeric intensity used for graduated rendering.
    ///
    /// Attribute tables yield the first value whose key contains
    /// `intensity_key` (case-insensitive) that parses as a count.
    pub fn intensity(&self, intensity_key: Option<&str>) -> Option<f64> {
        match self {
            Classification::Code(code) => Some(*code as f64),
            Classification::Numeric(value) if value.is_finite() => Some(*value),
            Classification::Numeric(_) => None,
            Classification::Attributes(map) => {
                let fragment = intensity_key?.to_lowercase();
                map.iter()
                    .filter(|(key, _)| key.to_lowercase().contains(&fragment))
                    .find_map(|(_, value)| parse_count(value))
            }
            Classification::Unclassified => None,
        }
    }
}

/// Parse an integer count written with `.` or `,` thousands separators.
///
/// "1.234" → 1234.0. Returns `None` instead of failing.
pub fn parse_count(text: &str) -> Option<f64> {
    let digits: String =
        text.chars().filter(|c| !matches!(c, '.' | ',') && !c.is_whitespace()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|count| count as f64)
}

/// How a layer turns source feature properties into a classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ClassificationRule {
    /// Integer code read from one property
    Code { field: String },
    /// Floating point value read from one property
    Numeric { field: String },
    /// Keep every property as a string attribute
    Attributes,
}

impl ClassificationRule {
    pub fn classify(&self, properties: &serde_json::Map<String, Value>) -> Classification {
        match self {
            ClassificationRule::Code { field } => {
                match properties.get(field).and_then(value_as_code) {
                    Some(code) => Classification::Code(code),
                    None => Classification::Unclassified,
                }
            }
            ClassificationRule::Numeric { field } => {
                match properties.get(field).and_then(value_as_f64) {
                    Some(value) => Classification::Numeric(value),
                    None => Classification::Unclassified,
                }
            }
            ClassificationRule::Attributes => Classification::Attributes(
                properties.iter().map(|(k, v)| (k.clone(), value_as_string(v))).collect(),
            ),
        }
    }
}

fn value_as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One polygon of a layer, in the geographic frame.
#[derive(Debug, Clone)]
pub struct PolygonRecord {
    /// Source feature id, or load ordinal when the source has none
    pub key: String,
    pub geometry: MultiPolygon<f64>,
    pub classification: Classification,
    defect: Option<String>,
}

impl PolygonRecord {
    pub fn new(
        key: impl Into<String>,
        geometry: MultiPolygon<f64>,
        classification: Classification,
    ) -> Self {
        Self { key: key.into(), geometry, classification, defect: None }
    }

    /// Flag the record as malformed. Flagged records are kept but never tested.
    pub fn with_defect(mut self, reason: impl Into<String>) -> Self {
        self.defect = Some(reason.into());
        self
    }

    pub fn defect(&self) -> Option<&str> {
        self.defect.as_deref()
    }

    /// Fail with a geometry error if this record was flagged at load time.
    pub fn check(&self) -> Result<()> {
        match &self.defect {
            Some(reason) => Err(EnvriskError::invalid_geometry(&self.key, reason)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn props(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_code_rule() {
        let rule = ClassificationRule::Code { field: "DESER_CLA".into() };
        assert_eq!(rule.classify(&props(json!({"DESER_CLA": 3}))), Classification::Code(3));
        assert_eq!(rule.classify(&props(json!({"DESER_CLA": 4.0}))), Classification::Code(4));
        assert_eq!(rule.classify(&props(json!({"DESER_CLA": "99"}))), Classification::Code(99));
        assert_eq!(rule.classify(&props(json!({"OTHER": 1}))), Classification::Unclassified);
    }

    #[test]
    fn test_attribute_rule_and_fire_count() {
        let rule = ClassificationRule::Attributes;
        let classification = rule.classify(&props(json!({
            "Término municipal": "Cangas del Narcea",
            "Número de incendios": "1.234",
            "Superficie": 12.5,
        })));

        let attributes = classification.attributes().unwrap();
        assert_eq!(attributes["Superficie"], "12.5");
        assert_eq!(classification.intensity(Some("incendios")), Some(1234.0));
        assert_eq!(classification.intensity(Some("INCENDIOS")), Some(1234.0));
        assert_eq!(classification.intensity(None), None);
    }

    #[test]
    fn test_intensity_follows_source_property_order() {
        let classification = ClassificationRule::Attributes.classify(&props(json!({
            "Nº incendios (2005)": "5",
            "Incendios acumulados": "40",
        })));

        let keys: Vec<_> = classification.attributes().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["Nº incendios (2005)", "Incendios acumulados"]);
        assert_eq!(classification.intensity(Some("incendios")), Some(5.0));

        let reversed = Classification::Attributes(AttributeMap::from([
            ("Incendios acumulados".to_string(), "40".to_string()),
            ("Nº incendios (2005)".to_string(), "5".to_string()),
        ]));
        assert_eq!(reversed.intensity(Some("incendios")), Some(40.0));
    }

    #[test]
    fn test_unparseable_intensity_fails_soft() {
        let classification = Classification::Attributes(AttributeMap::from([(
            "Incendios".to_string(),
            "sin datos".to_string(),
        )]));
        assert_eq!(classification.intensity(Some("incendios")), None);
        assert_eq!(Classification::Unclassified.intensity(Some("incendios")), None);
        assert_eq!(Classification::Numeric(f64::NAN).intensity(None), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), Some(12.0));
        assert_eq!(parse_count("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_count("2,5"), Some(25.0));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("n/a"), None);
    }

    #[test]
    fn test_record_defect() {
        let record = PolygonRecord::new("a", MultiPolygon::new(vec![]), Classification::Code(1));
        assert!(record.check().is_ok());

        let flagged = record.with_defect("ring self-intersects");
        let err = flagged.check().unwrap_err();
        assert!(err.is_geometry_defect());
        assert_eq!(flagged.defect(), Some("ring self-intersects"));
    }

    proptest! {
        /// Counts written with dot thousands separators parse back exactly.
        #[test]
        fn prop_parse_count_with_separators(count in 0i64..10_000_000) {
            let digits = count.to_string();
            let grouped: Vec<String> = digits
                .as_bytes()
                .rchunks(3)
                .rev()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect();
            prop_assert_eq!(parse_count(&grouped.join(".")), Some(count as f64));
        }
    }
}
