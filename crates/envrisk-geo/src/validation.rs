//! Polygon validation applied when a layer is loaded

use geo::{Area, MultiPolygon, Polygon, Validation};

/// Validation result with details
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, location: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(ValidationError { location: location.into(), reason: reason.into() });
    }

    /// One-line description of every error, suitable as a defect reason.
    pub fn summary(&self) -> Option<String> {
        if self.is_valid() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| format!("{}: {}", e.location, e.reason))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Validate a multipolygon for point-in-polygon use.
///
/// Structural checks (finite coordinates, ring length, closure) run first;
/// topological checks only run on structurally sound input.
pub fn validate_multipolygon(multipolygon: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::default();

    if multipolygon.0.is_empty() {
        result.add_error("MultiPolygon", "geometry has no polygons");
        return result;
    }

    for (i, polygon) in multipolygon.0.iter().enumerate() {
        validate_polygon_structure(polygon, &format!("Polygon[{}]", i), &mut result);
    }
    if !result.is_valid() {
        return result;
    }

    if let Err(reason) = multipolygon.check_validation() {
        result.add_error("MultiPolygon", reason.to_string());
    }

    if multipolygon.unsigned_area() <= 0.0 {
        result.add_error("MultiPolygon", "zero area");
    }

    result
}

fn validate_polygon_structure(polygon: &Polygon<f64>, location: &str, result: &mut ValidationResult) {
    let rings = std::iter::once((format!("{} exterior", location), polygon.exterior())).chain(
        polygon
            .interiors()
            .iter()
            .enumerate()
            .map(|(i, ring)| (format!("{} interior[{}]", location, i), ring)),
    );

    for (ring_location, ring) in rings {
        if ring.0.len() < 4 {
            result.add_error(
                &ring_location,
                format!("ring must have at least 4 points, found {}", ring.0.len()),
            );
        }

        if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            result.add_error(&ring_location, "coordinates must be finite");
        }

        if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
            if first != last {
                result.add_error(&ring_location, "ring must be closed (first point == last point)");
            }
        }
    }
}
