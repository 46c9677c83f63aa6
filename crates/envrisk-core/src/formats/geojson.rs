//! GeoJSON source reader

use geo::{Geometry as GeoGeometry, MultiPolygon};
use std::fs;
use std::path::Path;

use crate::error::{EnvriskError, Result};
use crate::formats::{LayerSource, SourceFeature, SourceReader};
use crate::models::Crs;

/// GeoJSON format reader
pub struct GeoJsonReader;

impl SourceReader for GeoJsonReader {
    fn read(&self, path: &Path) -> Result<LayerSource> {
        let content = fs::read_to_string(path)?;
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();
        parse_layer_source(&content, name, path)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

/// Parse GeoJSON text into a layer source. `path` is only used in error messages.
pub fn parse_layer_source(content: &str, name: String, path: &Path) -> Result<LayerSource> {
    let format_error = |reason: String| EnvriskError::SourceFormat {
        format: "GeoJSON".to_string(),
        path: path.to_path_buf(),
        reason,
    };

    let geojson: geojson::GeoJson =
        content.parse().map_err(|e| format_error(format!("Failed to parse GeoJSON: {}", e)))?;

    let (features, epsg) = match geojson {
        geojson::GeoJson::FeatureCollection(fc) => {
            // Default to WGS84 if not specified
            let epsg = fc
                .foreign_members
                .as_ref()
                .and_then(|fm| fm.get("crs"))
                .and_then(extract_epsg_from_crs)
                .unwrap_or(4326);
            (fc.features, epsg)
        }
        geojson::GeoJson::Feature(feature) => (vec![feature], 4326),
        geojson::GeoJson::Geometry(geometry) => {
            let feature = geojson::Feature {
                geometry: Some(geometry),
                ..Default::default()
            };
            (vec![feature], 4326)
        }
    };
    let crs = Crs::from_epsg(epsg)?;

    let mut converted = Vec::with_capacity(features.len());
    let mut skipped = 0;
    for (idx, feature) in features.into_iter().enumerate() {
        let id = feature
            .id
            .as_ref()
            .map(|id| match id {
                geojson::feature::Id::String(s) => s.clone(),
                geojson::feature::Id::Number(n) => n.to_string(),
            })
            .unwrap_or_else(|| idx.to_string());

        let geometry = match feature.geometry.map(GeoGeometry::<f64>::try_from) {
            Some(Ok(geometry)) => polygonal(geometry),
            Some(Err(e)) => {
                tracing::warn!(feature = %id, error = %e, "skipping feature with unreadable geometry");
                None
            }
            None => None,
        };

        match geometry {
            Some(geometry) => converted.push(SourceFeature {
                id,
                geometry,
                properties: feature.properties.unwrap_or_default(),
            }),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(source = %name, skipped, "features without polygonal geometry were skipped");
    }

    Ok(LayerSource { name, crs, features: converted, skipped })
}

/// Keep the polygonal part of a geometry
fn polygonal(geometry: GeoGeometry<f64>) -> Option<MultiPolygon<f64>> {
    let polygons = match geometry {
        GeoGeometry::Polygon(polygon) => vec![polygon],
        GeoGeometry::MultiPolygon(multi) => multi.0,
        GeoGeometry::Rect(rect) => vec![rect.to_polygon()],
        GeoGeometry::GeometryCollection(collection) => collection
            .0
            .into_iter()
            .filter_map(polygonal)
            .flat_map(|multi| multi.0)
            .collect(),
        _ => Vec::new(),
    };
    (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
}

/// Extract EPSG code from CRS object
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    // "EPSG:25830" or "urn:ogc:def:crs:EPSG::25830"; CRS84 is plain lon/lat
    let name = crs.get("properties")?.get("name")?.as_str()?;
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    name.split(':').next_back()?.parse().ok()
}
