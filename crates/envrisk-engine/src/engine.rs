use envrisk_core::config::LayeredConfig;
use envrisk_core::error::{EnvriskError, Result};
use envrisk_core::models::{Classification, Distance, LayerId, LayerMeta, QueryPoint, Symbology};
use envrisk_geo::{GeometryStore, Layer, MatchResult, Neighborhood};
use envrisk_render::{RenderOutcome, RenderSettings, Renderer, Scene, Shape};
use geo::Coord;
use std::sync::Arc;

use crate::models::{
    HazardReport, ImageStatus, Membership, NeighborhoodImage, SectionReport, NO_DATA_LABEL,
    NO_RISK_LABEL, UNKNOWN_MATCH_KEY,
};
use crate::plan::{FallbackChain, ReportPlan};

/// Query defaults and render parameters
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub default_radius: Distance,
    pub render: RenderSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { default_radius: Distance::kilometers(100.0), render: RenderSettings::default() }
    }
}

impl EngineSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            default_radius: Distance::kilometers(config.radius_km.value),
            render: RenderSettings::from_config(config),
        }
    }
}

/// Answers point queries against a shared, read-only geometry store
#[derive(Debug, Clone)]
pub struct RiskEngine {
    store: Arc<GeometryStore>,
    renderer: Renderer,
    default_radius: Distance,
}

impl RiskEngine {
    pub fn new(store: Arc<GeometryStore>, settings: EngineSettings) -> Self {
        Self {
            store,
            renderer: Renderer::new(settings.render),
            default_radius: settings.default_radius,
        }
    }

    pub fn from_config(store: Arc<GeometryStore>, config: &LayeredConfig) -> Self {
        Self::new(store, EngineSettings::from_config(config))
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn default_radius(&self) -> Distance {
        self.default_radius
    }

    /// Exact membership of (lat, lon) in one layer
    pub fn resolve_membership(&self, layer_id: &LayerId, lat: f64, lon: f64) -> Result<Membership> {
        let (point, _) = self.locate(lat, lon)?;
        self.membership_at(layer_id, &point)
    }

    /// Render the neighborhood of (lat, lon) in one layer.
    ///
    /// `radius_km` falls back to the configured default. A rendering
    /// failure is logged and reported as [`ImageStatus::Failed`].
    pub fn render_neighborhood(
        &self,
        layer_id: &LayerId,
        lat: f64,
        lon: f64,
        radius_km: Option<f64>,
    ) -> Result<NeighborhoodImage> {
        let radius = self.radius(radius_km)?;
        let (_, center) = self.locate(lat, lon)?;
        self.image_at(layer_id, center, radius)
    }

    /// Try each layer of the chain in order; the first match wins.
    ///
    /// The image belongs to the matched layer, or to the last layer tried
    /// when nothing matched. `center` is `point` in the planar frame.
    pub fn resolve_chain(
        &self,
        name: &str,
        chain: &FallbackChain,
        point: &QueryPoint,
        center: Coord<f64>,
        radius: Distance,
    ) -> Result<SectionReport> {
        let mut last = None;
        for layer_id in chain.layers() {
            let membership = self.membership_at(layer_id, point)?;
            let matched = membership.matched;
            last = Some((layer_id, membership));
            if matched {
                break;
            }
        }

        let (layer_id, membership) = last.ok_or_else(|| EnvriskError::InvalidQuery {
            reason: format!("section '{}' has no layers", name),
        })?;

        tracing::debug!(section = name, layer = %layer_id, matched = membership.matched, "section resolved");
        let image = self.image_at(layer_id, center, radius)?;

        Ok(SectionReport { name: name.to_string(), layer: layer_id.clone(), membership, image })
    }

    /// Evaluate every section of a plan for one point.
    ///
    /// The point and radius are checked once, before any section runs.
    pub fn report(
        &self,
        plan: &ReportPlan,
        lat: f64,
        lon: f64,
        radius_km: Option<f64>,
    ) -> Result<HazardReport> {
        let radius = self.radius(radius_km)?;
        let (point, center) = self.locate(lat, lon)?;

        let sections = plan
            .sections
            .iter()
            .map(|section| self.resolve_chain(&section.name, &section.chain, &point, center, radius))
            .collect::<Result<Vec<_>>>()?;

        Ok(HazardReport { lat, lon, radius_km: radius.value, sections })
    }

    /// Validate (lat, lon) and project it into the planar frame
    fn locate(&self, lat: f64, lon: f64) -> Result<(QueryPoint, Coord<f64>)> {
        let point = QueryPoint::new(lat, lon)?;
        let center = self.store.projector().to_planar(&point)?;
        Ok((point, center))
    }

    fn radius(&self, radius_km: Option<f64>) -> Result<Distance> {
        let radius = radius_km.map(Distance::kilometers).unwrap_or(self.default_radius);
        radius.validate_radius()?;
        Ok(radius)
    }

    fn membership_at(&self, layer_id: &LayerId, point: &QueryPoint) -> Result<Membership> {
        let layer = self.store.layer(layer_id)?;
        let membership = match self.store.resolve(layer_id, point)? {
            MatchResult::Matched { index, record } => {
                let meta = layer.meta();
                Membership {
                    layer: layer_id.clone(),
                    matched: true,
                    classification: Some(record.classification.clone()),
                    label: meta.label_for(&record.classification),
                    intensity: meta.intensity_of(&record.classification),
                    match_key: Some(match_key(meta, &record.classification, &record.key)),
                    record_index: Some(index),
                }
            }
            MatchResult::NoMatch => {
                Membership::no_match(layer_id.clone(), Some(no_match_label(layer)))
            }
        };
        Ok(membership)
    }

    fn image_at(
        &self,
        layer_id: &LayerId,
        center: Coord<f64>,
        radius: Distance,
    ) -> Result<NeighborhoodImage> {
        let layer = self.store.layer(layer_id)?;
        let neighborhood = self.store.neighborhood_around(layer_id, center, radius)?;
        let scene = scene_for(layer, &neighborhood);
        let count = scene.shapes.len();

        let image = match self.renderer.render(&scene) {
            Ok(RenderOutcome::Image(image)) => {
                NeighborhoodImage::rendered(layer_id.clone(), image, count)
            }
            Ok(RenderOutcome::NoImage) => {
                NeighborhoodImage::without_image(layer_id.clone(), ImageStatus::Empty, 0)
            }
            Err(e) => {
                tracing::warn!(layer = %layer_id, error = %e, "neighborhood rendering failed");
                NeighborhoodImage::without_image(layer_id.clone(), ImageStatus::Failed, count)
            }
        };
        Ok(image)
    }
}

fn scene_for<'a>(layer: &'a Layer, neighborhood: &Neighborhood<'a>) -> Scene<'a> {
    neighborhood.entries.iter().fold(
        Scene::new(&layer.meta().symbology, neighborhood.center),
        |scene, entry| {
            scene.shape(Shape {
                geometry: &entry.footprint.geometry,
                intensity: entry.intensity,
                code: entry.record.classification.code(),
            })
        },
    )
}

/// Attribute layers report the key field or "Unknown"; others the record key
fn match_key(meta: &LayerMeta, classification: &Classification, record_key: &str) -> String {
    match (&meta.match_key_field, classification.attributes()) {
        (Some(field), Some(attributes)) => attributes
            .get(field)
            .filter(|value| !value.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_MATCH_KEY.to_string()),
        _ => record_key.to_string(),
    }
}

fn no_match_label(layer: &Layer) -> String {
    match layer.meta().symbology {
        Symbology::Categorical { .. } => NO_DATA_LABEL.to_string(),
        Symbology::Graduated { .. } => NO_RISK_LABEL.to_string(),
    }
}
