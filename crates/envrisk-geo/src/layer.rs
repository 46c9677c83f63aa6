//! Layer construction: reprojection, validation, footprints and indexing

use envrisk_core::config::LayeredConfig;
use envrisk_core::error::Result;
use envrisk_core::formats::LayerSource;
use envrisk_core::models::{Crs, LayerId, LayerMeta, PolygonRecord, ValidityMode};
use geo::{BoundingRect, Centroid, MultiPolygon, Point, Rect, Relate};
use serde::Serialize;

use crate::index::SpatialIndex;
use crate::transform::{CrsTransform, Projector};
use crate::validation::validate_multipolygon;

/// Options applied to every layer while loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub validity: ValidityMode,
    pub check_overlaps: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { validity: ValidityMode::Strict, check_overlaps: true }
    }
}

impl LoadOptions {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            validity: config.geometry_validity.value,
            check_overlaps: config.check_overlaps.value,
        }
    }
}

/// Record geometry in the planar frame, with its precomputed envelope and centroid
#[derive(Debug, Clone)]
pub struct PlanarFootprint {
    pub geometry: MultiPolygon<f64>,
    pub envelope: Rect<f64>,
    pub centroid: Point<f64>,
}

impl PlanarFootprint {
    fn from_geometry(geometry: MultiPolygon<f64>) -> Option<Self> {
        let envelope = geometry.bounding_rect()?;
        let centroid = geometry.centroid()?;
        Some(Self { geometry, envelope, centroid })
    }
}

/// Counts gathered while a layer was built
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Records kept and queryable
    pub loaded: usize,
    /// Records dropped in strict mode
    pub discarded: usize,
    /// Records kept but flagged in lenient mode
    pub defective: usize,
    /// Source features without polygonal geometry
    pub skipped_features: usize,
    /// Keys of record pairs whose interiors intersect
    pub overlaps: Vec<(String, String)>,
}

/// An immutable, validated set of polygon records sharing one meaning
#[derive(Debug)]
pub struct Layer {
    meta: LayerMeta,
    source_crs: Crs,
    records: Vec<PolygonRecord>,
    footprints: Vec<Option<PlanarFootprint>>,
    index: SpatialIndex,
    report: LoadReport,
}

impl Layer {
    pub fn id(&self) -> &LayerId {
        &self.meta.id
    }

    pub fn meta(&self) -> &LayerMeta {
        &self.meta
    }

    /// CRS the records were read in, before reprojection
    pub fn source_crs(&self) -> &Crs {
        &self.source_crs
    }

    /// Records in load order, geometries in the geographic frame
    pub fn records(&self) -> &[PolygonRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&PolygonRecord> {
        self.records.get(index)
    }

    /// Planar footprint; `None` for flagged records
    pub fn footprint(&self, index: usize) -> Option<&PlanarFootprint> {
        self.footprints.get(index).and_then(Option::as_ref)
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builder for a [`Layer`]
#[derive(Debug)]
pub struct LayerBuilder {
    meta: LayerMeta,
    source_crs: Crs,
    records: Vec<PolygonRecord>,
    skipped_features: usize,
}

impl LayerBuilder {
    pub fn new(meta: LayerMeta) -> Self {
        Self { meta, source_crs: Crs::wgs84(), records: Vec::new(), skipped_features: 0 }
    }

    /// Classify every source feature with the layer's rule
    pub fn from_source(meta: LayerMeta, source: LayerSource) -> Self {
        let records = source
            .features
            .into_iter()
            .map(|feature| {
                let classification = meta.classification.classify(&feature.properties);
                PolygonRecord::new(feature.id, feature.geometry, classification)
            })
            .collect();

        Self { meta, source_crs: source.crs, records, skipped_features: source.skipped }
    }

    pub fn id(&self) -> &LayerId {
        &self.meta.id
    }

    /// CRS of the geometries handed to this builder
    pub fn source_crs(mut self, crs: Crs) -> Self {
        self.source_crs = crs;
        self
    }

    pub fn record(mut self, record: PolygonRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn records(mut self, records: impl IntoIterator<Item = PolygonRecord>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn build(self, projector: &Projector, options: LoadOptions) -> Result<Layer> {
        let to_geographic = if self.source_crs.epsg == 4326 {
            None
        } else {
            Some(CrsTransform::new(&self.source_crs, &Crs::wgs84())?)
        };

        let mut report =
            LoadReport { skipped_features: self.skipped_features, ..Default::default() };
        let mut records = Vec::with_capacity(self.records.len());
        let mut footprints = Vec::with_capacity(self.records.len());

        for record in self.records {
            match prepare(record, to_geographic.as_ref(), projector) {
                Ok((record, footprint)) => {
                    records.push(record);
                    footprints.push(Some(footprint));
                    report.loaded += 1;
                }
                Err((record, reason)) => match options.validity {
                    ValidityMode::Strict => {
                        tracing::warn!(
                            layer = %self.meta.id,
                            record = %record.key,
                            %reason,
                            "discarding invalid record"
                        );
                        report.discarded += 1;
                    }
                    ValidityMode::Lenient => {
                        tracing::warn!(
                            layer = %self.meta.id,
                            record = %record.key,
                            %reason,
                            "keeping invalid record flagged"
                        );
                        records.push(record.with_defect(reason));
                        footprints.push(None);
                        report.defective += 1;
                    }
                },
            }
        }

        let index = SpatialIndex::from_envelopes(
            footprints
                .iter()
                .enumerate()
                .filter_map(|(i, footprint)| footprint.as_ref().map(|f| (i, f.envelope))),
        );

        if options.check_overlaps {
            report.overlaps = find_overlaps(&records, &footprints, &index);
            for (a, b) in &report.overlaps {
                tracing::warn!(
                    layer = %self.meta.id,
                    first = %a,
                    second = %b,
                    "overlapping records; the first in load order wins"
                );
            }
        }

        tracing::info!(
            layer = %self.meta.id,
            crs = %self.source_crs,
            loaded = report.loaded,
            discarded = report.discarded,
            defective = report.defective,
            overlaps = report.overlaps.len(),
            "layer loaded"
        );

        Ok(Layer { meta: self.meta, source_crs: self.source_crs, records, footprints, index, report })
    }
}

/// Reproject, validate and project one record. On failure the record comes
/// back with the reason so the caller can discard or flag it.
fn prepare(
    mut record: PolygonRecord,
    to_geographic: Option<&CrsTransform>,
    projector: &Projector,
) -> std::result::Result<(PolygonRecord, PlanarFootprint), (PolygonRecord, String)> {
    if let Some(reason) = record.defect() {
        let reason = reason.to_string();
        return Err((record, reason));
    }

    if let Some(transform) = to_geographic {
        match transform.multipolygon(&record.geometry) {
            Ok(geometry) => record.geometry = geometry,
            Err(e) => return Err((record, e.to_string())),
        }
    }

    if let Some(reason) = validate_multipolygon(&record.geometry).summary() {
        return Err((record, reason));
    }

    let planar = match projector.project_multipolygon(&record.geometry) {
        Ok(planar) => planar,
        Err(e) => return Err((record, e.to_string())),
    };

    match PlanarFootprint::from_geometry(planar) {
        Some(footprint) => Ok((record, footprint)),
        None => Err((record, "planar footprint has no extent".to_string())),
    }
}

/// Pairs of records whose interiors intersect, found through the index
fn find_overlaps(
    records: &[PolygonRecord],
    footprints: &[Option<PlanarFootprint>],
    index: &SpatialIndex,
) -> Vec<(String, String)> {
    let mut overlaps = Vec::new();

    for (i, footprint) in footprints.iter().enumerate() {
        let Some(footprint) = footprint else { continue };
        let min = footprint.envelope.min();
        let max = footprint.envelope.max();

        for j in index.query_bbox([min.x, min.y], [max.x, max.y]) {
            if j <= i {
                continue;
            }
            let matrix = records[i].geometry.relate(&records[j].geometry);
            if matrix.is_intersects() && !matrix.is_touches() {
                overlaps.push((records[i].key.clone(), records[j].key.clone()));
            }
        }
    }

    overlaps
}
