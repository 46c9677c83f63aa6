//! Radius-bounded neighborhood extraction for rendering

use envrisk_core::error::Result;
use envrisk_core::models::{Distance, PolygonRecord, QueryPoint};
use geo::Coord;

use crate::layer::{Layer, PlanarFootprint};
use crate::transform::Projector;

/// A record accepted into a neighborhood
#[derive(Debug, Clone)]
pub struct NeighborhoodEntry<'a> {
    /// Record index within the layer
    pub index: usize,
    pub record: &'a PolygonRecord,
    pub footprint: &'a PlanarFootprint,
    /// Planar distance from the query point to the record centroid
    pub distance_m: f64,
    /// Render intensity; 0.0 when the record carries none
    pub intensity: f64,
}

/// Records of one layer around a query point, in load order
#[derive(Debug, Clone)]
pub struct Neighborhood<'a> {
    /// Query point in the planar frame
    pub center: Coord<f64>,
    pub radius_m: f64,
    pub entries: Vec<NeighborhoodEntry<'a>>,
}

impl Neighborhood<'_> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.index).collect()
    }
}

/// Records whose planar centroid lies within `radius` of `point`.
///
/// The R-tree is queried with a box of side `2 * radius` around the
/// projected point; candidates are then kept by centroid distance. This is
/// for visualization only and is not a membership test.
pub fn filter_nearby<'a>(
    layer: &'a Layer,
    projector: &Projector,
    point: &QueryPoint,
    radius: Distance,
) -> Result<Neighborhood<'a>> {
    radius.validate_radius()?;
    let center = projector.to_planar(point)?;
    filter_around(layer, center, radius)
}

/// Same as [`filter_nearby`] for a query point already in the planar frame
pub fn filter_around(
    layer: &Layer,
    center: Coord<f64>,
    radius: Distance,
) -> Result<Neighborhood<'_>> {
    radius.validate_radius()?;
    let radius_m = radius.to_meters();

    let candidates = layer.index().query_around([center.x, center.y], radius_m);
    let mut entries = Vec::with_capacity(candidates.len());

    for index in candidates {
        let Some(record) = layer.record(index) else { continue };
        if let Err(e) = record.check() {
            tracing::warn!(layer = %layer.id(), error = %e, "skipping defective record");
            continue;
        }
        let Some(footprint) = layer.footprint(index) else { continue };

        let centroid = footprint.centroid;
        let distance_m = (centroid.x() - center.x).hypot(centroid.y() - center.y);
        if distance_m <= radius_m {
            entries.push(NeighborhoodEntry {
                index,
                record,
                footprint,
                distance_m,
                intensity: layer.meta().intensity_of(&record.classification).unwrap_or(0.0),
            });
        }
    }

    tracing::debug!(
        layer = %layer.id(),
        radius_m,
        kept = entries.len(),
        "neighborhood filtered"
    );

    Ok(Neighborhood { center, radius_m, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerBuilder, LoadOptions};
    use envrisk_core::models::{AttributeMap, Classification, LayerMeta};
    use geo::{polygon, MultiPolygon};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]])
    }

    #[test]
    fn test_missing_intensity_defaults_to_zero() {
        let projector = Projector::from_epsg(25830).unwrap();
        let counted = AttributeMap::from([("Nº incendios".to_string(), "12".to_string())]);
        let blank = AttributeMap::from([("Nº incendios".to_string(), "-".to_string())]);

        let layer = LayerBuilder::new(LayerMeta::fire_frequency("fire", "Fire"))
            .record(PolygonRecord::new(
                "a",
                square(-3.70, 40.40, 0.05),
                Classification::Attributes(counted),
            ))
            .record(PolygonRecord::new(
                "b",
                square(-3.60, 40.40, 0.05),
                Classification::Attributes(blank),
            ))
            .build(&projector, LoadOptions::default())
            .unwrap();

        let point = QueryPoint::new(40.42, -3.65).unwrap();
        let hood = filter_nearby(&layer, &projector, &point, Distance::kilometers(20.0)).unwrap();

        assert_eq!(hood.indices(), vec![0, 1]);
        assert_eq!(hood.entries[0].intensity, 12.0);
        assert_eq!(hood.entries[1].intensity, 0.0);
        assert!(hood.entries.iter().all(|e| e.distance_m < 10_000.0));
    }

    #[test]
    fn test_negative_radius_is_rejected() {
        let projector = Projector::from_epsg(25830).unwrap();
        let layer = LayerBuilder::new(LayerMeta::desertification("d", "d"))
            .build(&projector, LoadOptions::default())
            .unwrap();
        let point = QueryPoint::new(40.0, -3.0).unwrap();

        let err = filter_nearby(&layer, &projector, &point, Distance::kilometers(-1.0)).unwrap_err();
        assert!(err.is_bad_input());
    }
}
