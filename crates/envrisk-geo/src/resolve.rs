//! Point-in-polygon resolution

use envrisk_core::models::{PolygonRecord, QueryPoint};
use geo::Intersects;

use crate::layer::Layer;

/// Outcome of an exact membership test
#[derive(Debug, Clone, Copy)]
pub enum MatchResult<'a> {
    Matched { index: usize, record: &'a PolygonRecord },
    NoMatch,
}

impl<'a> MatchResult<'a> {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn record(&self) -> Option<&'a PolygonRecord> {
        match self {
            MatchResult::Matched { record, .. } => Some(record),
            MatchResult::NoMatch => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            MatchResult::Matched { index, .. } => Some(*index),
            MatchResult::NoMatch => None,
        }
    }
}

/// Find the first record, in load order, whose geometry contains the point.
///
/// Containment is boundary-inclusive and tested in the geographic frame.
/// Flagged records are logged and skipped; they never abort the scan.
pub fn resolve<'a>(layer: &'a Layer, point: &QueryPoint) -> MatchResult<'a> {
    let target = point.to_geo_point();

    for (index, record) in layer.records().iter().enumerate() {
        if let Err(e) = record.check() {
            tracing::warn!(layer = %layer.id(), error = %e, "skipping defective record");
            continue;
        }
        if record.geometry.intersects(&target) {
            tracing::debug!(layer = %layer.id(), record = %record.key, "point matched");
            return MatchResult::Matched { index, record };
        }
    }

    MatchResult::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerBuilder, LoadOptions};
    use crate::transform::Projector;
    use envrisk_core::models::{Classification, LayerMeta};
    use geo::{polygon, MultiPolygon};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]])
    }

    fn layer(records: Vec<PolygonRecord>) -> Layer {
        let options = LoadOptions { check_overlaps: false, ..Default::default() };
        LayerBuilder::new(LayerMeta::desertification("t", "t"))
            .records(records)
            .build(&Projector::from_epsg(25830).unwrap(), options)
            .unwrap()
    }

    #[test]
    fn test_boundary_points_are_inside() {
        let layer = layer(vec![PolygonRecord::new("a", square(0.0, 0.0, 1.0), Classification::Code(3))]);

        for (lat, lon) in [(0.0, 0.5), (1.0, 1.0), (0.5, 0.0), (0.0, 0.0)] {
            let point = QueryPoint::new(lat, lon).unwrap();
            assert!(resolve(&layer, &point).is_match(), "({lat}, {lon}) should match");
        }
        let outside = QueryPoint::new(1.0 + 1e-9, 0.5).unwrap();
        assert!(!resolve(&layer, &outside).is_match());
    }

    #[test]
    fn test_first_record_wins_on_overlap() {
        let layer = layer(vec![
            PolygonRecord::new("first", square(0.0, 0.0, 1.0), Classification::Code(1)),
            PolygonRecord::new("second", square(0.5, 0.5, 1.0), Classification::Code(2)),
        ]);

        let point = QueryPoint::new(0.75, 0.75).unwrap();
        let result = resolve(&layer, &point);
        assert_eq!(result.index(), Some(0));
        assert_eq!(result.record().unwrap().key, "first");
    }

    #[test]
    fn test_shared_edge_goes_to_first_record() {
        let layer = layer(vec![
            PolygonRecord::new("west", square(0.0, 0.0, 1.0), Classification::Code(1)),
            PolygonRecord::new("east", square(1.0, 0.0, 1.0), Classification::Code(2)),
        ]);

        let on_edge = QueryPoint::new(0.5, 1.0).unwrap();
        assert_eq!(resolve(&layer, &on_edge).record().unwrap().key, "west");
    }

    #[test]
    fn test_hole_is_outside() {
        let with_hole = MultiPolygon::new(vec![polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)]],
        )]);
        let layer = layer(vec![PolygonRecord::new("ring", with_hole, Classification::Code(2))]);

        assert!(!resolve(&layer, &QueryPoint::new(2.0, 2.0).unwrap()).is_match());
        assert!(resolve(&layer, &QueryPoint::new(0.5, 0.5).unwrap()).is_match());
    }
}
