use geo::Rect;
use rstar::{RTree, RTreeObject, AABB};

/// Planar bounding box of one record, keyed by its position in the layer
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEnvelope {
    /// Record index within the layer
    pub id: usize,

    envelope: AABB<[f64; 2]>,
}

impl IndexedEnvelope {
    pub fn new(id: usize, rect: Rect<f64>) -> Self {
        let min = rect.min();
        let max = rect.max();
        Self { id, envelope: AABB::from_corners([min.x, min.y], [max.x, max.y]) }
    }
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Read-only R-tree over record envelopes in the planar frame.
///
/// Built once with bulk loading; there is no insert or remove.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedEnvelope>,
}

impl SpatialIndex {
    pub fn from_envelopes(envelopes: impl IntoIterator<Item = (usize, Rect<f64>)>) -> Self {
        let indexed: Vec<IndexedEnvelope> = envelopes
            .into_iter()
            .map(|(id, rect)| IndexedEnvelope::new(id, rect))
            .collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Ids of every record whose envelope intersects the box, in ascending order
    pub fn query_bbox(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        let bbox = AABB::from_corners(min, max);
        let mut ids: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(&bbox).map(|g| g.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Square box of half-side `half_side` around a point
    pub fn query_around(&self, center: [f64; 2], half_side: f64) -> Vec<usize> {
        let min = [center[0] - half_side, center[1] - half_side];
        let max = [center[0] + half_side, center[1] + half_side];
        self.query_bbox(min, max)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
    }

    #[test]
    fn test_empty_index() {
        let index = SpatialIndex::default();
        assert!(index.is_empty());
        assert!(index.query_around([0.0, 0.0], 1_000.0).is_empty());
    }

    #[test]
    fn test_bbox_query_includes_partial_overlap() {
        let index = SpatialIndex::from_envelopes(vec![
            (0, rect(0.0, 0.0, 10.0, 10.0)),
            (1, rect(8.0, 8.0, 30.0, 30.0)),
            (2, rect(50.0, 50.0, 60.0, 60.0)),
        ]);

        assert_eq!(index.len(), 3);
        // Record 1 sticks out of the box but still intersects it
        assert_eq!(index.query_bbox([0.0, 0.0], [9.0, 9.0]), vec![0, 1]);
        assert_eq!(index.query_around([55.0, 55.0], 1.0), vec![2]);
    }

    #[test]
    fn test_results_are_sorted() {
        let index = SpatialIndex::from_envelopes((0..50).rev().map(|i| {
            let offset = i as f64;
            (i, rect(offset, offset, offset + 1.0, offset + 1.0))
        }));

        let ids = index.query_bbox([0.0, 0.0], [100.0, 100.0]);
        assert_eq!(ids, (0..50).collect::<Vec<_>>());
    }
}
