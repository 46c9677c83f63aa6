//! Fitting planar coordinates onto the canvas

use geo::{coord, BoundingRect, Coord, MultiPolygon, Rect};

/// Fraction of the data extent added on each side
const MARGIN: f64 = 0.05;

/// Smallest extent, in planar units, a viewport will cover
const MIN_EXTENT: f64 = 1.0;

/// Equal-scale mapping from the planar frame to pixel space (y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Fit `bounds` into a `width` x `height` canvas, centred, same scale on both axes.
    pub fn fit(bounds: Rect<f64>, width: u32, height: u32) -> Self {
        let center = bounds.center();
        let extent_x = (bounds.width() * (1.0 + 2.0 * MARGIN)).max(MIN_EXTENT);
        let extent_y = (bounds.height() * (1.0 + 2.0 * MARGIN)).max(MIN_EXTENT);

        let scale = (width as f64 / extent_x).min(height as f64 / extent_y);
        Self {
            scale,
            offset_x: width as f64 / 2.0 - center.x * scale,
            offset_y: height as f64 / 2.0 + center.y * scale,
            width,
            height,
        }
    }

    /// Bounds of every shape plus the marker
    pub fn scene_bounds<'a>(
        shapes: impl IntoIterator<Item = &'a MultiPolygon<f64>>,
        marker: Coord<f64>,
    ) -> Rect<f64> {
        shapes.into_iter().filter_map(|shape| shape.bounding_rect()).fold(
            Rect::new(marker, marker),
            |acc, rect| {
                Rect::new(
                    coord! { x: acc.min().x.min(rect.min().x), y: acc.min().y.min(rect.min().y) },
                    coord! { x: acc.max().x.max(rect.max().x), y: acc.max().y.max(rect.max().y) },
                )
            },
        )
    }

    /// Pixels per planar unit
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_pixel(&self, coord: Coord<f64>) -> (f32, f32) {
        (
            (self.offset_x + coord.x * self.scale) as f32,
            (self.offset_y - coord.y * self.scale) as f32,
        )
    }

    /// Whether a pixel position lies on the canvas
    pub fn contains_pixel(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1000.0, y: 1000.0 });
        let viewport = Viewport::fit(bounds, 480, 400);

        // Height is the limiting side
        let (x0, y0) = viewport.to_pixel(coord! { x: 0.0, y: 0.0 });
        let (x1, y1) = viewport.to_pixel(coord! { x: 1000.0, y: 1000.0 });
        assert!(((x1 - x0) - (y0 - y1)).abs() < 1e-3);
        assert!(y0 > y1, "north is up");

        let (cx, cy) = viewport.to_pixel(coord! { x: 500.0, y: 500.0 });
        assert!((cx - 240.0).abs() < 1e-3 && (cy - 200.0).abs() < 1e-3);
        assert!(viewport.contains_pixel(x0, y0) && viewport.contains_pixel(x1, y1));
    }

    #[test]
    fn test_degenerate_bounds() {
        let point = coord! { x: 10.0, y: 10.0 };
        let viewport = Viewport::fit(Rect::new(point, point), 480, 400);
        assert!(viewport.scale().is_finite());
        assert_eq!(viewport.to_pixel(point), (240.0, 200.0));
    }

    #[test]
    fn test_scene_bounds_include_marker() {
        let shape = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
        ]]);
        let bounds = Viewport::scene_bounds([&shape], coord! { x: 20.0, y: -5.0 });
        assert_eq!(bounds.min(), coord! { x: 0.0, y: -5.0 });
        assert_eq!(bounds.max(), coord! { x: 20.0, y: 10.0 });
    }
}
