//! Rasterization of a neighborhood scene

use envrisk_core::error::{EnvriskError, Result};
use envrisk_core::models::{Rgb, Symbology};
use geo::{Coord, LineString, MultiPolygon};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::palette::{fill_color, Normalization};
use crate::viewport::Viewport;
use crate::RenderSettings;

/// One polygon to draw, in the planar frame
#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    pub geometry: &'a MultiPolygon<f64>,
    /// Used by graduated symbology
    pub intensity: f64,
    /// Used by categorical symbology
    pub code: Option<i64>,
}

/// Shapes to draw, in order, plus the query marker
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub shapes: Vec<Shape<'a>>,
    pub marker: Coord<f64>,
    pub symbology: &'a Symbology,
}

impl<'a> Scene<'a> {
    pub fn new(symbology: &'a Symbology, marker: Coord<f64>) -> Self {
        Self { shapes: Vec::new(), marker, symbology }
    }

    pub fn shape(mut self, shape: Shape<'a>) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Drawn canvas, opaque RGB
pub struct Raster {
    pixmap: Pixmap,
    viewport: Viewport,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("viewport", &self.viewport)
            .finish()
    }
}

impl Raster {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue()])
    }

    /// Color at the pixel a planar coordinate maps to
    pub fn pixel_at(&self, coord: Coord<f64>) -> Option<Rgb> {
        let (x, y) = self.viewport.to_pixel(coord);
        if !self.viewport.contains_pixel(x, y) {
            return None;
        }
        self.pixel(x as u32, y as u32)
    }

    /// Packed RGB bytes, row-major
    pub fn to_rgb(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue()]
            })
            .collect()
    }
}

/// Draw the scene. The canvas is fitted to the shapes and the marker.
pub fn rasterize(scene: &Scene<'_>, settings: &RenderSettings) -> Result<Raster> {
    let mut pixmap = Pixmap::new(settings.width, settings.height).ok_or_else(|| {
        EnvriskError::render(format!(
            "cannot allocate a {}x{} canvas",
            settings.width, settings.height
        ))
    })?;
    pixmap.fill(Color::WHITE);

    let bounds = Viewport::scene_bounds(scene.shapes.iter().map(|s| s.geometry), scene.marker);
    let viewport = Viewport::fit(bounds, settings.width, settings.height);

    let normalization = Normalization::from_values(scene.shapes.iter().map(|s| s.intensity));
    let alpha = (scene.symbology.opacity().clamp(0.0, 1.0) * 255.0).round() as u8;

    let mut outline = Paint::default();
    outline.set_color_rgba8(0, 0, 0, 255);
    outline.anti_alias = true;
    let outline_stroke = Stroke { width: settings.stroke_width, ..Default::default() };

    for shape in &scene.shapes {
        let Some(path) = shape_path(shape.geometry, &viewport) else { continue };

        let [r, g, b] = fill_color(scene.symbology, normalization, shape.intensity, shape.code);
        let mut fill = Paint::default();
        fill.set_color_rgba8(r, g, b, alpha);
        fill.anti_alias = true;

        pixmap.fill_path(&path, &fill, FillRule::EvenOdd, Transform::identity(), None);
        pixmap.stroke_path(&path, &outline, &outline_stroke, Transform::identity(), None);
    }

    draw_marker(&mut pixmap, &viewport, scene.marker, settings);

    Ok(Raster { pixmap, viewport })
}

fn shape_path(geometry: &MultiPolygon<f64>, viewport: &Viewport) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for polygon in &geometry.0 {
        add_ring(&mut builder, polygon.exterior(), viewport);
        for interior in polygon.interiors() {
            add_ring(&mut builder, interior, viewport);
        }
    }
    builder.finish()
}

fn add_ring(builder: &mut PathBuilder, ring: &LineString<f64>, viewport: &Viewport) {
    let mut points = ring.0.iter().map(|c| viewport.to_pixel(*c));
    let Some((x, y)) = points.next() else { return };
    builder.move_to(x, y);
    for (x, y) in points {
        builder.line_to(x, y);
    }
    builder.close();
}

fn draw_marker(pixmap: &mut Pixmap, viewport: &Viewport, marker: Coord<f64>, settings: &RenderSettings) {
    let (x, y) = viewport.to_pixel(marker);
    let arm = settings.marker_arm;

    let mut builder = PathBuilder::new();
    builder.move_to(x - arm, y - arm);
    builder.line_to(x + arm, y + arm);
    builder.move_to(x - arm, y + arm);
    builder.line_to(x + arm, y - arm);
    let Some(path) = builder.finish() else { return };

    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;
    let stroke = Stroke { width: settings.marker_width, ..Default::default() };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}
