//! envrisk render - Choropleth rendering of query neighborhoods
//!
//! A [`Scene`] of planar shapes is rasterized onto a fixed-size white
//! canvas, the query point is marked, and the result is JPEG-encoded for
//! inline transport. An empty scene yields [`RenderOutcome::NoImage`], never a
//! blank picture.

pub mod encode;
pub mod palette;
pub mod raster;
pub mod viewport;

use envrisk_core::config::LayeredConfig;
use envrisk_core::error::Result;

pub use encode::{encode_jpeg, EncodedImage, JPEG_MIME_TYPE};
pub use raster::{rasterize, Raster, Scene, Shape};
pub use viewport::Viewport;

/// Canvas and encoding parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    pub max_image_bytes: usize,
    /// Polygon outline width in pixels
    pub stroke_width: f32,
    /// Half-length of each marker stroke in pixels
    pub marker_arm: f32,
    pub marker_width: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        // 6 x 5 in at 80 dpi
        Self {
            width: 480,
            height: 400,
            jpeg_quality: 50,
            max_image_bytes: 64 * 1024,
            stroke_width: 0.5,
            marker_arm: 8.0,
            marker_width: 2.0,
        }
    }
}

impl RenderSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            width: config.image_width.value,
            height: config.image_height.value,
            jpeg_quality: config.jpeg_quality.value,
            max_image_bytes: config.max_image_bytes.value,
            ..Default::default()
        }
    }
}

/// Result of rendering a neighborhood
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Image(EncodedImage),
    /// Nothing to draw
    NoImage,
}

impl RenderOutcome {
    pub fn image(&self) -> Option<&EncodedImage> {
        match self {
            RenderOutcome::Image(image) => Some(image),
            RenderOutcome::NoImage => None,
        }
    }
}

/// Choropleth renderer. Holds only settings; every call draws afresh.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    settings: RenderSettings,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn rasterize(&self, scene: &Scene<'_>) -> Result<Raster> {
        rasterize(scene, &self.settings)
    }

    pub fn render(&self, scene: &Scene<'_>) -> Result<RenderOutcome> {
        if scene.is_empty() {
            return Ok(RenderOutcome::NoImage);
        }

        let raster = self.rasterize(scene)?;
        let image =
            encode_jpeg(&raster, self.settings.jpeg_quality, self.settings.max_image_bytes)?;
        tracing::debug!(
            shapes = scene.shapes.len(),
            bytes = image.len(),
            quality = image.quality,
            "neighborhood rendered"
        );
        Ok(RenderOutcome::Image(image))
    }
}
