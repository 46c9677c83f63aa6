//! JPEG encoding with a size bound

use envrisk_core::error::{EnvriskError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::raster::Raster;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Quality decrease per re-encode when the image is over budget
const QUALITY_STEP: u8 = 10;

/// Lowest quality the size bound may push an image to
const QUALITY_FLOOR: u8 = 20;

/// Compressed image ready for inline transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// JPEG quality actually used
    pub quality: u8,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode at `quality`; while the result exceeds `max_bytes`, retry at
/// lower quality down to a floor. The last attempt is returned even if it
/// is still over the bound.
pub fn encode_jpeg(raster: &Raster, quality: u8, max_bytes: usize) -> Result<EncodedImage> {
    let rgb = raster.to_rgb();
    let mut quality = quality.clamp(1, 100);

    loop {
        let bytes = encode_rgb(&rgb, raster.width(), raster.height(), quality)?;
        let next = quality.saturating_sub(QUALITY_STEP);

        if bytes.len() <= max_bytes || next < QUALITY_FLOOR {
            if bytes.len() > max_bytes {
                tracing::warn!(
                    size = bytes.len(),
                    max_bytes,
                    quality,
                    "image still over size bound at minimum quality"
                );
            }
            return Ok(EncodedImage {
                bytes,
                mime_type: JPEG_MIME_TYPE.to_string(),
                width: raster.width(),
                height: raster.height(),
                quality,
            });
        }

        tracing::debug!(size = bytes.len(), max_bytes, quality, "re-encoding at lower quality");
        quality = next;
    }
}

fn encode_rgb(rgb: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .encode(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EnvriskError::render(format!("JPEG encoding failed: {}", e)))?;
    Ok(bytes)
}
