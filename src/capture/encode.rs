//! Frame encoding — functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes pixel data in, returns compressed bytes out.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};

/// JPEG quality for captured frames. Fixed; there is no negotiation.
pub const JPEG_QUALITY: u8 = 92;

/// A compressed still frame. Ownership passes to whoever asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    format: ImageFormat,
}

impl EncodedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// Encodes an RGBA frame as JPEG at [`JPEG_QUALITY`].
///
/// JPEG carries no alpha channel, so alpha is dropped. Preview surfaces
/// are opaque, so nothing visible is lost.
///
/// This is a pure function with no side effects.
pub fn encode_jpeg(pixels: &RgbaImage) -> Result<EncodedImage, EncodeError> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::ZeroDimension);
    }

    let rgb = RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, _] = pixels.get_pixel(x, y).0;
        Rgb([r, g, b])
    });

    let mut bytes: Vec<u8> = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(EncodedImage {
        bytes,
        width,
        height,
        format: ImageFormat::Jpeg,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Frame has zero width or height")]
    ZeroDimension,

    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}
