use image::codecs::jpeg::JpegEncoder;

use crate::capture::domain::image_encoder::ImageEncoder;
use crate::detection::domain::face_detector::BoxError;
use crate::shared::captured_image::CapturedImage;
use crate::shared::constants::DEFAULT_JPEG_QUALITY;

/// Encodes stills as JPEG using the `image` crate.
pub struct JpegImageEncoder {
    quality: u8,
}

impl JpegImageEncoder {
    /// `quality` is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegImageEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageEncoder for JpegImageEncoder {
    fn encode(&self, image: &CapturedImage) -> Result<Vec<u8>, BoxError> {
        if image.width() == 0 || image.height() == 0 {
            return Err("cannot encode an empty image".into());
        }
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, self.quality);
        encoder.encode_image(image.pixels())?;
        Ok(bytes)
    }
}
