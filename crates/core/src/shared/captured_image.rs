use std::path::Path;

use image::RgbImage;

/// A still photo produced by one capture request.
///
/// Lives from still-capture until it is either handed to the caller or
/// discarded on retake.
#[derive(Clone, Debug)]
pub struct CapturedImage {
    pixels: RgbImage,
    source_len: Option<usize>,
}

impl CapturedImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self {
            pixels,
            source_len: None,
        }
    }

    /// Decodes the file representation delivered by the camera.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let pixels = image::load_from_memory(bytes)?.to_rgb8();
        Ok(Self {
            pixels,
            source_len: Some(bytes.len()),
        })
    }

    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        let bytes = std::fs::read(path).map_err(image::ImageError::IoError)?;
        Self::from_encoded(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn long_edge(&self) -> u32 {
        self.width().max(self.height())
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Size of the file representation this image was decoded from, if any.
    pub fn source_len(&self) -> Option<usize> {
        self.source_len
    }

    /// Horizontal flip, turning a front-camera shot into what the user saw
    /// in the preview.
    pub fn mirrored(self) -> Self {
        Self {
            pixels: image::imageops::flip_horizontal(&self.pixels),
            source_len: self.source_len,
        }
    }
}
