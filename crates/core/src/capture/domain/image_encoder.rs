use crate::detection::domain::face_detector::BoxError;
use crate::shared::captured_image::CapturedImage;

/// Encodes a still into its file representation.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, image: &CapturedImage) -> Result<Vec<u8>, BoxError>;

    /// Size of the encoded representation in bytes.
    fn encoded_len(&self, image: &CapturedImage) -> Result<usize, BoxError> {
        self.encode(image).map(|bytes| bytes.len())
    }
}
