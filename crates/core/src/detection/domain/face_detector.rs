use crate::shared::frame::Frame;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Platform face-geometry primitive: counts the faces visible in one frame.
///
/// Invoked once per frame from detection worker threads, possibly for
/// several frames at once, hence `&self` and `Sync`.
pub trait FaceDetector: Send + Sync {
    fn count_faces(&self, frame: &Frame) -> Result<usize, BoxError>;
}
