use crate::detection::domain::detection_result::DetectionError;

/// Capability for anything that reacts to detection outcomes.
///
/// Calls always arrive on the UI-affine context, one at a time.
pub trait DetectionListener: Send + Sync {
    fn on_face_count(&self, count: usize);

    fn on_detection_failed(&self, error: &DetectionError);
}
