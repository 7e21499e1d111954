use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::face_detector::BoxError;

#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("frame {index} has a malformed pixel buffer")]
    InvalidFrame { index: usize },
    #[error("face detection failed: {0}")]
    Primitive(Arc<BoxError>),
}

impl DetectionError {
    pub fn primitive(cause: BoxError) -> Self {
        Self::Primitive(Arc::new(cause))
    }
}

/// Outcome of detecting faces in a single frame. Produced exactly once per
/// processed frame.
#[derive(Debug, Clone)]
pub enum DetectionResult {
    FaceCount(usize),
    Failed(DetectionError),
}

impl DetectionResult {
    pub fn face_count(&self) -> Option<usize> {
        match self {
            Self::FaceCount(n) => Some(*n),
            Self::Failed(_) => None,
        }
    }
}

impl From<Result<usize, DetectionError>> for DetectionResult {
    fn from(result: Result<usize, DetectionError>) -> Self {
        match result {
            Ok(n) => Self::FaceCount(n),
            Err(e) => Self::Failed(e),
        }
    }
}
