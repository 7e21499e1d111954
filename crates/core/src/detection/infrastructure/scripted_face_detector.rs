use std::thread;
use std::time::Duration;

use crate::detection::domain::face_detector::{BoxError, FaceDetector};
use crate::shared::frame::Frame;

/// One scripted detection outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    Faces(usize),
    Fail,
}

/// Replays a fixed sequence of outcomes by frame index.
///
/// Frames past the end of the script repeat the last step, so a camera
/// that keeps streaming keeps seeing the final scene. An optional latency
/// makes detections overlap when several workers are running.
pub struct ScriptedFaceDetector {
    steps: Vec<ScriptStep>,
    latency: Option<Duration>,
}

impl ScriptedFaceDetector {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            latency: None,
        }
    }

    pub fn from_counts(counts: &[usize]) -> Self {
        Self::new(counts.iter().map(|&n| ScriptStep::Faces(n)).collect())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn step_for(&self, index: usize) -> ScriptStep {
        self.steps
            .get(index)
            .or_else(|| self.steps.last())
            .copied()
            .unwrap_or(ScriptStep::Faces(0))
    }
}

impl FaceDetector for ScriptedFaceDetector {
    fn count_faces(&self, frame: &Frame) -> Result<usize, BoxError> {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        match self.step_for(frame.index()) {
            ScriptStep::Faces(n) => Ok(n),
            ScriptStep::Fail => Err(format!("scripted failure at frame {}", frame.index()).into()),
        }
    }
}
