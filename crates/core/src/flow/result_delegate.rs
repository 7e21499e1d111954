use crossbeam_channel::Sender;
use thiserror::Error;

use crate::camera::domain::camera_session::CameraError;
use crate::shared::captured_image::CapturedImage;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera access was denied or restricted")]
    PermissionDenied,
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(#[source] CameraError),
    #[error("capture was dismissed by the user")]
    Cancelled,
}

/// Terminal outcome of one capture flow.
#[derive(Debug)]
pub enum CaptureOutcome {
    Accepted(CapturedImage),
    Failed(CaptureError),
}

impl CaptureOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Caller-side boundary of the flow. Invoked exactly once per flow.
pub trait ResultDelegate: Send {
    fn on_capture_finished(&mut self, outcome: CaptureOutcome);
}

impl ResultDelegate for Sender<CaptureOutcome> {
    fn on_capture_finished(&mut self, outcome: CaptureOutcome) {
        if self.send(outcome).is_err() {
            log::warn!("Capture result dropped: receiver is gone");
        }
    }
}
