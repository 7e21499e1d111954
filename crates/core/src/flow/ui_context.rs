use crossbeam_channel::{Receiver, Sender};

use crate::camera::domain::camera_session::CameraError;
use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::captured_image::CapturedImage;

/// Actions the user can take on the capture screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Capture,
    Retake,
    Approve,
    AcknowledgeAlert,
    Dismiss,
}

/// Everything that can change the state of a capture flow.
///
/// Producers on other threads (camera callbacks, detection workers, the
/// host UI) never touch flow state directly; they post one of these to the
/// UI-affine context, which handles events strictly one at a time.
#[derive(Debug)]
pub enum FlowEvent {
    AccessResolved(bool),
    Detection(DetectionResult),
    StillCaptured(Result<CapturedImage, CameraError>),
    User(UserAction),
}

/// Cloneable handle for scheduling events onto the UI-affine context.
#[derive(Clone, Debug)]
pub struct UiHandle {
    tx: Sender<FlowEvent>,
}

impl UiHandle {
    /// Schedules an event. Returns `false` once the context has shut down.
    pub fn post(&self, event: FlowEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn send_action(&self, action: UserAction) -> bool {
        self.post(FlowEvent::User(action))
    }
}

/// Creates the UI-affine context: a handle for producers and the receiving
/// end drained by the flow's event loop.
pub fn ui_context() -> (UiHandle, Receiver<FlowEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (UiHandle { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_post_order() {
        let (ui, rx) = ui_context();
        ui.send_action(UserAction::Capture);
        ui.post(FlowEvent::AccessResolved(true));

        assert!(matches!(rx.recv().unwrap(), FlowEvent::User(UserAction::Capture)));
        assert!(matches!(rx.recv().unwrap(), FlowEvent::AccessResolved(true)));
    }

    #[test]
    fn test_post_fails_after_context_dropped() {
        let (ui, rx) = ui_context();
        drop(rx);
        assert!(!ui.send_action(UserAction::Dismiss));
    }
}
