use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::broadcast::detection_listener::DetectionListener;
use crate::capture::domain::status_presenter::StatusPresenter;
use crate::detection::domain::detection_result::DetectionError;
use crate::detection::domain::readiness_state::ReadinessState;
use crate::shared::config::CaptureConfig;
use crate::shared::constants::{MSG_AMBIGUOUS, MSG_DETECTION_FAILED, MSG_NO_FACE, MSG_READY};

#[derive(Debug, Default)]
struct GateState {
    readiness: Option<ReadinessState>,
    enabled: bool,
}

/// Enables the capture action only while exactly one face is in view.
///
/// Every detection outcome also produces a short status message. The gate
/// keeps no history: each face count fully replaces the previous state.
pub struct CaptureGate {
    presenter: Arc<dyn StatusPresenter>,
    message_duration: Duration,
    disable_on_failure: bool,
    state: Mutex<GateState>,
}

impl CaptureGate {
    pub fn new(
        presenter: Arc<dyn StatusPresenter>,
        message_duration: Duration,
        disable_on_failure: bool,
    ) -> Self {
        Self {
            presenter,
            message_duration,
            disable_on_failure,
            state: Mutex::new(GateState::default()),
        }
    }

    pub fn from_config(presenter: Arc<dyn StatusPresenter>, config: &CaptureConfig) -> Self {
        Self::new(
            presenter,
            config.status_duration(),
            config.disable_capture_on_detection_failure,
        )
    }

    pub fn status_message(readiness: ReadinessState) -> &'static str {
        match readiness {
            ReadinessState::Ready => MSG_READY,
            ReadinessState::Ambiguous => MSG_AMBIGUOUS,
            ReadinessState::NotReady => MSG_NO_FACE,
        }
    }

    pub fn is_capture_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Readiness derived from the most recent face count, if any.
    pub fn readiness(&self) -> Option<ReadinessState> {
        self.lock().readiness
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DetectionListener for CaptureGate {
    fn on_face_count(&self, count: usize) {
        let readiness = ReadinessState::from_face_count(count);
        {
            let mut state = self.lock();
            state.readiness = Some(readiness);
            state.enabled = readiness.is_ready();
        }
        log::debug!("{count} face(s) in view: {readiness:?}");
        self.presenter
            .present(Self::status_message(readiness), self.message_duration);
    }

    fn on_detection_failed(&self, error: &DetectionError) {
        log::warn!("Face detection failed: {error}");
        if self.disable_on_failure {
            self.lock().enabled = false;
        }
        self.presenter
            .present(MSG_DETECTION_FAILED, self.message_duration);
    }
}
