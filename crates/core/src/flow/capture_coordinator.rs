use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::broadcast::detection_broadcaster::{DetectionBroadcaster, ListenerId};
use crate::broadcast::detection_listener::DetectionListener;
use crate::camera::domain::camera_session::{
    AuthorizationStatus, CameraError, CameraOutputs, CameraSession,
};
use crate::capture::domain::capture_gate::CaptureGate;
use crate::capture::domain::quality_validator::{QualityValidator, QualityVerdict};
use crate::capture::domain::status_presenter::StatusPresenter;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::threaded_frame_detector::{
    ResultSink, ThreadedFrameDetector,
};
use crate::flow::result_delegate::{CaptureError, CaptureOutcome, ResultDelegate};
use crate::flow::ui_context::{FlowEvent, UiHandle, UserAction};
use crate::shared::captured_image::CapturedImage;
use crate::shared::config::CaptureConfig;
use crate::shared::constants::{ALERT_ACTION, ALERT_TITLE, MSG_CAPTURE_FAILED, MSG_LOW_QUALITY};
use crate::shared::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Previewing,
    Capturing,
    ReviewingStill,
    Finished,
}

/// External collaborators a flow is built from.
pub struct CaptureDependencies {
    pub camera: Box<dyn CameraSession>,
    pub face_detector: Arc<dyn FaceDetector>,
    pub presenter: Arc<dyn StatusPresenter>,
    pub delegate: Box<dyn ResultDelegate>,
}

/// Drives one capture flow from camera authorization to a terminal outcome.
///
/// Lives on the UI-affine context: every state change happens inside
/// [`handle`](Self::handle), one event at a time. The coordinator owns the
/// camera session, the detection workers and the broadcaster that feeds
/// the capture gate.
pub struct CaptureCoordinator {
    state: CaptureState,
    config: CaptureConfig,
    ui: UiHandle,
    camera: Box<dyn CameraSession>,
    face_detector: Arc<dyn FaceDetector>,
    detector: Option<ThreadedFrameDetector>,
    broadcaster: DetectionBroadcaster,
    gate: Arc<CaptureGate>,
    gate_id: Option<ListenerId>,
    validator: QualityValidator,
    presenter: Arc<dyn StatusPresenter>,
    delegate: Option<Box<dyn ResultDelegate>>,
    still: Option<CapturedImage>,
    awaiting_acknowledgment: bool,
}

impl CaptureCoordinator {
    pub fn new(deps: CaptureDependencies, config: CaptureConfig, ui: UiHandle) -> Self {
        let validator = QualityValidator::from_config(&config);
        Self::with_validator(deps, config, ui, validator)
    }

    pub fn with_validator(
        deps: CaptureDependencies,
        config: CaptureConfig,
        ui: UiHandle,
        validator: QualityValidator,
    ) -> Self {
        let gate = Arc::new(CaptureGate::from_config(deps.presenter.clone(), &config));
        Self {
            state: CaptureState::Idle,
            config,
            ui,
            camera: deps.camera,
            face_detector: deps.face_detector,
            detector: None,
            broadcaster: DetectionBroadcaster::new(),
            gate,
            gate_id: None,
            validator,
            presenter: deps.presenter,
            delegate: Some(deps.delegate),
            still: None,
            awaiting_acknowledgment: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == CaptureState::Finished
    }

    pub fn is_capture_enabled(&self) -> bool {
        self.gate.is_capture_enabled()
    }

    /// The still under review, if any.
    pub fn still(&self) -> Option<&CapturedImage> {
        self.still.as_ref()
    }

    pub fn is_awaiting_acknowledgment(&self) -> bool {
        self.awaiting_acknowledgment
    }

    /// Adds another listener to the detection fan-out. The coordinator keeps
    /// only a weak reference.
    pub fn register_listener<L: DetectionListener + 'static>(
        &mut self,
        listener: &Arc<L>,
    ) -> ListenerId {
        self.broadcaster.register(listener)
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        self.broadcaster.unregister(id)
    }

    /// Begins the flow: checks camera authorization and, when granted,
    /// opens the session.
    pub fn start(&mut self) {
        if self.state != CaptureState::Idle {
            log::warn!("Capture flow already started ({:?})", self.state);
            return;
        }
        self.gate_id = Some(self.broadcaster.register(&self.gate));

        match self.camera.authorization_status() {
            AuthorizationStatus::Authorized => self.open_session(),
            AuthorizationStatus::NotDetermined => {
                log::info!("Requesting camera access");
                let ui = self.ui.clone();
                self.camera.request_access(Box::new(move |granted| {
                    ui.post(FlowEvent::AccessResolved(granted));
                }));
            }
            status @ (AuthorizationStatus::Denied | AuthorizationStatus::Restricted) => {
                log::info!("Camera access unavailable: {status:?}");
                self.finish(CaptureOutcome::Failed(CaptureError::PermissionDenied));
            }
        }
    }

    /// Drains events until the flow finishes.
    ///
    /// With the receiver paired to the coordinator's own `UiHandle` the loop
    /// only ends on `Finished`. Hosts that feed events from a separate
    /// channel get a `Cancelled` outcome if every sender drops first.
    pub fn run(&mut self, events: Receiver<FlowEvent>) -> CaptureState {
        for event in events {
            if self.handle(event) == CaptureState::Finished {
                break;
            }
        }
        if !self.is_finished() {
            log::warn!("Event source closed before the flow finished");
            self.finish(CaptureOutcome::Failed(CaptureError::Cancelled));
        }
        self.state
    }

    /// Applies one event and returns the resulting state.
    pub fn handle(&mut self, event: FlowEvent) -> CaptureState {
        if self.is_finished() {
            log::debug!("Ignoring event after finish: {event:?}");
            return self.state;
        }
        match event {
            FlowEvent::AccessResolved(granted) => self.on_access_resolved(granted),
            FlowEvent::Detection(result) => self.broadcaster.publish(&result),
            FlowEvent::StillCaptured(result) => self.on_still_captured(result),
            FlowEvent::User(action) => self.on_user_action(action),
        }
        self.state
    }

    fn on_access_resolved(&mut self, granted: bool) {
        if self.state != CaptureState::Idle {
            return;
        }
        if granted {
            log::info!("Camera access granted");
            self.open_session();
        } else {
            log::info!("Camera access refused");
            self.finish(CaptureOutcome::Failed(CaptureError::PermissionDenied));
        }
    }

    fn open_session(&mut self) {
        let ui = self.ui.clone();
        let sink: ResultSink = Arc::new(move |_index, result: DetectionResult| {
            ui.post(FlowEvent::Detection(result));
        });
        let detector = ThreadedFrameDetector::spawn(
            self.face_detector.clone(),
            self.config.detection_workers,
            self.config.detection_queue_capacity,
            sink,
        );
        let submitter = detector.submitter();
        let ui = self.ui.clone();
        let outputs = CameraOutputs {
            frames: Arc::new(move |frame: Frame| submitter.submit(frame)),
            stills: Arc::new(move |still: Result<CapturedImage, CameraError>| {
                ui.post(FlowEvent::StillCaptured(still));
            }),
        };

        if let Err(e) = self.camera.configure(outputs) {
            log::error!("Failed to open camera: {e}");
            self.finish(CaptureOutcome::Failed(CaptureError::DeviceUnavailable(e)));
            return;
        }
        self.detector = Some(detector);
        self.camera.start();
        self.transition(CaptureState::Previewing);
    }

    fn on_user_action(&mut self, action: UserAction) {
        match action {
            UserAction::Capture => self.request_capture(),
            UserAction::Retake => self.retake(),
            UserAction::Approve => self.approve(),
            UserAction::AcknowledgeAlert => self.acknowledge_alert(),
            UserAction::Dismiss => {
                log::info!("Capture flow dismissed");
                self.finish(CaptureOutcome::Failed(CaptureError::Cancelled));
            }
        }
    }

    fn request_capture(&mut self) {
        let state = self.state;
        match state {
            CaptureState::Previewing if self.gate.is_capture_enabled() => {
                self.transition(CaptureState::Capturing);
                self.camera.capture_still();
            }
            CaptureState::Previewing => log::debug!("Capture ignored: gate is closed"),
            CaptureState::Capturing => log::warn!("Capture ignored: a still is already in flight"),
            state => log::debug!("Capture ignored in {state:?}"),
        }
    }

    fn on_still_captured(&mut self, result: Result<CapturedImage, CameraError>) {
        if self.state != CaptureState::Capturing {
            log::warn!("Discarding unexpected still in {:?}", self.state);
            return;
        }
        match result {
            Ok(image) => {
                self.stop_camera();
                let image = if self.config.mirror_front_camera {
                    image.mirrored()
                } else {
                    image
                };
                log::info!("Reviewing {}x{} still", image.width(), image.height());
                self.still = Some(image);
                self.transition(CaptureState::ReviewingStill);
            }
            Err(e) => {
                log::warn!("{e}");
                self.presenter
                    .present(MSG_CAPTURE_FAILED, self.config.status_duration());
                self.transition(CaptureState::Previewing);
            }
        }
    }

    fn retake(&mut self) {
        if self.state != CaptureState::ReviewingStill || self.awaiting_acknowledgment {
            log::debug!("Retake ignored in {:?}", self.state);
            return;
        }
        self.still = None;
        self.resume_preview();
    }

    fn approve(&mut self) {
        if self.state != CaptureState::ReviewingStill || self.awaiting_acknowledgment {
            log::debug!("Approve ignored in {:?}", self.state);
            return;
        }
        let Some(image) = self.still.take() else {
            return;
        };
        match self.validator.validate(&image) {
            QualityVerdict::Accepted => {
                log::info!("Still accepted");
                self.finish(CaptureOutcome::Accepted(image));
            }
            QualityVerdict::Rejected(reason) => {
                log::info!("Still rejected: {reason}");
                self.awaiting_acknowledgment = true;
                self.presenter
                    .present_alert(ALERT_TITLE, MSG_LOW_QUALITY, ALERT_ACTION);
            }
        }
    }

    fn acknowledge_alert(&mut self) {
        if !self.awaiting_acknowledgment {
            return;
        }
        self.awaiting_acknowledgment = false;
        self.resume_preview();
    }

    fn resume_preview(&mut self) {
        if !self.camera.is_running() {
            self.camera.start();
        }
        self.transition(CaptureState::Previewing);
    }

    fn stop_camera(&mut self) {
        if self.camera.is_running() {
            self.camera.stop();
        }
    }

    fn transition(&mut self, next: CaptureState) {
        log::info!("Capture flow: {:?} -> {next:?}", self.state);
        self.state = next;
    }

    fn finish(&mut self, outcome: CaptureOutcome) {
        self.stop_camera();
        if let Some(id) = self.gate_id.take() {
            self.broadcaster.unregister(id);
        }
        self.detector = None;
        self.still = None;
        self.awaiting_acknowledgment = false;
        self.transition(CaptureState::Finished);
        if let Some(mut delegate) = self.delegate.take() {
            delegate.on_capture_finished(outcome);
        }
    }
}

impl Drop for CaptureCoordinator {
    fn drop(&mut self) {
        self.stop_camera();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::domain::camera_session::AccessReply;
    use crate::capture::domain::image_encoder::ImageEncoder;
    use crate::detection::domain::detection_result::DetectionError;
    use crate::detection::domain::face_detector::BoxError;
    use crate::detection::infrastructure::scripted_face_detector::ScriptedFaceDetector;
    use crate::flow::ui_context::ui_context;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    // --- Stubs ---

    #[derive(Default)]
    struct CameraLog {
        starts: usize,
        stops: usize,
        stills_requested: usize,
        configured: bool,
        access_reply: Option<AccessReply>,
    }

    /// Synchronous camera: records calls and never delivers on its own.
    struct ManualCamera {
        authorization: AuthorizationStatus,
        device_available: bool,
        running: bool,
        log: Arc<Mutex<CameraLog>>,
    }

    impl ManualCamera {
        fn new(authorization: AuthorizationStatus) -> (Self, Arc<Mutex<CameraLog>>) {
            let log = Arc::new(Mutex::new(CameraLog::default()));
            let camera = Self {
                authorization,
                device_available: true,
                running: false,
                log: log.clone(),
            };
            (camera, log)
        }
    }

    impl CameraSession for ManualCamera {
        fn authorization_status(&self) -> AuthorizationStatus {
            self.authorization
        }

        fn request_access(&mut self, reply: AccessReply) {
            self.log.lock().unwrap().access_reply = Some(reply);
        }

        fn configure(&mut self, _outputs: CameraOutputs) -> Result<(), CameraError> {
            if !self.device_available {
                return Err(CameraError::NoDevice);
            }
            self.log.lock().unwrap().configured = true;
            Ok(())
        }

        fn start(&mut self) {
            self.running = true;
            self.log.lock().unwrap().starts += 1;
        }

        fn stop(&mut self) {
            self.running = false;
            self.log.lock().unwrap().stops += 1;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn capture_still(&mut self) {
            self.log.lock().unwrap().stills_requested += 1;
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        messages: Mutex<Vec<String>>,
        alerts: Mutex<Vec<String>>,
    }

    impl StatusPresenter for RecordingPresenter {
        fn present(&self, message: &str, _duration: Duration) {
            self.messages.lock().unwrap().push(message.to_string());
        }

        fn present_alert(&self, _title: &str, message: &str, _action_title: &str) {
            self.alerts.lock().unwrap().push(message.to_string());
        }
    }

    struct RecordingDelegate {
        outcomes: Arc<Mutex<Vec<CaptureOutcome>>>,
    }

    impl ResultDelegate for RecordingDelegate {
        fn on_capture_finished(&mut self, outcome: CaptureOutcome) {
            self.outcomes.lock().unwrap().push(outcome);
        }
    }

    /// Sizes every still by its width, so tests pick the encoded size
    /// through the image dimensions: `width * 300` bytes.
    struct WidthScaledEncoder;

    impl ImageEncoder for WidthScaledEncoder {
        fn encode(&self, image: &CapturedImage) -> Result<Vec<u8>, BoxError> {
            Ok(vec![0; image.width() as usize * 300])
        }

        fn encoded_len(&self, image: &CapturedImage) -> Result<usize, BoxError> {
            Ok(image.width() as usize * 300)
        }
    }

    struct Harness {
        coordinator: CaptureCoordinator,
        camera: Arc<Mutex<CameraLog>>,
        presenter: Arc<RecordingPresenter>,
        outcomes: Arc<Mutex<Vec<CaptureOutcome>>>,
    }

    fn harness_with(camera: ManualCamera, log: Arc<Mutex<CameraLog>>) -> Harness {
        let presenter = Arc::new(RecordingPresenter::default());
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let deps = CaptureDependencies {
            camera: Box::new(camera),
            face_detector: Arc::new(ScriptedFaceDetector::from_counts(&[0])),
            presenter: presenter.clone(),
            delegate: Box::new(RecordingDelegate {
                outcomes: outcomes.clone(),
            }),
        };
        let (ui, _rx) = ui_context();
        let validator = QualityValidator::new(Box::new(WidthScaledEncoder), 1800, 500_000);
        let coordinator =
            CaptureCoordinator::with_validator(deps, CaptureConfig::default(), ui, validator);
        Harness {
            coordinator,
            camera: log,
            presenter,
            outcomes,
        }
    }

    fn harness(authorization: AuthorizationStatus) -> Harness {
        let (camera, log) = ManualCamera::new(authorization);
        harness_with(camera, log)
    }

    fn started() -> Harness {
        let mut h = harness(AuthorizationStatus::Authorized);
        h.coordinator.start();
        h
    }

    fn faces(n: usize) -> FlowEvent {
        FlowEvent::Detection(DetectionResult::FaceCount(n))
    }

    fn still(width: u32, height: u32) -> FlowEvent {
        FlowEvent::StillCaptured(Ok(CapturedImage::new(RgbImage::new(width, height))))
    }

    fn user(action: UserAction) -> FlowEvent {
        FlowEvent::User(action)
    }

    // --- Tests ---

    #[test]
    fn test_authorized_start_previews() {
        let h = started();
        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
        let camera = h.camera.lock().unwrap();
        assert!(camera.configured);
        assert_eq!(camera.starts, 1);
    }

    #[test]
    fn test_zero_faces_keeps_capture_disabled() {
        let mut h = started();
        for _ in 0..5 {
            h.coordinator.handle(faces(0));
            assert!(!h.coordinator.is_capture_enabled());
        }
        h.coordinator.handle(user(UserAction::Capture));

        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
        assert_eq!(h.camera.lock().unwrap().stills_requested, 0);
        let messages = h.presenter.messages.lock().unwrap();
        assert_eq!(messages.len(), 5);
        assert!(messages.iter().all(|m| m == "no face found"));
    }

    #[test]
    fn test_accepted_still_reaches_delegate_once() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        assert!(h.coordinator.is_capture_enabled());

        h.coordinator.handle(user(UserAction::Capture));
        assert_eq!(h.coordinator.state(), CaptureState::Capturing);
        assert_eq!(h.camera.lock().unwrap().stills_requested, 1);

        // 2000px wide -> 600000 encoded bytes
        h.coordinator.handle(still(2000, 1500));
        assert_eq!(h.coordinator.state(), CaptureState::ReviewingStill);
        assert_eq!(h.camera.lock().unwrap().stops, 1);

        h.coordinator.handle(user(UserAction::Approve));
        h.coordinator.handle(user(UserAction::Approve));

        assert!(h.coordinator.is_finished());
        let outcomes = h.outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            CaptureOutcome::Accepted(image) => assert_eq!(image.long_edge(), 2000),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_rejected_still_alerts_then_resumes_on_acknowledgment() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        h.coordinator.handle(user(UserAction::Capture));
        // 1000px wide -> 300000 encoded bytes
        h.coordinator.handle(still(1000, 1200));
        h.coordinator.handle(user(UserAction::Approve));

        assert_eq!(h.coordinator.state(), CaptureState::ReviewingStill);
        assert!(h.coordinator.is_awaiting_acknowledgment());
        assert!(h.coordinator.still().is_none());
        assert_eq!(
            *h.presenter.alerts.lock().unwrap(),
            vec!["low quality photo\n please try again"]
        );

        // The dialog blocks other review actions.
        h.coordinator.handle(user(UserAction::Retake));
        assert!(h.coordinator.is_awaiting_acknowledgment());

        h.coordinator.handle(user(UserAction::AcknowledgeAlert));
        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
        assert_eq!(h.camera.lock().unwrap().starts, 2);

        h.coordinator.handle(faces(2));
        assert!(!h.coordinator.is_capture_enabled());
        assert!(h.outcomes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_retake_discards_still_and_resumes_streaming() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        h.coordinator.handle(user(UserAction::Capture));
        h.coordinator.handle(still(2000, 1500));

        h.coordinator.handle(user(UserAction::Retake));

        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
        assert!(h.coordinator.still().is_none());
        assert!(h.outcomes.lock().unwrap().is_empty());
        assert_eq!(h.camera.lock().unwrap().starts, 2);
    }

    #[test]
    fn test_second_capture_while_in_flight_is_rejected() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        h.coordinator.handle(user(UserAction::Capture));
        h.coordinator.handle(user(UserAction::Capture));

        assert_eq!(h.coordinator.state(), CaptureState::Capturing);
        assert_eq!(h.camera.lock().unwrap().stills_requested, 1);
    }

    #[test]
    fn test_ambiguous_faces_block_capture() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        h.coordinator.handle(faces(3));
        h.coordinator.handle(user(UserAction::Capture));

        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
        assert_eq!(
            h.presenter.messages.lock().unwrap().last().unwrap(),
            "We need only one face"
        );
    }

    #[test]
    fn test_detection_failure_closes_gate_and_flow_continues() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        h.coordinator.handle(FlowEvent::Detection(DetectionResult::Failed(
            DetectionError::primitive("vision error".into()),
        )));

        assert!(!h.coordinator.is_capture_enabled());
        assert_eq!(h.coordinator.state(), CaptureState::Previewing);

        h.coordinator.handle(faces(1));
        assert!(h.coordinator.is_capture_enabled());
    }

    #[test]
    fn test_failed_still_returns_to_preview() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        h.coordinator.handle(user(UserAction::Capture));

        h.coordinator.handle(FlowEvent::StillCaptured(Err(CameraError::Capture(
            "sensor busy".into(),
        ))));

        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
        assert_eq!(
            h.presenter.messages.lock().unwrap().last().unwrap(),
            "Failed to capture photo"
        );
    }

    #[test]
    fn test_unexpected_still_is_discarded() {
        let mut h = started();
        h.coordinator.handle(still(2000, 1500));
        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
        assert!(h.coordinator.still().is_none());
    }

    #[test]
    fn test_still_is_mirrored_for_review() {
        let mut h = started();
        h.coordinator.handle(faces(1));
        h.coordinator.handle(user(UserAction::Capture));
        let mut pixels = RgbImage::new(2, 1);
        pixels.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        h.coordinator
            .handle(FlowEvent::StillCaptured(Ok(CapturedImage::new(pixels))));

        let reviewed = h.coordinator.still().unwrap();
        assert_eq!(reviewed.pixels().get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_denied_permission_fails_without_opening_camera() {
        let mut h = harness(AuthorizationStatus::Denied);
        h.coordinator.start();

        assert!(h.coordinator.is_finished());
        assert!(!h.camera.lock().unwrap().configured);
        let outcomes = h.outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0],
            CaptureOutcome::Failed(CaptureError::PermissionDenied)
        ));
    }

    #[test]
    fn test_restricted_permission_fails() {
        let mut h = harness(AuthorizationStatus::Restricted);
        h.coordinator.start();
        assert!(h.coordinator.is_finished());
        assert!(!h.outcomes.lock().unwrap()[0].is_accepted());
    }

    #[test]
    fn test_undetermined_permission_waits_for_reply() {
        let mut h = harness(AuthorizationStatus::NotDetermined);
        h.coordinator.start();

        assert_eq!(h.coordinator.state(), CaptureState::Idle);
        assert!(h.camera.lock().unwrap().access_reply.is_some());

        h.coordinator.handle(FlowEvent::AccessResolved(true));
        assert_eq!(h.coordinator.state(), CaptureState::Previewing);
    }

    #[test]
    fn test_access_reply_is_posted_to_ui_context() {
        let (camera, log) = ManualCamera::new(AuthorizationStatus::NotDetermined);
        let presenter = Arc::new(RecordingPresenter::default());
        let (tx, _outcomes) = crossbeam_channel::unbounded::<CaptureOutcome>();
        let deps = CaptureDependencies {
            camera: Box::new(camera),
            face_detector: Arc::new(ScriptedFaceDetector::from_counts(&[0])),
            presenter,
            delegate: Box::new(tx),
        };
        let (ui, rx) = ui_context();
        let mut coordinator = CaptureCoordinator::new(deps, CaptureConfig::default(), ui);
        coordinator.start();

        let reply = log.lock().unwrap().access_reply.take().unwrap();
        reply(false);

        assert!(matches!(rx.try_recv().unwrap(), FlowEvent::AccessResolved(false)));
    }

    #[test]
    fn test_refused_access_fails() {
        let mut h = harness(AuthorizationStatus::NotDetermined);
        h.coordinator.start();
        h.coordinator.handle(FlowEvent::AccessResolved(false));

        assert!(h.coordinator.is_finished());
        assert!(matches!(
            h.outcomes.lock().unwrap()[0],
            CaptureOutcome::Failed(CaptureError::PermissionDenied)
        ));
    }

    #[test]
    fn test_missing_device_fails_as_unavailable() {
        let (mut camera, log) = ManualCamera::new(AuthorizationStatus::Authorized);
        camera.device_available = false;
        let mut h = harness_with(camera, log);
        h.coordinator.start();

        assert!(h.coordinator.is_finished());
        assert!(matches!(
            h.outcomes.lock().unwrap()[0],
            CaptureOutcome::Failed(CaptureError::DeviceUnavailable(CameraError::NoDevice))
        ));
    }

    #[test]
    fn test_dismiss_stops_camera_and_reports_cancelled() {
        let mut h = started();
        h.coordinator.handle(user(UserAction::Dismiss));

        assert!(h.coordinator.is_finished());
        assert_eq!(h.camera.lock().unwrap().stops, 1);
        assert!(matches!(
            h.outcomes.lock().unwrap()[0],
            CaptureOutcome::Failed(CaptureError::Cancelled)
        ));
    }

    #[test]
    fn test_events_after_finish_are_ignored() {
        let mut h = started();
        h.coordinator.handle(user(UserAction::Dismiss));
        h.coordinator.handle(faces(1));
        h.coordinator.handle(user(UserAction::Dismiss));

        assert_eq!(h.outcomes.lock().unwrap().len(), 1);
        assert!(h.presenter.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_extra_listeners_receive_detections_after_gate() {
        struct Counter(AtomicUsize);
        impl DetectionListener for Counter {
            fn on_face_count(&self, _count: usize) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn on_detection_failed(&self, _error: &DetectionError) {}
        }

        let mut h = started();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let id = h.coordinator.register_listener(&counter);
        h.coordinator.handle(faces(1));
        h.coordinator.unregister_listener(id);
        h.coordinator.handle(faces(1));

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_on_host_channel_finishes_cancelled_when_senders_drop() {
        let mut h = started();
        let (ui, rx) = ui_context();
        ui.post(faces(1));
        drop(ui);

        let state = h.coordinator.run(rx);

        assert_eq!(state, CaptureState::Finished);
        assert!(matches!(
            h.outcomes.lock().unwrap()[0],
            CaptureOutcome::Failed(CaptureError::Cancelled)
        ));
    }
}
