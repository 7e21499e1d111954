use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::camera::domain::camera_session::{
    AccessReply, AuthorizationStatus, CameraError, CameraOutputs, CameraSession,
};
use crate::shared::captured_image::CapturedImage;
use crate::shared::frame::Frame;

const DEFAULT_FRAME_SIZE: (u32, u32) = (64, 48);
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Camera stand-in that streams blank frames and answers still requests
/// with a fixed image.
///
/// Frame indices keep increasing across stop/start so a scripted detector
/// sees one continuous timeline.
pub struct ScriptedCamera {
    authorization: AuthorizationStatus,
    grant_on_request: bool,
    device_available: bool,
    frame_size: (u32, u32),
    frame_interval: Duration,
    still: Option<CapturedImage>,
    outputs: Option<CameraOutputs>,
    running: Arc<AtomicBool>,
    next_index: Arc<AtomicUsize>,
    streamer: Option<JoinHandle<()>>,
}

impl ScriptedCamera {
    pub fn new(still: Option<CapturedImage>) -> Self {
        Self {
            authorization: AuthorizationStatus::Authorized,
            grant_on_request: true,
            device_available: true,
            frame_size: DEFAULT_FRAME_SIZE,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            still,
            outputs: None,
            running: Arc::new(AtomicBool::new(false)),
            next_index: Arc::new(AtomicUsize::new(0)),
            streamer: None,
        }
    }

    pub fn with_authorization(mut self, status: AuthorizationStatus) -> Self {
        self.authorization = status;
        self
    }

    /// Answer given when access is requested from `NotDetermined`.
    pub fn granting_access(mut self, grant: bool) -> Self {
        self.grant_on_request = grant;
        self
    }

    pub fn without_device(mut self) -> Self {
        self.device_available = false;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

impl CameraSession for ScriptedCamera {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.authorization
    }

    fn request_access(&mut self, reply: AccessReply) {
        let granted = self.grant_on_request;
        if granted {
            self.authorization = AuthorizationStatus::Authorized;
        } else {
            self.authorization = AuthorizationStatus::Denied;
        }
        std::thread::spawn(move || reply(granted));
    }

    fn configure(&mut self, outputs: CameraOutputs) -> Result<(), CameraError> {
        if !self.device_available {
            return Err(CameraError::NoDevice);
        }
        self.outputs = Some(outputs);
        Ok(())
    }

    fn start(&mut self) {
        let Some(outputs) = &self.outputs else {
            log::warn!("Camera started before configuration");
            return;
        };
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let frames = outputs.frames.clone();
        let running = self.running.clone();
        let next_index = self.next_index.clone();
        let (width, height) = self.frame_size;
        let interval = self.frame_interval;

        self.streamer = Some(std::thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                let index = next_index.fetch_add(1, Ordering::Relaxed);
                frames(Frame::blank(width, height, index));
                std::thread::sleep(interval);
            }
        }));
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.streamer.take() {
            if handle.join().is_err() {
                log::error!("Camera streaming thread panicked");
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn capture_still(&mut self) {
        let Some(outputs) = &self.outputs else {
            log::warn!("Still requested before configuration");
            return;
        };
        let stills = outputs.stills.clone();
        let result = self
            .still
            .clone()
            .ok_or_else(|| CameraError::Capture("no still available".into()));
        std::thread::spawn(move || stills(result));
    }
}

impl Drop for ScriptedCamera {
    fn drop(&mut self) {
        self.stop();
    }
}
