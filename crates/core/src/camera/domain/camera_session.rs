use std::sync::Arc;

use thiserror::Error;

use crate::shared::captured_image::CapturedImage;
use crate::shared::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    NotDetermined,
    Denied,
    Restricted,
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no matching capture device")]
    NoDevice,
    #[error("failed to configure capture session: {0}")]
    Configuration(String),
    #[error("still capture failed: {0}")]
    Capture(String),
    #[error("failed to decode still: {0}")]
    Decode(#[from] image::ImageError),
}

/// Push callback for live video samples. Called on the camera's own thread.
pub type FrameSink = Arc<dyn Fn(Frame) + Send + Sync>;

/// Callback for the result of a still request. Called on an
/// implementation-defined thread.
pub type StillSink = Arc<dyn Fn(Result<CapturedImage, CameraError>) + Send + Sync>;

/// One-shot reply to an access prompt. May be called from any thread.
pub type AccessReply = Box<dyn FnOnce(bool) + Send>;

pub struct CameraOutputs {
    pub frames: FrameSink,
    pub stills: StillSink,
}

/// Device camera with a live feed and a still-photo output.
///
/// Owned exclusively by the capture coordinator, which is the only caller
/// of `start`/`stop`.
pub trait CameraSession: Send {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompts the user for camera access.
    fn request_access(&mut self, reply: AccessReply);

    /// Attaches the input device and both outputs.
    fn configure(&mut self, outputs: CameraOutputs) -> Result<(), CameraError>;

    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Requests one still photo, delivered through the configured still sink.
    fn capture_still(&mut self);
}
