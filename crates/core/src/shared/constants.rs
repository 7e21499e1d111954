/// Minimum long-edge resolution (pixels) an accepted still must reach.
pub const DEFAULT_MIN_RESOLUTION: u32 = 1800;

/// Minimum size in bytes of the still once encoded at maximum quality.
pub const DEFAULT_MIN_ENCODED_BYTES: usize = 500_000;

pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// How long each status message stays on screen.
pub const DEFAULT_STATUS_DURATION_MS: u64 = 1000;

pub const DEFAULT_DETECTION_WORKERS: usize = 2;

/// Frames allowed to wait for a free detection worker before new ones are
/// dropped.
pub const DEFAULT_DETECTION_QUEUE_CAPACITY: usize = 2;

pub const MSG_READY: &str = "Ready for capture";
pub const MSG_AMBIGUOUS: &str = "We need only one face";
pub const MSG_NO_FACE: &str = "no face found";
pub const MSG_DETECTION_FAILED: &str = "Failed to detect faces";
pub const MSG_CAPTURE_FAILED: &str = "Failed to capture photo";

pub const ALERT_TITLE: &str = "Error";
pub const ALERT_ACTION: &str = "OK";
pub const MSG_LOW_QUALITY: &str = "low quality photo\n please try again";

pub const CONFIG_DIR_NAME: &str = "FaceCapture";
pub const CONFIG_FILE_NAME: &str = "config.json";
