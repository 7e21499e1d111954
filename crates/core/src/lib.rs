//! Face-gated photo capture.
//!
//! Turns a live camera feed into a "ready / not ready" signal (exactly one
//! face in view), gates the shutter on it, and checks the resulting still
//! against minimum quality thresholds before handing it to the caller.

pub mod shared {
    pub mod captured_image;
    pub mod config;
    pub mod constants;
    pub mod frame;
}

pub mod detection {
    pub mod domain {
        pub mod detection_result;
        pub mod face_detector;
        pub mod readiness_state;
    }
    pub mod infrastructure {
        pub mod scripted_face_detector;
        pub mod threaded_frame_detector;
    }
}

pub mod broadcast {
    pub mod detection_broadcaster;
    pub mod detection_listener;
}

pub mod capture {
    pub mod domain {
        pub mod capture_gate;
        pub mod image_encoder;
        pub mod quality_validator;
        pub mod status_presenter;
    }
    pub mod infrastructure {
        pub mod jpeg_image_encoder;
    }
}

pub mod camera {
    pub mod domain {
        pub mod camera_session;
    }
    pub mod infrastructure {
        pub mod scripted_camera;
    }
}

pub mod flow {
    pub mod begin_verification;
    pub mod capture_coordinator;
    pub mod result_delegate;
    pub mod ui_context;
}
