use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Sender, TrySendError};

use crate::detection::domain::detection_result::{DetectionError, DetectionResult};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;

/// Receives each completed detection on the worker that produced it.
///
/// Implementations must hop to their own execution context before touching
/// shared state.
pub type ResultSink = Arc<dyn Fn(usize, DetectionResult) + Send + Sync>;

/// Runs the wrapped detector on one frame, validating the buffer first.
pub fn detect_frame(detector: &dyn FaceDetector, frame: &Frame) -> DetectionResult {
    if !frame.is_well_formed() {
        return DetectionResult::Failed(DetectionError::InvalidFrame {
            index: frame.index(),
        });
    }
    detector
        .count_faces(frame)
        .map_err(DetectionError::primitive)
        .into()
}

/// Cloneable, non-blocking entry point into the detection workers.
#[derive(Clone)]
pub struct FrameSubmitter {
    frame_tx: Sender<Frame>,
}

impl FrameSubmitter {
    /// Schedules detection of one frame and returns immediately.
    pub fn submit(&self, frame: Frame) {
        enqueue(&self.frame_tx, frame);
    }
}

/// Hands a frame to the workers without waiting. A full queue drops the
/// incoming frame.
fn enqueue(frame_tx: &Sender<Frame>, frame: Frame) {
    match frame_tx.try_send(frame) {
        Ok(()) => {}
        Err(TrySendError::Full(frame)) => {
            log::debug!("Detection queue full; dropping frame {}", frame.index());
        }
        Err(TrySendError::Disconnected(_)) => {
            log::warn!("Detection workers are gone; dropping frame");
        }
    }
}

/// Detector adapter that moves per-frame detection off the frame-delivery
/// thread.
///
/// Layout: `camera → submit → [worker × N] → sink`
///
/// Submission never blocks. Frames wait in a queue of `queue_capacity`
/// slots; when the detector falls behind the frame rate, frames arriving at
/// a full queue are dropped so readiness keeps tracking the live scene.
/// With more than one worker, detections of consecutive frames overlap and
/// may complete out of order; stale in-flight detections are never
/// cancelled.
pub struct ThreadedFrameDetector {
    frame_tx: Option<Sender<Frame>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadedFrameDetector {
    pub fn spawn(
        detector: Arc<dyn FaceDetector>,
        worker_count: usize,
        queue_capacity: usize,
        sink: ResultSink,
    ) -> Self {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(queue_capacity.max(1));
        let workers = (0..worker_count.max(1))
            .map(|id| {
                let frame_rx = frame_rx.clone();
                let detector = detector.clone();
                let sink = sink.clone();
                std::thread::Builder::new()
                    .name(format!("face-detect-{id}"))
                    .spawn(move || {
                        for frame in frame_rx {
                            let index = frame.index();
                            let started = Instant::now();
                            let result = detect_frame(&*detector, &frame);
                            drop(frame);
                            log::debug!(
                                "Frame {index} detected in {:.1}ms: {result:?}",
                                started.elapsed().as_secs_f64() * 1000.0
                            );
                            sink(index, result);
                        }
                    })
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::error!("Failed to spawn detection worker: {e}");
                    None
                }
            })
            .collect();

        Self {
            frame_tx: Some(frame_tx),
            workers,
        }
    }

    /// Schedules detection of one frame and returns immediately.
    pub fn submit(&self, frame: Frame) {
        if let Some(frame_tx) = &self.frame_tx {
            enqueue(frame_tx, frame);
        }
    }

    /// Handle for the frame-delivery thread. Workers keep running until
    /// this adapter and every submitter have been dropped.
    pub fn submitter(&self) -> FrameSubmitter {
        let (closed_tx, _) = crossbeam_channel::bounded(0);
        FrameSubmitter {
            frame_tx: self.frame_tx.clone().unwrap_or(closed_tx),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting frames, lets queued frames drain, and joins the
    /// workers. Blocks while any submitter is still alive.
    pub fn shutdown(mut self) {
        self.frame_tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Detection worker panicked");
            }
        }
    }
}

impl Drop for ThreadedFrameDetector {
    fn drop(&mut self) {
        // Workers exit on their own once the channel disconnects.
        self.frame_tx.take();
    }
}
