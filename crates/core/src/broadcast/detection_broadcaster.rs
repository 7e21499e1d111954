use std::sync::{Arc, Weak};

use crate::broadcast::detection_listener::DetectionListener;
use crate::detection::domain::detection_result::DetectionResult;

/// Identity of one registration.
///
/// Issued from a per-broadcaster counter and never reused, so an id kept
/// after its listener is gone can only ever match that listener's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    listener: Weak<dyn DetectionListener>,
}

/// Fans detection results out to every registered listener.
///
/// Holds non-owning references only: dropping a listener is enough to stop
/// its notifications, and unregistering a listener that is already gone is
/// a no-op. Owned by the capture coordinator and only touched from the
/// UI-affine context, so registration and publishing never interleave.
#[derive(Default)]
pub struct DetectionBroadcaster {
    registrations: Vec<Registration>,
    next_id: u64,
}

impl DetectionBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Registering a live listener again returns its
    /// existing id and does not duplicate notifications.
    pub fn register<L: DetectionListener + 'static>(&mut self, listener: &Arc<L>) -> ListenerId {
        let weak: Weak<L> = Arc::downgrade(listener);
        let listener: Weak<dyn DetectionListener> = weak;
        if let Some(existing) = self
            .registrations
            .iter()
            .find(|r| r.listener.strong_count() > 0 && Weak::ptr_eq(&r.listener, &listener))
        {
            return existing.id;
        }
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration { id, listener });
        id
    }

    /// Removes a listener by id. Returns whether an entry was removed.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    /// Number of registered listeners that are still alive.
    pub fn listener_count(&self) -> usize {
        self.registrations
            .iter()
            .filter(|r| r.listener.strong_count() > 0)
            .count()
    }

    /// Delivers one result to every live listener in registration order.
    /// Entries whose listener has been dropped are pruned first.
    pub fn publish(&mut self, result: &DetectionResult) {
        self.registrations.retain(|r| r.listener.strong_count() > 0);
        for registration in &self.registrations {
            let Some(listener) = registration.listener.upgrade() else {
                continue;
            };
            match result {
                DetectionResult::FaceCount(n) => listener.on_face_count(*n),
                DetectionResult::Failed(e) => listener.on_detection_failed(e),
            }
        }
    }
}
