use std::thread::JoinHandle;

use crate::flow::capture_coordinator::{CaptureCoordinator, CaptureDependencies, CaptureState};
use crate::flow::ui_context::{ui_context, UiHandle, UserAction};
use crate::shared::config::CaptureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationStyle {
    /// Pushed onto the host's navigation stack.
    Push,
    /// Presented modally, full screen.
    #[default]
    Present,
}

/// The screen stack the capture flow is shown on.
pub trait PresentationHost {
    /// Shows the capture screen. User actions on that screen are reported
    /// through `ui`.
    fn show_capture_screen(&mut self, style: PresentationStyle, animated: bool, ui: UiHandle);
}

/// Handle to a running capture flow.
///
/// Dropping the handle before the flow finishes dismisses it.
pub struct CaptureFlow {
    ui: UiHandle,
    thread: Option<JoinHandle<CaptureState>>,
}

impl CaptureFlow {
    pub fn ui(&self) -> &UiHandle {
        &self.ui
    }

    pub fn send_action(&self, action: UserAction) -> bool {
        self.ui.send_action(action)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Blocks until the flow reaches its terminal state.
    pub fn wait(mut self) -> CaptureState {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(state)) => state,
            Some(Err(_)) => {
                log::error!("Capture flow thread panicked");
                CaptureState::Finished
            }
            None => CaptureState::Finished,
        }
    }
}

impl Drop for CaptureFlow {
    fn drop(&mut self) {
        if self.thread.is_some() && !self.is_finished() {
            self.ui.send_action(UserAction::Dismiss);
        }
    }
}

/// Starts a capture flow on its own UI-affine thread and shows it on `host`.
///
/// The outcome is delivered to `deps.delegate` exactly once.
pub fn begin_verification(
    host: &mut dyn PresentationHost,
    deps: CaptureDependencies,
    config: CaptureConfig,
    style: PresentationStyle,
    animated: bool,
) -> std::io::Result<CaptureFlow> {
    let (ui, events) = ui_context();
    let flow_ui = ui.clone();

    let thread = std::thread::Builder::new()
        .name("capture-ui".into())
        .spawn(move || {
            let mut coordinator = CaptureCoordinator::new(deps, config, flow_ui);
            coordinator.start();
            if coordinator.is_finished() {
                return coordinator.state();
            }
            coordinator.run(events)
        })?;

    host.show_capture_screen(style, animated, ui.clone());

    Ok(CaptureFlow {
        ui,
        thread: Some(thread),
    })
}
