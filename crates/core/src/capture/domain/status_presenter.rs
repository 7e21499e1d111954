use std::time::Duration;

/// Host-side surface for user-facing status.
pub trait StatusPresenter: Send + Sync {
    /// Shows a transient, auto-dismissing message. Fire-and-forget.
    fn present(&self, message: &str, duration: Duration);

    /// Shows a blocking dialog. The host reports the user's acknowledgment
    /// back to the flow as a separate action.
    fn present_alert(&self, title: &str, message: &str, action_title: &str);
}
