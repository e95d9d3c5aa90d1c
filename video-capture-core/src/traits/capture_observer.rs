use crate::models::video_models::VideoFrame;

/// Consumer delegate for capture notifications.
///
/// The manager holds the observer weakly and checks it before every
/// invocation, so the consumer may drop it at any time. Both methods are
/// called from background threads, not the UI thread; implementations
/// marshal to a UI-safe context themselves.
pub trait CaptureObserver: Send + Sync {
    /// Called once per captured frame, synchronously on the pipeline's
    /// background thread.
    fn frame_captured(&self, frame: &VideoFrame);

    /// Called once when the permission request resolves.
    fn permission_changed(&self, granted: bool);
}
