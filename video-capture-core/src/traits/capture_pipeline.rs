use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::video_models::{PixelFormat, VideoFrame, VideoOrientation};
use crate::traits::device_provider::VideoDevice;

/// Callback invoked once per captured frame.
///
/// Fires on the pipeline's dedicated background thread, never the UI
/// thread — keep processing minimal and marshal elsewhere if needed.
/// Delivery is synchronous with no buffering: a slow callback stalls the
/// pipeline (late frames are discarded before they reach the callback
/// when `discard_late_frames` is set).
pub type FrameCallback = Arc<dyn Fn(&VideoFrame) + Send + Sync + 'static>;

/// Opaque token for an input binding, issued by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputBinding(pub u64);

/// Opaque token for an output binding, issued by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputBinding(pub u64);

/// Settings for a frame-output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSettings {
    pub pixel_format: PixelFormat,
    /// Discard frames the sink cannot deliver in time instead of
    /// queueing them (bounded-latency policy).
    pub discard_late_frames: bool,
}

/// Hardware capture pipeline abstraction.
///
/// Configuration mutations between `begin_configuration` and
/// `commit_configuration` apply atomically: intermediate states are not
/// observable by the hardware layer. Brackets may nest.
pub trait CapturePipeline: Send + Sync {
    fn begin_configuration(&self);
    fn commit_configuration(&self);

    /// Bind a device as pipeline input.
    ///
    /// Fails with `ConfigurationFailed` when the pipeline rejects the
    /// binding.
    fn add_input(&self, device: Arc<dyn VideoDevice>) -> Result<InputBinding, CaptureError>;

    /// Remove an input binding. Unknown bindings are ignored.
    fn remove_input(&self, binding: &InputBinding);

    /// Attach a frame-output sink, delivering frames via `callback`.
    ///
    /// Fails with `ConfigurationFailed` when the sink cannot be
    /// attached.
    fn add_output(
        &self,
        settings: OutputSettings,
        callback: FrameCallback,
    ) -> Result<OutputBinding, CaptureError>;

    /// Remove an output binding. Unknown bindings are ignored.
    fn remove_output(&self, binding: &OutputBinding);

    /// Apply orientation and mirroring to the output connection.
    /// Best-effort: backends ignore settings they cannot honor.
    fn configure_connection(
        &self,
        binding: &OutputBinding,
        orientation: VideoOrientation,
        mirrored: bool,
    );

    /// Begin pipeline execution. Idempotent while already running.
    fn start_running(&self);

    /// Halt pipeline execution. Idempotent while already stopped.
    fn stop_running(&self);

    /// Whether the platform currently reports the pipeline preempted.
    fn is_interrupted(&self) -> bool;
}
