use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::video_models::DevicePosition;

/// A hardware video capture device.
///
/// Mutating device settings requires an exclusive configuration lock,
/// modeled as a scoped handle: the device is locked while the handle
/// lives and unconditionally unlocked when it drops, even on failure
/// paths.
pub trait VideoDevice: Send + Sync {
    /// Stable identifier for the device.
    fn id(&self) -> String;

    /// Human-readable device name.
    fn name(&self) -> String;

    fn position(&self) -> DevicePosition;

    /// Acquire the exclusive configuration lock.
    ///
    /// Fails with `ConfigurationFailed` when the device is busy or the
    /// platform refuses the lock.
    fn lock_for_configuration(&self)
        -> Result<Box<dyn DeviceConfigHandle + '_>, CaptureError>;
}

/// Scoped device-configuration handle. Dropping it releases the lock.
pub trait DeviceConfigHandle {
    /// Fix the frame-duration bounds. Passing the same rate for min and
    /// max pins the device to a fixed, non-adaptive frame rate.
    fn set_frame_duration_bounds(
        &mut self,
        min_fps: u32,
        max_fps: u32,
    ) -> Result<(), CaptureError>;
}

/// Interface for enumerating video capture hardware.
pub trait DeviceProvider: Send + Sync {
    /// The device matching the given position preference, if any.
    fn video_device(&self, position: DevicePosition) -> Option<Arc<dyn VideoDevice>>;

    /// The platform default video device, used as a fallback when no
    /// device matches the preferred position.
    fn default_video_device(&self) -> Option<Arc<dyn VideoDevice>>;
}
