//! Synthetic capture devices and a fixed-inventory provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use video_capture_core::{
    CaptureError, DeviceConfigHandle, DevicePosition, DeviceProvider, VideoDevice,
};

/// An in-memory video device with an exclusive configuration lock and
/// injectable lock failure.
pub struct LoopbackDevice {
    id: String,
    name: String,
    position: DevicePosition,
    locked: AtomicBool,
    fail_lock: AtomicBool,
    frame_bounds: Mutex<Option<(u32, u32)>>,
}

impl LoopbackDevice {
    pub fn new(id: &str, position: DevicePosition) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_owned(),
            name: format!("Loopback Camera ({})", id),
            position,
            locked: AtomicBool::new(false),
            fail_lock: AtomicBool::new(false),
            frame_bounds: Mutex::new(None),
        })
    }

    /// Make every subsequent `lock_for_configuration` fail, simulating a
    /// device claimed by another client.
    pub fn inject_lock_failure(&self, fail: bool) {
        self.fail_lock.store(fail, Ordering::SeqCst);
    }

    /// Frame-duration bounds last applied under the configuration lock.
    pub fn frame_duration_bounds(&self) -> Option<(u32, u32)> {
        *self.frame_bounds.lock()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

impl VideoDevice for LoopbackDevice {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn position(&self) -> DevicePosition {
        self.position
    }

    fn lock_for_configuration(
        &self,
    ) -> Result<Box<dyn DeviceConfigHandle + '_>, CaptureError> {
        if self.fail_lock.load(Ordering::SeqCst) {
            return Err(CaptureError::ConfigurationFailed(format!(
                "device {} is busy",
                self.id
            )));
        }
        if self.locked.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::ConfigurationFailed(format!(
                "device {} is already locked",
                self.id
            )));
        }
        Ok(Box::new(DeviceLock { device: self }))
    }
}

/// Holds the exclusive lock; dropping it unlocks the device.
struct DeviceLock<'a> {
    device: &'a LoopbackDevice,
}

impl DeviceConfigHandle for DeviceLock<'_> {
    fn set_frame_duration_bounds(
        &mut self,
        min_fps: u32,
        max_fps: u32,
    ) -> Result<(), CaptureError> {
        if min_fps == 0 || max_fps < min_fps {
            return Err(CaptureError::ConfigurationFailed(format!(
                "invalid frame-duration bounds {}..{}",
                min_fps, max_fps
            )));
        }
        *self.device.frame_bounds.lock() = Some((min_fps, max_fps));
        Ok(())
    }
}

impl Drop for DeviceLock<'_> {
    fn drop(&mut self) {
        self.device.locked.store(false, Ordering::SeqCst);
    }
}

/// Device provider over a fixed inventory.
pub struct StaticDeviceProvider {
    devices: Mutex<Vec<Arc<LoopbackDevice>>>,
}

impl StaticDeviceProvider {
    /// A provider with no devices at all.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(Vec::new()),
        })
    }

    pub fn with_devices(devices: Vec<Arc<LoopbackDevice>>) -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(devices),
        })
    }

    /// A provider holding a single front camera, the common case.
    pub fn single_front_camera() -> Arc<Self> {
        Self::with_devices(vec![LoopbackDevice::new("front-0", DevicePosition::Front)])
    }

    pub fn add_device(&self, device: Arc<LoopbackDevice>) {
        self.devices.lock().push(device);
    }
}

impl DeviceProvider for StaticDeviceProvider {
    fn video_device(&self, position: DevicePosition) -> Option<Arc<dyn VideoDevice>> {
        self.devices
            .lock()
            .iter()
            .find(|d| d.position == position)
            .map(|d| Arc::clone(d) as Arc<dyn VideoDevice>)
    }

    fn default_video_device(&self) -> Option<Arc<dyn VideoDevice>> {
        self.devices
            .lock()
            .first()
            .map(|d| Arc::clone(d) as Arc<dyn VideoDevice>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_is_exclusive_and_released_on_drop() {
        let device = LoopbackDevice::new("cam", DevicePosition::Front);

        let lock = device.lock_for_configuration().unwrap();
        assert!(device.is_locked());
        assert!(device.lock_for_configuration().is_err());

        drop(lock);
        assert!(!device.is_locked());
        assert!(device.lock_for_configuration().is_ok());
    }

    #[test]
    fn lock_released_even_after_failed_mutation() {
        let device = LoopbackDevice::new("cam", DevicePosition::Front);

        let mut lock = device.lock_for_configuration().unwrap();
        assert!(lock.set_frame_duration_bounds(0, 0).is_err());
        drop(lock);

        assert!(!device.is_locked());
        assert_eq!(device.frame_duration_bounds(), None);
    }

    #[test]
    fn bounds_stored_under_lock() {
        let device = LoopbackDevice::new("cam", DevicePosition::Front);

        let mut lock = device.lock_for_configuration().unwrap();
        lock.set_frame_duration_bounds(30, 30).unwrap();
        drop(lock);

        assert_eq!(device.frame_duration_bounds(), Some((30, 30)));
    }

    #[test]
    fn injected_failure_blocks_lock() {
        let device = LoopbackDevice::new("cam", DevicePosition::Back);
        device.inject_lock_failure(true);
        assert!(device.lock_for_configuration().is_err());

        device.inject_lock_failure(false);
        assert!(device.lock_for_configuration().is_ok());
    }

    #[test]
    fn provider_prefers_position_then_default() {
        let front = LoopbackDevice::new("front", DevicePosition::Front);
        let back = LoopbackDevice::new("back", DevicePosition::Back);
        let provider = StaticDeviceProvider::with_devices(vec![back, front]);

        let found = provider.video_device(DevicePosition::Front).unwrap();
        assert_eq!(found.id(), "front");

        let fallback = provider.default_video_device().unwrap();
        assert_eq!(fallback.id(), "back");

        assert!(StaticDeviceProvider::empty().default_video_device().is_none());
    }
}
