use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of media a permission request or device query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

/// Physical placement of a camera on the host device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevicePosition {
    Front,
    Back,
    Unspecified,
}

/// Orientation applied to the output connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Pixel format requested from the frame-output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 32-bit interleaved BGRA, 4 bytes per pixel.
    Bgra32,
    /// Bi-planar 4:2:0 YCbCr, 12 bits per pixel.
    Nv12,
}

impl PixelFormat {
    /// Buffer size in bytes for a frame of the given dimensions.
    pub fn frame_len(&self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            Self::Bgra32 => pixels * 4,
            Self::Nv12 => pixels * 3 / 2,
        }
    }
}

/// Why the platform preempted the capture pipeline.
///
/// Only `AudioDeviceInUseByAnotherClient` qualifies an interruption for
/// automatic recovery; the other reasons resolve themselves when the
/// platform hands the device back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionReason {
    VideoDeviceNotAvailableInBackground,
    AudioDeviceInUseByAnotherClient,
    VideoDeviceInUseByAnotherClient,
    VideoDeviceNotAvailableWithMultipleForegroundApps,
}

/// A single captured frame.
///
/// The pixel buffer is shared, not copied; observers that need the frame
/// beyond the callback keep the `Arc` alive.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Monotonic frame counter since the pipeline started running.
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// Presentation time relative to pipeline start.
    pub timestamp: Duration,
    pub data: Arc<[u8]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_len_per_format() {
        assert_eq!(PixelFormat::Bgra32.frame_len(64, 48), 64 * 48 * 4);
        assert_eq!(PixelFormat::Nv12.frame_len(64, 48), 64 * 48 * 3 / 2);
    }
}
