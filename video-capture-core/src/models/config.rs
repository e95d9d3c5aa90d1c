use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::video_models::{DevicePosition, PixelFormat, VideoOrientation};

/// Configuration for a capture lifecycle manager.
///
/// The frame rate is fixed (min = max): the pipeline is non-adaptive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Fixed capture frame rate in frames per second (default: 30).
    pub frame_rate: u32,

    /// Pixel format requested from the output sink (default: BGRA32).
    pub pixel_format: PixelFormat,

    /// Preferred camera position; falls back to the default device when
    /// no camera matches (default: front).
    pub preferred_position: DevicePosition,

    /// Initial output orientation (default: portrait).
    pub orientation: VideoOrientation,

    /// Mirror the output connection, the usual treatment for a
    /// front-camera preview (default: true).
    pub mirror_output: bool,

    /// Drop frames the sink cannot deliver in time instead of queueing
    /// them: freshness over completeness (default: true).
    pub discard_late_frames: bool,

    /// Cooldown between a qualifying interruption and the recovery
    /// attempt (default: 1.5 s).
    pub recovery_delay: Duration,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate == 0 {
            return Err("frame rate must be positive".into());
        }
        if self.frame_rate > 240 {
            return Err(format!("unsupported frame rate: {}", self.frame_rate));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            pixel_format: PixelFormat::Bgra32,
            preferred_position: DevicePosition::Front,
            orientation: VideoOrientation::Portrait,
            mirror_output: true,
            discard_late_frames: true,
            recovery_delay: Duration::from_millis(1500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.recovery_delay, Duration::from_millis(1500));
    }

    #[test]
    fn rejects_zero_frame_rate() {
        let config = CaptureConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_absurd_frame_rate() {
        let config = CaptureConfig {
            frame_rate: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
