use thiserror::Error;

/// Errors that can occur during capture lifecycle operations.
///
/// Returned synchronously from the lifecycle operations; asynchronous
/// paths (permission callback, interruption recovery) have no waiting
/// caller and log failures instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("not initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("no video capture device found")]
    NoDeviceFound,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("capturing not running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(CaptureError::PermissionDenied.to_string(), "permission denied");
        assert_eq!(
            CaptureError::ConfigurationFailed("sink rejected".into()).to_string(),
            "configuration failed: sink rejected"
        );
        assert_eq!(CaptureError::NotRunning.to_string(), "capturing not running");
    }
}
