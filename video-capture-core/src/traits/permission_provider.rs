use crate::models::video_models::MediaKind;

/// Completion handler for a permission request.
///
/// Invoked exactly once with the grant decision, at an unspecified
/// future time, on an unspecified thread.
pub type PermissionCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Interface for platform permission acquisition.
///
/// Backends wrap whatever consent machinery the host OS provides; the
/// lifecycle manager requests video access once at construction and
/// reacts to the asynchronous result.
pub trait PermissionProvider: Send + Sync {
    /// Request access to capture the given media kind.
    fn request_access(&self, kind: MediaKind, completion: PermissionCallback);
}
