use std::fmt;
use std::sync::Arc;

use crate::models::video_models::InterruptionReason;

/// Out-of-band notification from the platform capture layer or the
/// application lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The pipeline reported an unrecoverable internal error.
    RuntimeError { description: String },
    /// The pipeline was preempted, e.g. another process claimed
    /// exclusive device access.
    Interrupted { reason: InterruptionReason },
    /// The platform signaled the preemption is over.
    InterruptionEnded,
    /// The application returned to the foreground.
    DidBecomeActive,
}

impl CaptureEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RuntimeError { .. } => EventKind::RuntimeError,
            Self::Interrupted { .. } => EventKind::Interrupted,
            Self::InterruptionEnded => EventKind::InterruptionEnded,
            Self::DidBecomeActive => EventKind::DidBecomeActive,
        }
    }
}

/// Name of a subscribable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RuntimeError,
    Interrupted,
    InterruptionEnded,
    DidBecomeActive,
}

impl EventKind {
    /// The four events the lifecycle manager registers for at
    /// configuration time.
    pub const ALL: [EventKind; 4] = [
        EventKind::RuntimeError,
        EventKind::Interrupted,
        EventKind::InterruptionEnded,
        EventKind::DidBecomeActive,
    ];
}

/// Handler invoked for every published event of a subscribed kind, on
/// the publisher's thread.
pub type EventHandler = Arc<dyn Fn(&CaptureEvent) + Send + Sync + 'static>;

/// Event delivery seam.
///
/// Registration is explicit and returns a handle; there is no ambient
/// global dispatch. The manager subscribes at configuration time and
/// releases every handle at teardown.
pub trait EventSource: Send + Sync {
    fn subscribe(&self, kind: EventKind, handler: EventHandler) -> Subscription;
}

/// Subscription handle. Dropping it unsubscribes deterministically.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Query for the host application's foreground/background state, used by
/// the recovery guards.
pub trait AppStateProvider: Send + Sync {
    fn is_foreground(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn subscription_releases_on_drop() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let subscription = Subscription::new(move || flag.store(true, Ordering::SeqCst));

        assert!(!released.load(Ordering::SeqCst));
        drop(subscription);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn event_kind_round_trip() {
        let event = CaptureEvent::Interrupted {
            reason: InterruptionReason::AudioDeviceInUseByAnotherClient,
        };
        assert_eq!(event.kind(), EventKind::Interrupted);
        assert_eq!(CaptureEvent::DidBecomeActive.kind(), EventKind::DidBecomeActive);
        assert_eq!(EventKind::ALL.len(), 4);
    }
}
