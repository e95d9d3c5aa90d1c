//! Scripted permission provider.
//!
//! Answers capture permission requests either immediately with a fixed
//! decision or later, when the harness calls [`ScriptedPermissions::respond`].
//! Real platforms answer on an arbitrary thread at an arbitrary time; the
//! deferred mode reproduces that window.

use parking_lot::Mutex;

use video_capture_core::{MediaKind, PermissionCallback, PermissionProvider};

use std::sync::Arc;

enum Mode {
    Immediate(bool),
    Deferred(Vec<PermissionCallback>),
}

pub struct ScriptedPermissions {
    mode: Mutex<Mode>,
}

impl ScriptedPermissions {
    /// Grants every request inline, on the caller's thread.
    pub fn granting() -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(Mode::Immediate(true)),
        })
    }

    /// Denies every request inline.
    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(Mode::Immediate(false)),
        })
    }

    /// Holds requests until `respond` is called.
    pub fn deferred() -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(Mode::Deferred(Vec::new())),
        })
    }

    /// Resolve every pending deferred request with the given decision.
    pub fn respond(&self, granted: bool) {
        let pending = {
            let mut mode = self.mode.lock();
            match &mut *mode {
                Mode::Deferred(pending) => std::mem::take(pending),
                Mode::Immediate(_) => Vec::new(),
            }
        };
        // Callbacks run outside the lock; they may re-enter the provider.
        for completion in pending {
            completion(granted);
        }
    }

    /// Number of requests waiting for a deferred response.
    pub fn pending_requests(&self) -> usize {
        match &*self.mode.lock() {
            Mode::Deferred(pending) => pending.len(),
            Mode::Immediate(_) => 0,
        }
    }
}

impl PermissionProvider for ScriptedPermissions {
    fn request_access(&self, kind: MediaKind, completion: PermissionCallback) {
        log::debug!("permission requested for {:?}", kind);
        let decision = {
            let mut mode = self.mode.lock();
            match &mut *mode {
                Mode::Immediate(granted) => Some(*granted),
                Mode::Deferred(pending) => {
                    pending.push(completion);
                    return;
                }
            }
        };
        if let Some(granted) = decision {
            completion(granted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn immediate_modes_answer_inline() {
        let granted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&granted);
        ScriptedPermissions::granting().request_access(
            MediaKind::Video,
            Box::new(move |ok| {
                counter.store(usize::from(ok), Ordering::SeqCst);
            }),
        );
        assert_eq!(granted.load(Ordering::SeqCst), 1);

        let counter = Arc::clone(&granted);
        ScriptedPermissions::denying().request_access(
            MediaKind::Video,
            Box::new(move |ok| {
                counter.store(usize::from(ok), Ordering::SeqCst);
            }),
        );
        assert_eq!(granted.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deferred_mode_waits_for_response() {
        let provider = ScriptedPermissions::deferred();
        let answered = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&answered);
        provider.request_access(
            MediaKind::Video,
            Box::new(move |ok| {
                counter.fetch_add(1 + usize::from(ok), Ordering::SeqCst);
            }),
        );
        assert_eq!(provider.pending_requests(), 1);
        assert_eq!(answered.load(Ordering::SeqCst), 0);

        provider.respond(true);
        assert_eq!(provider.pending_requests(), 0);
        assert_eq!(answered.load(Ordering::SeqCst), 2);
    }
}
