//! In-process event bus and application-state switch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use video_capture_core::{
    AppStateProvider, CaptureEvent, EventHandler, EventKind, EventSource, Subscription,
};

type HandlerMap = HashMap<EventKind, Vec<(u64, EventHandler)>>;

/// Publishes capture-layer and application-lifecycle events to explicit
/// subscribers. Handles returned from `subscribe` unregister on drop.
pub struct EventBus {
    handlers: Arc<Mutex<HandlerMap>>,
    next_token: AtomicU64,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_token: AtomicU64::new(1),
        })
    }

    /// Deliver an event to every subscriber of its kind, on the calling
    /// thread.
    pub fn publish(&self, event: &CaptureEvent) {
        // Snapshot outside the lock: handlers may subscribe or
        // unsubscribe while running.
        let snapshot: Vec<EventHandler> = self
            .handlers
            .lock()
            .get(&event.kind())
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in snapshot {
            handler(event);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.lock().get(&kind).map_or(0, Vec::len)
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, kind: EventKind, handler: EventHandler) -> Subscription {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .entry(kind)
            .or_default()
            .push((token, handler));

        let handlers = Arc::clone(&self.handlers);
        Subscription::new(move || {
            if let Some(list) = handlers.lock().get_mut(&kind) {
                list.retain(|(t, _)| *t != token);
            }
        })
    }
}

/// Switchable foreground/background flag standing in for the host
/// application's lifecycle state.
pub struct ForegroundState {
    foreground: AtomicBool,
}

impl ForegroundState {
    /// Starts in the foreground.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            foreground: AtomicBool::new(true),
        })
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }
}

impl AppStateProvider for ForegroundState {
    fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }
}
