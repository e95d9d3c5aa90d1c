//! # video-capture-core
//!
//! Platform-agnostic video capture core library.
//!
//! Owns the lifecycle of a hardware video-capture pipeline: permission
//! acquisition, device selection, pipeline configuration, start/stop/
//! suspend/resume, and automatic recovery from interruption or runtime
//! error, while delivering a continuous stream of captured frames to a
//! registered observer. Platform backends implement the collaborator
//! traits and plug into the generic `CaptureLifecycleManager`.
//!
//! ## Architecture
//!
//! ```text
//! video-capture-core (this crate)
//! ├── traits/       ← CapturePipeline, DeviceProvider, PermissionProvider,
//! │                   CaptureObserver, EventSource, AppStateProvider
//! ├── models/       ← CaptureError, CaptureState, CaptureConfig, VideoFrame, etc.
//! └── session/      ← CaptureLifecycleManager (generic orchestrator)
//! ```

pub mod models;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::CaptureConfig;
pub use models::error::CaptureError;
pub use models::state::CaptureState;
pub use models::video_models::{
    DevicePosition, InterruptionReason, MediaKind, PixelFormat, VideoFrame, VideoOrientation,
};
pub use session::lifecycle::CaptureLifecycleManager;
pub use traits::capture_observer::CaptureObserver;
pub use traits::capture_pipeline::{
    CapturePipeline, FrameCallback, InputBinding, OutputBinding, OutputSettings,
};
pub use traits::device_provider::{DeviceConfigHandle, DeviceProvider, VideoDevice};
pub use traits::event_source::{
    AppStateProvider, CaptureEvent, EventHandler, EventKind, EventSource, Subscription,
};
pub use traits::permission_provider::{PermissionCallback, PermissionProvider};
