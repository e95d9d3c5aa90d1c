//! # video-capture-loopback
//!
//! Synthetic software backend for video-capture-kit.
//!
//! Provides:
//! - `LoopbackPipeline` — patterned-frame pipeline with interruption and
//!   binding-rejection injection
//! - `LoopbackDevice` / `StaticDeviceProvider` — in-memory devices with
//!   exclusive configuration locks
//! - `ScriptedPermissions` — immediate or deferred permission answers
//! - `EventBus` / `ForegroundState` — in-process event delivery and
//!   application state
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use video_capture_core::{CaptureConfig, CaptureLifecycleManager};
//! use video_capture_loopback::*;
//!
//! let pipeline = Arc::new(LoopbackPipeline::new(1280, 720));
//! let manager = CaptureLifecycleManager::new(
//!     pipeline,
//!     StaticDeviceProvider::single_front_camera(),
//!     ScriptedPermissions::granting(),
//!     ForegroundState::new(),
//!     EventBus::new(),
//!     CaptureConfig::default(),
//! )?;
//! ```

pub mod devices;
pub mod events;
pub mod permissions;
pub mod pipeline;

pub use devices::{LoopbackDevice, StaticDeviceProvider};
pub use events::{EventBus, ForegroundState};
pub use permissions::ScriptedPermissions;
pub use pipeline::LoopbackPipeline;
